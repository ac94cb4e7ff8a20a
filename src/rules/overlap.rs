use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave::LeaveTimeSegment;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeRange {
    #[schema(example = "2026-03-02T09:00:00Z")]
    pub start: DateTime<Utc>,
    #[schema(example = "2026-03-03T18:00:00Z")]
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::Validation(
                "end time must be later than start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }

    pub fn overlap_seconds(&self, other: &TimeRange) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end <= start {
            return 0;
        }
        (end - start).num_seconds()
    }

    /// Calendar-time length in days, rounded to hundredths.
    pub fn days(&self) -> f64 {
        super::round_to(self.duration_seconds() as f64 / SECONDS_PER_DAY, 2)
    }
}

/// First active segment that intersects `candidate`, if any.
pub fn find_conflict<'a, I>(candidate: &TimeRange, existing: I) -> Option<&'a LeaveTimeSegment>
where
    I: IntoIterator<Item = &'a LeaveTimeSegment>,
{
    existing
        .into_iter()
        .find(|seg| seg.is_active && seg.range().overlaps(candidate))
}

/// Segments of a single application must not overlap each other.
pub fn ensure_disjoint(ranges: &[TimeRange]) -> Result<(), AppError> {
    for (i, a) in ranges.iter().enumerate() {
        if ranges[i + 1..].iter().any(|b| a.overlaps(b)) {
            return Err(AppError::Validation(
                "leave segments of one application overlap each other".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn range(d1: u32, h1: u32, d2: u32, h2: u32) -> TimeRange {
        TimeRange::new(at(d1, h1), at(d2, h2)).unwrap()
    }

    fn segment(id: i64, r: TimeRange, is_active: bool) -> LeaveTimeSegment {
        LeaveTimeSegment {
            id,
            leave_id: id,
            employee_id: 1,
            start: r.start,
            end: r.end,
            days: r.days(),
            is_active,
        }
    }

    #[test]
    fn rejects_empty_or_inverted_ranges() {
        assert!(TimeRange::new(at(2, 9), at(2, 9)).is_err());
        assert!(TimeRange::new(at(2, 10), at(2, 9)).is_err());
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let morning = range(2, 9, 2, 12);
        let afternoon = range(2, 12, 2, 18);
        assert!(!morning.overlaps(&afternoon));
        assert!(!afternoon.overlaps(&morning));
    }

    #[test]
    fn partial_and_nested_ranges_overlap() {
        let week = range(2, 0, 9, 0);
        assert!(week.overlaps(&range(8, 12, 10, 0)));
        assert!(week.overlaps(&range(4, 9, 4, 18)));
        assert!(range(4, 9, 4, 18).overlaps(&week));
    }

    #[test]
    fn overlap_seconds_clip_to_intersection() {
        let a = range(2, 0, 4, 0);
        let b = range(3, 0, 6, 0);
        assert_eq!(a.overlap_seconds(&b), Duration::days(1).num_seconds());
        assert_eq!(a.overlap_seconds(&range(5, 0, 6, 0)), 0);
    }

    #[test]
    fn days_round_to_hundredths() {
        assert_eq!(range(2, 0, 3, 0).days(), 1.0);
        assert_eq!(range(2, 9, 2, 17).days(), 0.33);
    }

    #[test]
    fn conflict_ignores_inactive_segments() {
        let candidate = range(3, 9, 3, 18);
        let existing = vec![
            segment(1, range(3, 0, 4, 0), false),
            segment(2, range(1, 0, 2, 0), true),
        ];
        assert!(find_conflict(&candidate, &existing).is_none());

        let existing = vec![segment(3, range(3, 12, 5, 0), true)];
        assert_eq!(find_conflict(&candidate, &existing).map(|s| s.id), Some(3));
    }

    #[test]
    fn disjoint_check_within_application() {
        assert!(ensure_disjoint(&[range(2, 9, 2, 12), range(2, 12, 2, 18)]).is_ok());
        assert!(ensure_disjoint(&[range(2, 9, 3, 12), range(3, 9, 3, 18)]).is_err());
    }
}
