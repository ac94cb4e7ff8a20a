//! Attendance rate, leave rate and the weighted rule score of a
//! performance cycle.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::overlap::TimeRange;
use super::round_to;
use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::model::leave::LeaveTimeSegment;

/// No attendance was recorded in the window, so rates cannot be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient attendance data")]
pub struct InsufficientData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    pub attendance: i16,
    pub leave: i16,
}

impl Weights {
    pub fn total(self) -> i32 {
        i32::from(self.attendance) + i32::from(self.leave)
    }

    /// Cycle weights are percentages and must add up to exactly 100.
    pub fn validate(self) -> Result<Self, AppError> {
        if self.attendance < 0 || self.leave < 0 || self.total() != 100 {
            return Err(AppError::InvalidWeightConfig {
                attendance: self.attendance,
                leave: self.leave,
            });
        }
        Ok(self)
    }
}

/// Mon-Fri days between `start` and `end`, both inclusive.
pub fn count_weekdays(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    let mut total = 0;
    let mut cur = start;
    loop {
        if !matches!(cur.weekday(), Weekday::Sat | Weekday::Sun) {
            total += 1;
        }
        if cur >= end {
            break;
        }
        match cur.succ_opt() {
            Some(next) => cur = next,
            None => break,
        }
    }
    total
}

/// Leave days inside `window`, prorating segments that only partly overlap it.
pub fn prorated_leave_days(segments: &[LeaveTimeSegment], window: &TimeRange) -> f64 {
    segments
        .iter()
        .filter_map(|seg| {
            let range = seg.range();
            let full = range.duration_seconds();
            if full <= 0 {
                return None;
            }
            let overlap = range.overlap_seconds(window);
            if overlap <= 0 {
                return None;
            }
            Some(seg.days * overlap as f64 / full as f64)
        })
        .sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    /// distinct dates with a record that is not absent/leave
    pub attended_days: u32,
    /// distinct dates with any record
    pub recorded_days: u32,
}

impl AttendanceTally {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let recorded: BTreeSet<NaiveDate> = records.iter().map(|r| r.date).collect();
        let attended: BTreeSet<NaiveDate> = records
            .iter()
            .filter(|r| r.status.is_attended())
            .map(|r| r.date)
            .collect();
        Self {
            attended_days: attended.len() as u32,
            recorded_days: recorded.len() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub attendance_rate: f64,
    pub leave_rate: f64,
}

pub fn compute_rates(
    expected_days: u32,
    tally: AttendanceTally,
    leave_days: f64,
) -> Result<Rates, InsufficientData> {
    if tally.recorded_days == 0 || expected_days == 0 {
        return Err(InsufficientData);
    }
    let expected = f64::from(expected_days);
    Ok(Rates {
        attendance_rate: clamp_unit(round_to(f64::from(tally.attended_days) / expected, 4)),
        leave_rate: clamp_unit(round_to(leave_days / expected, 4)),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RuleMetrics {
    pub expected_days: u32,
    pub attendance_days: u32,
    pub leave_days: f64,
    pub attendance_rate: Option<f64>,
    pub leave_rate: Option<f64>,
}

impl RuleMetrics {
    pub fn derive(expected_days: u32, tally: AttendanceTally, leave_days: f64) -> Self {
        let rates = compute_rates(expected_days, tally, leave_days).ok();
        Self {
            expected_days,
            attendance_days: tally.attended_days,
            leave_days: round_to(leave_days, 2),
            attendance_rate: rates.map(|r| r.attendance_rate),
            leave_rate: rates.map(|r| r.leave_rate),
        }
    }

    pub fn has_data(&self) -> bool {
        self.attendance_rate.is_some() && self.leave_rate.is_some()
    }
}

/// Weighted score in 0..=100, or `None` when a rate is missing or the
/// weights sum to zero. Out-of-range rates are clamped to 0..=1 first.
pub fn compute_rule_score(
    attendance_rate: Option<f64>,
    leave_rate: Option<f64>,
    weights: Weights,
) -> Option<f64> {
    let attendance = attendance_rate.filter(|r| r.is_finite()).map(clamp_unit)?;
    let leave = leave_rate.filter(|r| r.is_finite()).map(clamp_unit)?;
    let total = weights.total();
    if total <= 0 {
        return None;
    }
    let weighted = attendance * 100.0 * f64::from(weights.attendance)
        + (1.0 - leave) * 100.0 * f64::from(weights.leave);
    Some(weighted / f64::from(total))
}

/// Rate as a percentage with two decimals.
pub fn percent(rate: Option<f64>) -> Option<f64> {
    rate.map(|r| round_to(r * 100.0, 2))
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
