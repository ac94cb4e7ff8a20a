use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Check-in and check-out windows in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShiftWindows {
    #[schema(value_type = String, example = "09:00:00")]
    pub check_in_start: NaiveTime,
    #[schema(value_type = String, example = "09:30:00")]
    pub check_in_end: NaiveTime,
    #[schema(value_type = String, example = "17:30:00")]
    pub check_out_start: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub check_out_end: NaiveTime,
}

impl Default for ShiftWindows {
    fn default() -> Self {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self {
            check_in_start: hm(9, 0),
            check_in_end: hm(9, 30),
            check_out_start: hm(17, 30),
            check_out_end: hm(18, 0),
        }
    }
}

impl ShiftWindows {
    pub fn validate(self) -> Result<Self, AppError> {
        if self.check_in_start > self.check_in_end {
            return Err(AppError::InvalidShift("check-in window starts after it ends"));
        }
        if self.check_in_end >= self.check_out_start {
            return Err(AppError::InvalidShift(
                "check-in window must close before check-out opens",
            ));
        }
        if self.check_out_start > self.check_out_end {
            return Err(AppError::InvalidShift("check-out window starts after it ends"));
        }
        Ok(self)
    }

    pub fn check_in_status(&self, local: NaiveTime) -> AttendanceStatus {
        if local > self.check_in_end {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Normal
        }
    }

    pub fn check_out_status(&self, local: NaiveTime) -> AttendanceStatus {
        if local < self.check_out_start {
            AttendanceStatus::EarlyLeave
        } else {
            AttendanceStatus::Normal
        }
    }

    /// Status to show for a stored record: a `normal` record whose punches
    /// break the current windows is reported as late or early leave.
    pub fn effective_status(&self, record: &AttendanceRecord, offset: FixedOffset) -> AttendanceStatus {
        if record.status != AttendanceStatus::Normal {
            return record.status;
        }
        if let Some(check_in) = record.check_in {
            if self.check_in_status(local_time(check_in, offset)) == AttendanceStatus::Late {
                return AttendanceStatus::Late;
            }
        }
        if let Some(check_out) = record.check_out {
            return self.check_out_status(local_time(check_out, offset));
        }
        AttendanceStatus::Normal
    }
}

pub fn local_time(at: DateTime<Utc>, offset: FixedOffset) -> NaiveTime {
    at.with_timezone(&offset).time()
}
