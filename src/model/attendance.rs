use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::rules::shift::ShiftWindows;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Normal,
    Late,
    EarlyLeave,
    Absent,
    Leave,
    Field,
    Overtime,
}

impl AttendanceStatus {
    /// Whether a day with this status counts as attended.
    pub fn is_attended(self) -> bool {
        !matches!(self, AttendanceStatus::Absent | AttendanceStatus::Leave)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: i64,
    pub employee_id: i64,
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

/// One version of the attendance window configuration.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceShift {
    pub id: i64,
    pub version: i32,
    pub shift_name: String,
    #[serde(flatten)]
    pub windows: ShiftWindows,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewShift {
    #[schema(example = "Default shift")]
    pub shift_name: String,
    #[schema(value_type = String, example = "09:00:00")]
    pub check_in_start: NaiveTime,
    #[schema(value_type = String, example = "09:30:00")]
    pub check_in_end: NaiveTime,
    #[schema(value_type = String, example = "17:30:00")]
    pub check_out_start: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub check_out_end: NaiveTime,
}

impl NewShift {
    pub fn windows(&self) -> ShiftWindows {
        ShiftWindows {
            check_in_start: self.check_in_start,
            check_in_end: self.check_in_end,
            check_out_start: self.check_out_start,
            check_out_end: self.check_out_end,
        }
    }
}
