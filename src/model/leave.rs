use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::rules::overlap::TimeRange;

/// Lifecycle of a leave application.
///
/// `reviewing` is the initial state, `rejected` and `completed` are final.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Reviewing,
    Approved,
    Rejected,
    Completed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    Personal,
    Sick,
    Annual,
    Marriage,
    Maternity,
    Paternity,
    Funeral,
    Injury,
    Lieu,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "leave_type": "sick",
    "status": "reviewing",
    "reason": "flu",
    "attachment_url": null,
    "total_days": 1.5,
    "apply_time": "2026-01-01T00:00:00Z",
    "updated_by": null
}))]
pub struct LeaveApplication {
    pub id: i64,
    /// employee who applied
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    pub attachment_url: Option<String>,
    /// sum of all segment days
    pub total_days: f64,
    pub apply_time: DateTime<Utc>,
    /// user id of the last status change
    pub updated_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveTimeSegment {
    pub id: i64,
    pub leave_id: i64,
    pub employee_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: f64,
    /// counted by the overlap guard while the leave is reviewing or approved
    pub is_active: bool,
}

impl LeaveTimeSegment {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveWithSegments {
    #[serde(flatten)]
    pub application: LeaveApplication,
    pub segments: Vec<LeaveTimeSegment>,
}

/// Per-type limits applied on submission. A missing policy imposes none.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeavePolicy {
    pub leave_type: LeaveType,
    /// 0 means unlimited
    #[schema(example = 5.0)]
    pub max_days: f64,
    pub requires_attachment: bool,
    pub enabled: bool,
}

pub struct NewLeave {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub reason: Option<String>,
    pub attachment_url: Option<String>,
    pub total_days: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct NewSegment {
    pub range: TimeRange,
    pub days: f64,
}
