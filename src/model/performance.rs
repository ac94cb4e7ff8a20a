use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::rules::overlap::TimeRange;
use crate::rules::scoring::Weights;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CycleType {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CycleStatus {
    NotStarted,
    InProgress,
    Ended,
    Archived,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvaluationStatus {
    NotStarted,
    SelfEval,
    ManagerEval,
    HrAudit,
    Completed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PerformanceCycle {
    pub id: i64,
    pub cycle_name: String,
    pub cycle_type: CycleType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = 50)]
    pub attendance_weight: i16,
    #[schema(example = 50)]
    pub leave_weight: i16,
    pub status: CycleStatus,
}

impl PerformanceCycle {
    pub fn weights(&self) -> Weights {
        Weights {
            attendance: self.attendance_weight,
            leave: self.leave_weight,
        }
    }

    pub fn window(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCycle {
    #[schema(example = "2026 Q1")]
    pub cycle_name: String,
    pub cycle_type: CycleType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = 60)]
    pub attendance_weight: i16,
    #[schema(example = 40)]
    pub leave_weight: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PerformanceEvaluation {
    pub id: i64,
    pub cycle_id: i64,
    pub employee_id: i64,
    /// 0..=1, null until attendance data exists
    pub attendance_rate: Option<f64>,
    /// 0..=1, null until attendance data exists
    pub leave_rate: Option<f64>,
    /// derived from the rates and the cycle weights
    pub rule_score: Option<f64>,
    /// human-adjusted score
    pub final_score: Option<f64>,
    pub evaluation_status: EvaluationStatus,
}
