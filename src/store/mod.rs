//! Storage seams. The rules in `service` only see these traits; `postgres`
//! is the production backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceShift, AttendanceStatus, NewShift};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave::{
    LeaveApplication, LeavePolicy, LeaveStatus, LeaveTimeSegment, LeaveType, LeaveWithSegments,
    NewLeave, NewSegment,
};
use crate::model::organization::{NewOrganization, Organization};
use crate::model::performance::{NewCycle, PerformanceCycle, PerformanceEvaluation};
use crate::rules::overlap::TimeRange;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub employee_id: Option<i64>,
    pub status: Option<LeaveStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    pub org_id: Option<i64>,
    pub manager_emp_id: Option<i64>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn leave_policy(&self, leave_type: LeaveType) -> Result<Option<LeavePolicy>, AppError>;

    async fn upsert_leave_policy(&self, policy: &LeavePolicy) -> Result<(), AppError>;

    /// Inserts the application and its active segments as one unit. Fails
    /// with [`AppError::Overlap`] and writes nothing when any segment
    /// intersects another active segment of the same employee.
    async fn insert_leave(
        &self,
        leave: &NewLeave,
        segments: &[NewSegment],
    ) -> Result<LeaveWithSegments, AppError>;

    async fn get_leave(&self, id: i64) -> Result<Option<LeaveWithSegments>, AppError>;

    /// Moves `id` from `from` to `to` and sets every segment's active flag
    /// to `to.holds_segments()`, atomically. Returns `false` when the stored
    /// status is no longer `from`.
    async fn apply_transition(
        &self,
        id: i64,
        from: LeaveStatus,
        to: LeaveStatus,
        actor_user_id: i64,
    ) -> Result<bool, AppError>;

    async fn list_leaves(&self, query: &LeaveQuery)
    -> Result<(Vec<LeaveApplication>, i64), AppError>;

    /// Reviewing applications of the manager's direct reports, oldest first.
    async fn reviewing_for_manager(&self, manager_emp_id: i64)
    -> Result<Vec<LeaveApplication>, AppError>;

    /// Segments of approved or completed leave intersecting `window`.
    async fn taken_segments_between(
        &self,
        employee_id: i64,
        window: &TimeRange,
    ) -> Result<Vec<LeaveTimeSegment>, AppError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Creates the day's record with a check-in, or fills the check-in of a
    /// record created without one. `None` when the day already has a check-in.
    async fn insert_check_in(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Sets the check-out of a checked-in record. `status` only replaces a
    /// `normal` status. `None` when there is nothing to check out of.
    async fn record_check_out(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    async fn upsert_attendance_status(
        &self,
        employee_id: i64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError>;

    async fn attendance_between(
        &self,
        employee_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;
}

#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Stores a new, inactive shift version.
    async fn create_shift(&self, shift: &NewShift, created_by: i64)
    -> Result<AttendanceShift, AppError>;

    /// Makes `id` the only active shift. `None` if it does not exist.
    async fn activate_shift(&self, id: i64) -> Result<Option<AttendanceShift>, AppError>;

    async fn active_shift(&self) -> Result<Option<AttendanceShift>, AppError>;

    async fn list_shifts(&self) -> Result<Vec<AttendanceShift>, AppError>;
}

#[async_trait]
pub trait PerformanceStore: Send + Sync {
    async fn insert_cycle(&self, cycle: &NewCycle) -> Result<PerformanceCycle, AppError>;

    async fn get_cycle(&self, id: i64) -> Result<Option<PerformanceCycle>, AppError>;

    async fn insert_evaluation(
        &self,
        cycle_id: i64,
        employee_id: i64,
    ) -> Result<PerformanceEvaluation, AppError>;

    async fn get_evaluation(&self, id: i64) -> Result<Option<PerformanceEvaluation>, AppError>;

    async fn evaluations_for_cycle(&self, cycle_id: i64)
    -> Result<Vec<PerformanceEvaluation>, AppError>;

    /// Evaluations of the employee whose cycle intersects `window`.
    async fn evaluations_overlapping(
        &self,
        employee_id: i64,
        window: &TimeRange,
    ) -> Result<Vec<PerformanceEvaluation>, AppError>;

    async fn save_metrics(
        &self,
        evaluation_id: i64,
        attendance_rate: Option<f64>,
        leave_rate: Option<f64>,
        rule_score: Option<f64>,
    ) -> Result<(), AppError>;

    async fn set_final_score(&self, evaluation_id: i64, score: f64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_org(&self, org: &NewOrganization) -> Result<Organization, AppError>;

    async fn list_orgs(&self) -> Result<Vec<Organization>, AppError>;

    /// Every organization id with its parent.
    async fn org_parents(&self) -> Result<HashMap<i64, Option<i64>>, AppError>;

    async fn set_org_parent(&self, id: i64, parent: Option<i64>) -> Result<bool, AppError>;

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, AppError>;

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, AppError>;

    async fn list_employees(&self, query: &EmployeeQuery) -> Result<(Vec<Employee>, i64), AppError>;
}

/// Everything the HTTP layer needs from storage.
pub trait Store: LeaveStore + AttendanceStore + ShiftStore + PerformanceStore + DirectoryStore {}

impl<T> Store for T where
    T: LeaveStore + AttendanceStore + ShiftStore + PerformanceStore + DirectoryStore
{
}
