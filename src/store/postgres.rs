use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use super::{
    AttendanceStore, DirectoryStore, EmployeeQuery, LeaveQuery, LeaveStore, PerformanceStore,
    ShiftStore,
};
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
use crate::rules::shift::ShiftWindows;

const EXCLUSION_VIOLATION: &str = "23P01";
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const RAISE_EXCEPTION: &str = "P0001";

const LEAVE_COLUMNS: &str =
    "id, emp_id, leave_type, apply_status, reason, attachment_url, total_days, apply_time, updated_by";
const SEGMENT_COLUMNS: &str =
    "id, leave_id, emp_id, leave_start_time, leave_end_time, segment_days, is_active";
const ATTENDANCE_COLUMNS: &str =
    "id, emp_id, attendance_date, check_in_time, check_out_time, attendance_status";
const SHIFT_COLUMNS: &str = "id, version, shift_name, check_in_start_time, check_in_end_time, \
     check_out_start_time, check_out_end_time, is_active, created_by, created_at";
const CYCLE_COLUMNS: &str = "id, cycle_name, cycle_type, start_time, end_time, attendance_weight, \
     leave_weight, status";
const EVALUATION_COLUMNS: &str = "id, cycle_id, emp_id, attendance_rate, leave_rate, rule_score, \
     final_score, evaluation_status";
const ORG_COLUMNS: &str = "id, org_code, org_name, org_type, parent_org_id, status";
const EMPLOYEE_COLUMNS: &str =
    "id, emp_code, emp_name, email, org_id, manager_emp_id, emp_status, hire_date";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_code(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn is_violation(e: &sqlx::Error, code: &str) -> bool {
    db_code(e).as_deref() == Some(code)
}

fn parse<T: FromStr>(what: &'static str, value: String) -> Result<T, AppError> {
    match value.parse() {
        Ok(v) => Ok(v),
        Err(_) => Err(AppError::CorruptRow { what, value }),
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    I64(i64),
    Str(String),
}

#[derive(FromRow)]
struct LeaveRow {
    id: i64,
    emp_id: i64,
    leave_type: String,
    apply_status: String,
    reason: Option<String>,
    attachment_url: Option<String>,
    total_days: f64,
    apply_time: DateTime<Utc>,
    updated_by: Option<i64>,
}

impl TryFrom<LeaveRow> for LeaveApplication {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, AppError> {
        Ok(LeaveApplication {
            id: row.id,
            employee_id: row.emp_id,
            leave_type: parse("leave type", row.leave_type)?,
            status: parse("leave status", row.apply_status)?,
            reason: row.reason,
            attachment_url: row.attachment_url,
            total_days: row.total_days,
            apply_time: row.apply_time,
            updated_by: row.updated_by,
        })
    }
}

#[derive(FromRow)]
struct SegmentRow {
    id: i64,
    leave_id: i64,
    emp_id: i64,
    leave_start_time: DateTime<Utc>,
    leave_end_time: DateTime<Utc>,
    segment_days: f64,
    is_active: bool,
}

impl From<SegmentRow> for LeaveTimeSegment {
    fn from(row: SegmentRow) -> Self {
        LeaveTimeSegment {
            id: row.id,
            leave_id: row.leave_id,
            employee_id: row.emp_id,
            start: row.leave_start_time,
            end: row.leave_end_time,
            days: row.segment_days,
            is_active: row.is_active,
        }
    }
}

#[derive(FromRow)]
struct PolicyRow {
    leave_type: String,
    max_days: f64,
    requires_attachment: bool,
    enabled: bool,
}

#[derive(FromRow)]
struct AttendanceRow {
    id: i64,
    emp_id: i64,
    attendance_date: NaiveDate,
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    attendance_status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, AppError> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.emp_id,
            date: row.attendance_date,
            check_in: row.check_in_time,
            check_out: row.check_out_time,
            status: parse("attendance status", row.attendance_status)?,
        })
    }
}

#[derive(FromRow)]
struct ShiftRow {
    id: i64,
    version: i32,
    shift_name: String,
    check_in_start_time: NaiveTime,
    check_in_end_time: NaiveTime,
    check_out_start_time: NaiveTime,
    check_out_end_time: NaiveTime,
    is_active: bool,
    created_by: i64,
    created_at: DateTime<Utc>,
}

impl From<ShiftRow> for AttendanceShift {
    fn from(row: ShiftRow) -> Self {
        AttendanceShift {
            id: row.id,
            version: row.version,
            shift_name: row.shift_name,
            windows: ShiftWindows {
                check_in_start: row.check_in_start_time,
                check_in_end: row.check_in_end_time,
                check_out_start: row.check_out_start_time,
                check_out_end: row.check_out_end_time,
            },
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct CycleRow {
    id: i64,
    cycle_name: String,
    cycle_type: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    attendance_weight: i16,
    leave_weight: i16,
    status: String,
}

impl TryFrom<CycleRow> for PerformanceCycle {
    type Error = AppError;

    fn try_from(row: CycleRow) -> Result<Self, AppError> {
        Ok(PerformanceCycle {
            id: row.id,
            cycle_name: row.cycle_name,
            cycle_type: parse("cycle type", row.cycle_type)?,
            start_time: row.start_time,
            end_time: row.end_time,
            attendance_weight: row.attendance_weight,
            leave_weight: row.leave_weight,
            status: parse("cycle status", row.status)?,
        })
    }
}

#[derive(FromRow)]
struct EvaluationRow {
    id: i64,
    cycle_id: i64,
    emp_id: i64,
    attendance_rate: Option<f64>,
    leave_rate: Option<f64>,
    rule_score: Option<f64>,
    final_score: Option<f64>,
    evaluation_status: String,
}

impl TryFrom<EvaluationRow> for PerformanceEvaluation {
    type Error = AppError;

    fn try_from(row: EvaluationRow) -> Result<Self, AppError> {
        Ok(PerformanceEvaluation {
            id: row.id,
            cycle_id: row.cycle_id,
            employee_id: row.emp_id,
            attendance_rate: row.attendance_rate,
            leave_rate: row.leave_rate,
            rule_score: row.rule_score,
            final_score: row.final_score,
            evaluation_status: parse("evaluation status", row.evaluation_status)?,
        })
    }
}

#[derive(FromRow)]
struct OrgRow {
    id: i64,
    org_code: String,
    org_name: String,
    org_type: String,
    parent_org_id: Option<i64>,
    status: String,
}

impl TryFrom<OrgRow> for Organization {
    type Error = AppError;

    fn try_from(row: OrgRow) -> Result<Self, AppError> {
        Ok(Organization {
            id: row.id,
            org_code: row.org_code,
            org_name: row.org_name,
            org_type: parse("organization type", row.org_type)?,
            parent_org_id: row.parent_org_id,
            enabled: row.status == "enabled",
        })
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: i64,
    emp_code: String,
    emp_name: String,
    email: String,
    org_id: i64,
    manager_emp_id: Option<i64>,
    emp_status: String,
    hire_date: NaiveDate,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> Result<Self, AppError> {
        Ok(Employee {
            id: row.id,
            emp_code: row.emp_code,
            emp_name: row.emp_name,
            email: row.email,
            org_id: row.org_id,
            manager_emp_id: row.manager_emp_id,
            emp_status: parse("employee status", row.emp_status)?,
            hire_date: row.hire_date,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl LeaveStore for PgStore {
    async fn leave_policy(&self, leave_type: LeaveType) -> Result<Option<LeavePolicy>, AppError> {
        let row = sqlx::query_as::<_, PolicyRow>(
            "SELECT leave_type, max_days, requires_attachment, enabled FROM leave_policy WHERE leave_type = $1",
        )
        .bind(leave_type.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(LeavePolicy {
                leave_type: parse("leave type", r.leave_type)?,
                max_days: r.max_days,
                requires_attachment: r.requires_attachment,
                enabled: r.enabled,
            })
        })
        .transpose()
    }

    async fn upsert_leave_policy(&self, policy: &LeavePolicy) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO leave_policy (leave_type, max_days, requires_attachment, enabled)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (leave_type) DO UPDATE
            SET max_days = EXCLUDED.max_days,
                requires_attachment = EXCLUDED.requires_attachment,
                enabled = EXCLUDED.enabled
            "#,
        )
        .bind(policy.leave_type.as_ref())
        .bind(policy.max_days)
        .bind(policy.requires_attachment)
        .bind(policy.enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_leave(
        &self,
        leave: &NewLeave,
        segments: &[NewSegment],
    ) -> Result<LeaveWithSegments, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, LeaveRow>(&format!(
            r#"
            INSERT INTO leave_apply (emp_id, leave_type, reason, attachment_url, total_days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LEAVE_COLUMNS}
            "#
        ))
        .bind(leave.employee_id)
        .bind(leave.leave_type.as_ref())
        .bind(&leave.reason)
        .bind(&leave.attachment_url)
        .bind(leave.total_days)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                AppError::NotFound("Employee")
            } else {
                AppError::Database(e)
            }
        })?;
        let application = LeaveApplication::try_from(row)?;

        let mut stored = Vec::with_capacity(segments.len());
        for segment in segments {
            // the no_leave_overlap exclusion constraint serializes concurrent submissions
            let row = sqlx::query_as::<_, SegmentRow>(&format!(
                r#"
                INSERT INTO leave_time_segment
                    (leave_id, emp_id, leave_start_time, leave_end_time, segment_days, is_active)
                VALUES ($1, $2, $3, $4, $5, TRUE)
                RETURNING {SEGMENT_COLUMNS}
                "#
            ))
            .bind(application.id)
            .bind(leave.employee_id)
            .bind(segment.range.start)
            .bind(segment.range.end)
            .bind(segment.days)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_violation(&e, EXCLUSION_VIOLATION) {
                    AppError::Overlap
                } else {
                    AppError::Database(e)
                }
            })?;
            stored.push(LeaveTimeSegment::from(row));
        }

        tx.commit().await?;

        Ok(LeaveWithSegments {
            application,
            segments: stored,
        })
    }

    async fn get_leave(&self, id: i64) -> Result<Option<LeaveWithSegments>, AppError> {
        let row = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_apply WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let segments = sqlx::query_as::<_, SegmentRow>(&format!(
            "SELECT {SEGMENT_COLUMNS} FROM leave_time_segment WHERE leave_id = $1 ORDER BY leave_start_time"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(LeaveWithSegments {
            application: LeaveApplication::try_from(row)?,
            segments: segments.into_iter().map(LeaveTimeSegment::from).collect(),
        }))
    }

    async fn apply_transition(
        &self,
        id: i64,
        from: LeaveStatus,
        to: LeaveStatus,
        actor_user_id: i64,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE leave_apply
            SET apply_status = $1, updated_by = $2, update_time = NOW()
            WHERE id = $3
            AND apply_status = $4
            "#,
        )
        .bind(to.as_ref())
        .bind(actor_user_id)
        .bind(id)
        .bind(from.as_ref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE leave_time_segment SET is_active = $1 WHERE leave_id = $2")
            .bind(to.holds_segments())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_violation(&e, EXCLUSION_VIOLATION) {
                    AppError::Overlap
                } else {
                    AppError::Database(e)
                }
            })?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_leaves(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveApplication>, i64), AppError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = query.employee_id {
            args.push(FilterValue::I64(emp_id));
            where_sql.push_str(&format!(" AND emp_id = ${}", args.len()));
        }

        if let Some(status) = query.status {
            args.push(FilterValue::Str(status.to_string()));
            where_sql.push_str(&format!(" AND apply_status = ${}", args.len()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_apply{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::I64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_apply{} ORDER BY apply_time DESC LIMIT ${} OFFSET ${}",
            where_sql,
            args.len() + 1,
            args.len() + 2
        );
        debug!(sql = %data_sql, "Fetching leave list");

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in &args {
            data_q = match arg {
                FilterValue::I64(v) => data_q.bind(*v),
                FilterValue::Str(s) => data_q.bind(s.as_str()),
            };
        }
        let rows = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((convert_all(rows)?, total))
    }

    async fn reviewing_for_manager(
        &self,
        manager_emp_id: i64,
    ) -> Result<Vec<LeaveApplication>, AppError> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT la.id, la.emp_id, la.leave_type, la.apply_status, la.reason,
                   la.attachment_url, la.total_days, la.apply_time, la.updated_by
            FROM leave_apply la
            JOIN employee e ON e.id = la.emp_id
            WHERE e.manager_emp_id = $1
            AND la.apply_status = 'reviewing'
            ORDER BY la.apply_time
            "#,
        )
        .bind(manager_emp_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn taken_segments_between(
        &self,
        employee_id: i64,
        window: &TimeRange,
    ) -> Result<Vec<LeaveTimeSegment>, AppError> {
        let rows = sqlx::query_as::<_, SegmentRow>(
            r#"
            SELECT s.id, s.leave_id, s.emp_id, s.leave_start_time, s.leave_end_time,
                   s.segment_days, s.is_active
            FROM leave_time_segment s
            JOIN leave_apply la ON la.id = s.leave_id
            WHERE s.emp_id = $1
            AND la.apply_status = 'approved'
            AND s.leave_start_time < $3
            AND s.leave_end_time > $2
            "#,
        )
        .bind(employee_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LeaveTimeSegment::from).collect())
    }
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn insert_check_in(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            INSERT INTO attendance (emp_id, attendance_date, check_in_time, attendance_status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (emp_id, attendance_date) DO UPDATE
            SET check_in_time = EXCLUDED.check_in_time,
                attendance_status = CASE
                    WHEN attendance.attendance_status = 'normal' THEN EXCLUDED.attendance_status
                    ELSE attendance.attendance_status
                END,
                update_time = NOW()
            WHERE attendance.check_in_time IS NULL
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(date)
        .bind(at)
        .bind(status.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn record_check_out(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            UPDATE attendance
            SET check_out_time = $3,
                attendance_status = CASE
                    WHEN attendance_status = 'normal' THEN $4
                    ELSE attendance_status
                END,
                update_time = NOW()
            WHERE emp_id = $1
            AND attendance_date = $2
            AND check_in_time IS NOT NULL
            AND check_out_time IS NULL
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(date)
        .bind(at)
        .bind(status.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn upsert_attendance_status(
        &self,
        employee_id: i64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            INSERT INTO attendance (emp_id, attendance_date, attendance_status)
            VALUES ($1, $2, $3)
            ON CONFLICT (emp_id, attendance_date) DO UPDATE
            SET attendance_status = EXCLUDED.attendance_status, update_time = NOW()
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(employee_id)
        .bind(date)
        .bind(status.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                AppError::NotFound("Employee")
            } else {
                AppError::Database(e)
            }
        })?;
        AttendanceRecord::try_from(row)
    }

    async fn attendance_between(
        &self,
        employee_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance
            WHERE emp_id = $1
            AND attendance_date BETWEEN $2 AND $3
            ORDER BY attendance_date
            "#
        ))
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

#[async_trait]
impl ShiftStore for PgStore {
    async fn create_shift(
        &self,
        shift: &NewShift,
        created_by: i64,
    ) -> Result<AttendanceShift, AppError> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!(
            r#"
            INSERT INTO attendance_shift
                (version, shift_name, check_in_start_time, check_in_end_time,
                 check_out_start_time, check_out_end_time, is_active, created_by)
            SELECT COALESCE(MAX(version), 0) + 1, $1, $2, $3, $4, $5, FALSE, $6
            FROM attendance_shift
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(&shift.shift_name)
        .bind(shift.check_in_start)
        .bind(shift.check_in_end)
        .bind(shift.check_out_start)
        .bind(shift.check_out_end)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_violation(&e, UNIQUE_VIOLATION) {
                AppError::Conflict("Another shift version was saved at the same time, retry")
            } else {
                AppError::Database(e)
            }
        })?;
        Ok(row.into())
    }

    async fn activate_shift(&self, id: i64) -> Result<Option<AttendanceShift>, AppError> {
        let mut tx = self.pool.begin().await?;

        // one activation at a time; readers are not blocked
        sqlx::query("LOCK TABLE attendance_shift IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE attendance_shift SET is_active = FALSE WHERE is_active AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ShiftRow>(&format!(
            "UPDATE attendance_shift SET is_active = TRUE WHERE id = $1 RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn active_shift(&self) -> Result<Option<AttendanceShift>, AppError> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM attendance_shift WHERE is_active LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AttendanceShift::from))
    }

    async fn list_shifts(&self) -> Result<Vec<AttendanceShift>, AppError> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM attendance_shift ORDER BY version DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AttendanceShift::from).collect())
    }
}

#[async_trait]
impl PerformanceStore for PgStore {
    async fn insert_cycle(&self, cycle: &NewCycle) -> Result<PerformanceCycle, AppError> {
        let row = sqlx::query_as::<_, CycleRow>(&format!(
            r#"
            INSERT INTO performance_cycle
                (cycle_name, cycle_type, start_time, end_time, attendance_weight, leave_weight)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CYCLE_COLUMNS}
            "#
        ))
        .bind(&cycle.cycle_name)
        .bind(cycle.cycle_type.as_ref())
        .bind(cycle.start_time)
        .bind(cycle.end_time)
        .bind(cycle.attendance_weight)
        .bind(cycle.leave_weight)
        .fetch_one(&self.pool)
        .await?;
        PerformanceCycle::try_from(row)
    }

    async fn get_cycle(&self, id: i64) -> Result<Option<PerformanceCycle>, AppError> {
        let row = sqlx::query_as::<_, CycleRow>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM performance_cycle WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PerformanceCycle::try_from).transpose()
    }

    async fn insert_evaluation(
        &self,
        cycle_id: i64,
        employee_id: i64,
    ) -> Result<PerformanceEvaluation, AppError> {
        let row = sqlx::query_as::<_, EvaluationRow>(&format!(
            r#"
            INSERT INTO performance_evaluation (cycle_id, emp_id)
            VALUES ($1, $2)
            RETURNING {EVALUATION_COLUMNS}
            "#
        ))
        .bind(cycle_id)
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match db_code(&e).as_deref() {
            Some(UNIQUE_VIOLATION) => {
                AppError::Conflict("Evaluation already exists for this employee and cycle")
            }
            Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound("Employee"),
            _ => AppError::Database(e),
        })?;
        PerformanceEvaluation::try_from(row)
    }

    async fn get_evaluation(&self, id: i64) -> Result<Option<PerformanceEvaluation>, AppError> {
        let row = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM performance_evaluation WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PerformanceEvaluation::try_from).transpose()
    }

    async fn evaluations_for_cycle(
        &self,
        cycle_id: i64,
    ) -> Result<Vec<PerformanceEvaluation>, AppError> {
        let rows = sqlx::query_as::<_, EvaluationRow>(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM performance_evaluation WHERE cycle_id = $1 ORDER BY emp_id"
        ))
        .bind(cycle_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn evaluations_overlapping(
        &self,
        employee_id: i64,
        window: &TimeRange,
    ) -> Result<Vec<PerformanceEvaluation>, AppError> {
        let rows = sqlx::query_as::<_, EvaluationRow>(
            r#"
            SELECT ev.id, ev.cycle_id, ev.emp_id, ev.attendance_rate, ev.leave_rate,
                   ev.rule_score, ev.final_score, ev.evaluation_status
            FROM performance_evaluation ev
            JOIN performance_cycle c ON c.id = ev.cycle_id
            WHERE ev.emp_id = $1
            AND c.start_time < $3
            AND c.end_time > $2
            "#,
        )
        .bind(employee_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn save_metrics(
        &self,
        evaluation_id: i64,
        attendance_rate: Option<f64>,
        leave_rate: Option<f64>,
        rule_score: Option<f64>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE performance_evaluation
            SET attendance_rate = $2, leave_rate = $3, rule_score = $4, update_time = NOW()
            WHERE id = $1
            "#,
        )
        .bind(evaluation_id)
        .bind(attendance_rate)
        .bind(leave_rate)
        .bind(rule_score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_final_score(&self, evaluation_id: i64, score: f64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE performance_evaluation SET final_score = $2, update_time = NOW() WHERE id = $1",
        )
        .bind(evaluation_id)
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn insert_org(&self, org: &NewOrganization) -> Result<Organization, AppError> {
        let row = sqlx::query_as::<_, OrgRow>(&format!(
            r#"
            INSERT INTO organization (org_code, org_name, org_type, parent_org_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORG_COLUMNS}
            "#
        ))
        .bind(&org.org_code)
        .bind(&org.org_name)
        .bind(org.org_type.as_ref())
        .bind(org.parent_org_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match db_code(&e).as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict("Organization code already exists"),
            Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound("Parent organization"),
            _ => AppError::Database(e),
        })?;
        Organization::try_from(row)
    }

    async fn list_orgs(&self) -> Result<Vec<Organization>, AppError> {
        let rows = sqlx::query_as::<_, OrgRow>(&format!(
            "SELECT {ORG_COLUMNS} FROM organization ORDER BY org_code"
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn org_parents(&self) -> Result<HashMap<i64, Option<i64>>, AppError> {
        let rows = sqlx::query_as::<_, (i64, Option<i64>)>(
            "SELECT id, parent_org_id FROM organization",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn set_org_parent(&self, id: i64, parent: Option<i64>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE organization SET parent_org_id = $2, update_time = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(parent)
        .execute(&self.pool)
        .await
        .map_err(|e| match db_code(&e).as_deref() {
            // raised by trigger_check_org_cycle
            Some(RAISE_EXCEPTION) => AppError::OrgCycle,
            Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound("Parent organization"),
            _ => AppError::Database(e),
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, AppError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            r#"
            INSERT INTO employee (emp_code, emp_name, email, org_id, manager_emp_id, hire_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(&employee.emp_code)
        .bind(&employee.emp_name)
        .bind(&employee.email)
        .bind(employee.org_id)
        .bind(employee.manager_emp_id)
        .bind(employee.hire_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match db_code(&e).as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict("Employee code or email already exists"),
            Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound("Organization or manager"),
            _ => AppError::Database(e),
        })?;
        Employee::try_from(row)
    }

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Employee::try_from).transpose()
    }

    async fn list_employees(
        &self,
        query: &EmployeeQuery,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        // ---------- build WHERE clause dynamically ----------
        let mut conditions: Vec<String> = Vec::new();
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(org_id) = query.org_id {
            args.push(FilterValue::I64(org_id));
            conditions.push(format!("org_id = ${}", args.len()));
        }

        if let Some(manager) = query.manager_emp_id {
            args.push(FilterValue::I64(manager));
            conditions.push(format!("manager_emp_id = ${}", args.len()));
        }

        if let Some(search) = &query.search {
            args.push(FilterValue::Str(format!("%{}%", search)));
            let n = args.len();
            conditions.push(format!("(emp_name ILIKE ${n} OR email ILIKE ${n} OR emp_code ILIKE ${n})"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM employee {}", where_clause);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::I64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // ---------- data query ----------
        let data_sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employee {} ORDER BY id DESC LIMIT ${} OFFSET ${}",
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        debug!(sql = %data_sql, "Fetching employees");

        let mut data_q = sqlx::query_as::<_, EmployeeRow>(&data_sql);
        for arg in &args {
            data_q = match arg {
                FilterValue::I64(v) => data_q.bind(*v),
                FilterValue::Str(s) => data_q.bind(s.as_str()),
            };
        }
        let rows = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((convert_all(rows)?, total))
    }
}
