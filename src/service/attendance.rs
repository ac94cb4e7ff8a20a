use chrono::{DateTime, FixedOffset, Months, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::{Actor, non_blank};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceShift, AttendanceStatus, NewShift};
use crate::rules::shift::ShiftWindows;
use crate::store::{AttendanceStore, ShiftStore};
use crate::utils::shift_cache::ShiftCache;

/// The shift currently applied. `shift` is empty while the built-in
/// default windows are in force.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentShift {
    pub shift: Option<AttendanceShift>,
    pub windows: ShiftWindows,
}

async fn current_windows<S>(store: &S, cache: &ShiftCache) -> Result<ShiftWindows, AppError>
where
    S: ShiftStore + ?Sized,
{
    Ok(cache
        .active(store)
        .await?
        .map(|s| s.windows)
        .unwrap_or_default())
}

pub async fn check_in<S>(
    store: &S,
    cache: &ShiftCache,
    actor: &Actor,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ShiftStore + ?Sized,
{
    let employee_id = actor.employee_id()?;
    let windows = current_windows(store, cache).await?;
    let local = now.with_timezone(&offset);
    let status = windows.check_in_status(local.time());

    let record = store
        .insert_check_in(employee_id, local.date_naive(), now, status)
        .await?
        .ok_or(AppError::AlreadyCheckedIn)?;
    info!(employee_id, status = %record.status, "Checked in");
    Ok(record)
}

pub async fn check_out<S>(
    store: &S,
    cache: &ShiftCache,
    actor: &Actor,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ShiftStore + ?Sized,
{
    let employee_id = actor.employee_id()?;
    let windows = current_windows(store, cache).await?;
    let local = now.with_timezone(&offset);
    let status = windows.check_out_status(local.time());

    let record = store
        .record_check_out(employee_id, local.date_naive(), now, status)
        .await?
        .ok_or(AppError::NoActiveCheckIn)?;
    info!(employee_id, status = %record.status, "Checked out");
    Ok(record)
}

/// HR correction of a day, e.g. marking it absent or as leave.
pub async fn record_status<S>(
    store: &S,
    actor: &Actor,
    employee_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let record = store
        .upsert_attendance_status(employee_id, date, status)
        .await?;
    info!(employee_id, %date, status = %status, user_id = actor.user_id, "Attendance recorded");
    Ok(record)
}

/// Records of one month with the status as seen through the current shift.
/// Employees read their own; HR/Admin may name anyone.
pub async fn monthly_records<S>(
    store: &S,
    cache: &ShiftCache,
    actor: &Actor,
    employee_id: Option<i64>,
    year: i32,
    month: u32,
    offset: FixedOffset,
) -> Result<Vec<AttendanceRecord>, AppError>
where
    S: AttendanceStore + ShiftStore + ?Sized,
{
    let employee_id = match employee_id {
        Some(id) if actor.is_hr_or_admin() || actor.is_employee(id) => id,
        Some(_) => return Err(AppError::Forbidden("You can only view your own attendance")),
        None => actor.employee_id()?,
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("invalid month {year}-{month}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AppError::Validation(format!("invalid month {year}-{month}")))?;

    let windows = current_windows(store, cache).await?;
    let mut records = store.attendance_between(employee_id, first, last).await?;
    for record in records.iter_mut() {
        record.status = windows.effective_status(record, offset);
    }
    Ok(records)
}

pub async fn create_shift<S>(store: &S, actor: &Actor, req: NewShift) -> Result<AttendanceShift, AppError>
where
    S: ShiftStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let shift_name = non_blank(&req.shift_name, "shift_name")?;
    req.windows().validate()?;

    let shift = store
        .create_shift(&NewShift { shift_name, ..req }, actor.user_id)
        .await?;
    info!(shift_id = shift.id, version = shift.version, "Shift version created");
    Ok(shift)
}

pub async fn activate_shift<S>(
    store: &S,
    cache: &ShiftCache,
    actor: &Actor,
    id: i64,
) -> Result<AttendanceShift, AppError>
where
    S: ShiftStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let shift = store
        .activate_shift(id)
        .await?
        .ok_or(AppError::NotFound("Shift"))?;
    cache.invalidate().await;
    info!(shift_id = shift.id, version = shift.version, user_id = actor.user_id, "Shift activated");
    Ok(shift)
}

pub async fn list_shifts<S>(store: &S, actor: &Actor) -> Result<Vec<AttendanceShift>, AppError>
where
    S: ShiftStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    store.list_shifts().await
}

pub async fn current_shift<S>(store: &S, cache: &ShiftCache) -> Result<CurrentShift, AppError>
where
    S: ShiftStore + ?Sized,
{
    let shift = cache.active(store).await?;
    let windows = shift.as_ref().map(|s| s.windows).unwrap_or_default();
    Ok(CurrentShift { shift, windows })
}
