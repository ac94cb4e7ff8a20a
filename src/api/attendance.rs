use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::{AttendanceRecord, AttendanceShift, AttendanceStatus, NewShift};
use crate::service::attendance::{self as attendance_service, CurrentShift};
use crate::store::Store;
use crate::utils::shift_cache::ShiftCache;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RecordsQuery {
    /// HR/Admin only; defaults to the caller
    pub employee_id: Option<i64>,
    #[schema(example = 2026)]
    pub year: Option<i32>,
    #[schema(example = 3)]
    pub month: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordAttendance {
    #[schema(example = 1000)]
    pub employee_id: i64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[utoipa::path(
    post,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked in", body = AttendanceRecord),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    cache: web::Data<ShiftCache>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let record = attendance_service::check_in(
        store.get_ref(),
        cache.get_ref(),
        &auth.actor(),
        Utc::now(),
        config.work_offset(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked out", body = AttendanceRecord),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    cache: web::Data<ShiftCache>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let record = attendance_service::check_out(
        store.get_ref(),
        cache.get_ref(),
        &auth.actor(),
        Utc::now(),
        config.work_offset(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Records of the month, statuses checked against the current shift", body = [AttendanceRecord]),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly_records(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    cache: web::Data<ShiftCache>,
    config: web::Data<Config>,
    query: web::Query<RecordsQuery>,
) -> actix_web::Result<impl Responder> {
    let offset = config.work_offset();
    let today = Utc::now().with_timezone(&offset).date_naive();

    let records = attendance_service::monthly_records(
        store.get_ref(),
        cache.get_ref(),
        &auth.actor(),
        query.employee_id,
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
        offset,
    )
    .await?;
    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    put,
    path = "/api/attendance/records",
    request_body = RecordAttendance,
    responses(
        (status = 200, description = "Record saved", body = AttendanceRecord),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_status(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<RecordAttendance>,
) -> actix_web::Result<impl Responder> {
    let record = attendance_service::record_status(
        store.get_ref(),
        &auth.actor(),
        payload.employee_id,
        payload.date,
        payload.status,
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/shifts",
    responses(
        (status = 200, description = "All shift versions, newest first", body = [AttendanceShift]),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_shifts(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    let shifts = attendance_service::list_shifts(store.get_ref(), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(shifts))
}

#[utoipa::path(
    post,
    path = "/api/attendance/shifts",
    request_body = NewShift,
    responses(
        (status = 201, description = "New inactive shift version", body = AttendanceShift),
        (status = 400, description = "Invalid shift windows"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn create_shift(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<NewShift>,
) -> actix_web::Result<impl Responder> {
    let shift =
        attendance_service::create_shift(store.get_ref(), &auth.actor(), payload.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(shift))
}

#[utoipa::path(
    get,
    path = "/api/attendance/shifts/active",
    responses(
        (status = 200, description = "Shift in force; `shift` is null while defaults apply", body = CurrentShift)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn current_shift(
    store: web::Data<dyn Store>,
    cache: web::Data<ShiftCache>,
) -> actix_web::Result<impl Responder> {
    let current = attendance_service::current_shift(store.get_ref(), cache.get_ref()).await?;
    Ok(HttpResponse::Ok().json(current))
}

#[utoipa::path(
    put,
    path = "/api/attendance/shifts/{shift_id}/activate",
    params(
        ("shift_id", Path, description = "Shift ID")
    ),
    responses(
        (status = 200, description = "Shift activated, all others deactivated", body = AttendanceShift),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Shift not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn activate_shift(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    cache: web::Data<ShiftCache>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let shift = attendance_service::activate_shift(
        store.get_ref(),
        cache.get_ref(),
        &auth.actor(),
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(shift))
}
