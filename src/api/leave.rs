use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use super::paging;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::leave::{LeaveApplication, LeavePolicy, LeaveStatus, LeaveWithSegments};
use crate::rules::leave_status::LeaveAction;
use crate::service::leave::{self as leave_service, SubmitLeave};
use crate::store::{LeaveQuery, Store};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<i64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MyLeaveFilter {
    pub status: Option<LeaveStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveApplication>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Submit leave application
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = SubmitLeave,
        description = "Leave type and one or more time segments",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave submitted for review", body = LeaveWithSegments),
        (status = 400, description = "Invalid segments or leave policy violated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlaps a reviewing or approved leave", body = Object,
         example = json!({
            "message": "Leave time overlaps a reviewing or approved leave; complete the old leave first"
         })
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<SubmitLeave>,
) -> actix_web::Result<impl Responder> {
    let created =
        leave_service::submit_leave(store.get_ref(), &auth.actor(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/* =========================
HR / Admin leave list
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave applications", body = LeaveListResponse),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = paging(query.page, query.per_page);
    let (data, total) = leave_service::list_leaves(
        store.get_ref(),
        &auth.actor(),
        &LeaveQuery {
            employee_id: query.employee_id,
            status: query.status,
            limit: i64::from(per_page),
            offset,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/mine",
    params(MyLeaveFilter),
    responses(
        (status = 200, description = "Caller's own applications", body = LeaveListResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<MyLeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = paging(query.page, query.per_page);
    let (data, total) = leave_service::my_leaves(
        store.get_ref(),
        &auth.actor(),
        query.status,
        i64::from(per_page),
        offset,
    )
    .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/tasks",
    responses(
        (status = 200, description = "Reviewing applications of the caller's direct reports", body = [LeaveApplication])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approval_tasks(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    let tasks = leave_service::approval_tasks(store.get_ref(), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[utoipa::path(
    put,
    path = "/api/leave/policy",
    request_body = LeavePolicy,
    responses(
        (status = 200, description = "Policy saved", body = LeavePolicy),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn set_policy(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<LeavePolicy>,
) -> actix_web::Result<impl Responder> {
    let policy =
        leave_service::set_policy(store.get_ref(), &auth.actor(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(policy))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id", Path, description = "Leave application ID")
    ),
    responses(
        (status = 200, description = "Leave application with its segments", body = LeaveWithSegments),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave application not found", body = Object, example = json!({
            "message": "Leave application not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let leave =
        leave_service::get_leave(store.get_ref(), &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

async fn change_status(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    leave_id: i64,
    action: LeaveAction,
) -> actix_web::Result<HttpResponse> {
    let leave = leave_service::decide(
        store.get_ref(),
        &auth.actor(),
        leave_id,
        action,
        config.work_offset(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave {}", leave.status),
        "leave": leave
    })))
}

/* =========================
Approve leave request
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id", Path, description = "Leave application ID")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Invalid status transition"),
        (status = 403, description = "Only the applicant's manager or HR"),
        (status = 404, description = "Leave application not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    change_status(auth, store, config, path.into_inner(), LeaveAction::Approve).await
}

/* =========================
Reject leave request
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id", Path, description = "Leave application ID")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Invalid status transition"),
        (status = 403, description = "Only the applicant's manager or HR"),
        (status = 404, description = "Leave application not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    change_status(auth, store, config, path.into_inner(), LeaveAction::Reject).await
}

/* =========================
Complete (close) approved leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/complete",
    params(
        ("leave_id", Path, description = "Leave application ID")
    ),
    responses(
        (status = 200, description = "Leave completed, its time range is free again", body = Object,
         example = json!({
            "message": "Leave completed"
         })
        ),
        (status = 400, description = "Invalid status transition"),
        (status = 403, description = "Only the applicant"),
        (status = 404, description = "Leave application not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn complete_leave(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    change_status(auth, store, config, path.into_inner(), LeaveAction::Complete).await
}
