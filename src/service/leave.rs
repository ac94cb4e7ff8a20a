use chrono::FixedOffset;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{Actor, performance};
use crate::error::AppError;
use crate::model::leave::{
    LeaveApplication, LeavePolicy, LeaveStatus, LeaveType, LeaveWithSegments, NewLeave, NewSegment,
};
use crate::rules::leave_status::LeaveAction;
use crate::rules::overlap::{TimeRange, ensure_disjoint};
use crate::rules::round_to;
use crate::store::{AttendanceStore, DirectoryStore, LeaveQuery, LeaveStore, PerformanceStore};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitLeave {
    pub leave_type: LeaveType,
    #[schema(example = "family matters")]
    pub reason: Option<String>,
    pub attachment_url: Option<String>,
    /// one or more `[start, end)` ranges
    pub segments: Vec<TimeRange>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_policy(policy: &LeavePolicy, total_days: f64, has_attachment: bool) -> Result<(), AppError> {
    if !policy.enabled {
        return Err(AppError::Validation(format!(
            "Leave type {} is not available",
            policy.leave_type
        )));
    }
    if policy.max_days > 0.0 && total_days > policy.max_days {
        return Err(AppError::Validation(format!(
            "{} leave is limited to {} days per application",
            policy.leave_type, policy.max_days
        )));
    }
    if policy.requires_attachment && !has_attachment {
        return Err(AppError::Validation(format!(
            "{} leave requires an attachment",
            policy.leave_type
        )));
    }
    Ok(())
}

pub async fn submit_leave<S>(store: &S, actor: &Actor, req: SubmitLeave) -> Result<LeaveWithSegments, AppError>
where
    S: LeaveStore + ?Sized,
{
    let employee_id = actor.employee_id()?;
    if req.segments.is_empty() {
        return Err(AppError::Validation(
            "at least one leave segment is required".to_string(),
        ));
    }

    let ranges = req
        .segments
        .iter()
        .map(|r| TimeRange::new(r.start, r.end))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_disjoint(&ranges)?;

    let segments: Vec<NewSegment> = ranges
        .into_iter()
        .map(|range| NewSegment {
            range,
            days: range.days(),
        })
        .collect();
    let total_days = round_to(segments.iter().map(|s| s.days).sum(), 2);

    let attachment_url = optional_text(req.attachment_url);
    if let Some(policy) = store.leave_policy(req.leave_type).await? {
        check_policy(&policy, total_days, attachment_url.is_some())?;
    }

    let leave = NewLeave {
        employee_id,
        leave_type: req.leave_type,
        reason: optional_text(req.reason),
        attachment_url,
        total_days,
    };
    let created = store.insert_leave(&leave, &segments).await?;

    info!(
        leave_id = created.application.id,
        employee_id,
        total_days,
        segments = created.segments.len(),
        "Leave application submitted"
    );
    Ok(created)
}

/// Approves, rejects or completes an application.
///
/// Approve/reject is open to the applicant's direct manager and to HR/Admin,
/// never to the applicant; only the applicant completes. Evaluations touched
/// by the leave are recomputed afterwards; a failure there is logged and does
/// not undo the status change.
pub async fn decide<S>(
    store: &S,
    actor: &Actor,
    leave_id: i64,
    action: LeaveAction,
    offset: FixedOffset,
) -> Result<LeaveApplication, AppError>
where
    S: LeaveStore + DirectoryStore + AttendanceStore + PerformanceStore + ?Sized,
{
    let mut leave = store
        .get_leave(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave application"))?;
    let applicant = leave.application.employee_id;

    match action {
        LeaveAction::Approve | LeaveAction::Reject => {
            if actor.is_employee(applicant) {
                return Err(AppError::Forbidden("You cannot review your own leave"));
            }
            if !actor.is_hr_or_admin() && !is_manager_of(store, actor, applicant).await? {
                return Err(AppError::Forbidden(
                    "Only the applicant's manager or HR can review this leave",
                ));
            }
        }
        LeaveAction::Complete => {
            if !actor.is_employee(applicant) {
                return Err(AppError::Forbidden("Only the applicant can complete this leave"));
            }
        }
    }

    let from = leave.application.status;
    let to = from.transition(action.target())?;

    if !store
        .apply_transition(leave_id, from, to, actor.user_id)
        .await?
    {
        // someone else moved it first
        let latest = store
            .get_leave(leave_id)
            .await?
            .map(|l| l.application.status)
            .unwrap_or(from);
        warn!(leave_id, from = %latest, to = %to, "Concurrent leave status change");
        return Err(AppError::InvalidTransition { from: latest, to });
    }

    info!(leave_id, from = %from, to = %to, user_id = actor.user_id, "Leave status changed");

    leave.application.status = to;
    leave.application.updated_by = Some(actor.user_id);
    for segment in leave.segments.iter_mut() {
        segment.is_active = to.holds_segments();
    }

    // approving adds leave days to the rates, completing takes them away
    if from.counts_as_taken() || to.counts_as_taken() {
        match performance::refresh_for_leave(store, &leave, offset).await {
            Ok(0) => {}
            Ok(refreshed) => info!(leave_id, refreshed, "Evaluations refreshed after leave change"),
            Err(e) => warn!(error = %e, leave_id, "Failed to refresh evaluations after leave change"),
        }
    }

    Ok(leave.application)
}

async fn is_manager_of<S>(store: &S, actor: &Actor, employee_id: i64) -> Result<bool, AppError>
where
    S: DirectoryStore + ?Sized,
{
    let Some(manager) = actor.employee_id else {
        return Ok(false);
    };
    Ok(store
        .get_employee(employee_id)
        .await?
        .is_some_and(|e| e.manager_emp_id == Some(manager)))
}

pub async fn get_leave<S>(store: &S, actor: &Actor, leave_id: i64) -> Result<LeaveWithSegments, AppError>
where
    S: LeaveStore + DirectoryStore + ?Sized,
{
    let leave = store
        .get_leave(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave application"))?;
    let applicant = leave.application.employee_id;
    if actor.is_hr_or_admin()
        || actor.is_employee(applicant)
        || is_manager_of(store, actor, applicant).await?
    {
        return Ok(leave);
    }
    Err(AppError::Forbidden("You cannot view this leave application"))
}

pub async fn my_leaves<S>(
    store: &S,
    actor: &Actor,
    status: Option<LeaveStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<LeaveApplication>, i64), AppError>
where
    S: LeaveStore + ?Sized,
{
    let employee_id = actor.employee_id()?;
    store
        .list_leaves(&LeaveQuery {
            employee_id: Some(employee_id),
            status,
            limit,
            offset,
        })
        .await
}

/// Reviewing applications waiting for the caller as direct manager.
pub async fn approval_tasks<S>(store: &S, actor: &Actor) -> Result<Vec<LeaveApplication>, AppError>
where
    S: LeaveStore + ?Sized,
{
    let manager = actor.employee_id()?;
    store.reviewing_for_manager(manager).await
}

pub async fn list_leaves<S>(
    store: &S,
    actor: &Actor,
    query: &LeaveQuery,
) -> Result<(Vec<LeaveApplication>, i64), AppError>
where
    S: LeaveStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    store.list_leaves(query).await
}

pub async fn set_policy<S>(store: &S, actor: &Actor, policy: LeavePolicy) -> Result<LeavePolicy, AppError>
where
    S: LeaveStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    if !policy.max_days.is_finite() || policy.max_days < 0.0 {
        return Err(AppError::Validation(
            "max_days must be zero (unlimited) or positive".to_string(),
        ));
    }
    store.upsert_leave_policy(&policy).await?;
    info!(leave_type = %policy.leave_type, max_days = policy.max_days, "Leave policy updated");
    Ok(policy)
}
