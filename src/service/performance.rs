use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{Actor, non_blank};
use crate::error::AppError;
use crate::model::leave::LeaveWithSegments;
use crate::model::performance::{NewCycle, PerformanceCycle, PerformanceEvaluation};
use crate::rules::overlap::TimeRange;
use crate::rules::round_to;
use crate::rules::scoring::{
    AttendanceTally, RuleMetrics, Weights, compute_rule_score, count_weekdays, percent,
    prorated_leave_days,
};
use crate::store::{AttendanceStore, LeaveStore, PerformanceStore};

/// `pending` until the employee has attendance records in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Ready,
    Pending,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EvaluationReport {
    #[serde(flatten)]
    pub evaluation: PerformanceEvaluation,
    #[schema(example = 92.34)]
    pub attendance_rate_percent: Option<f64>,
    #[schema(example = 5.68)]
    pub leave_rate_percent: Option<f64>,
    pub data_status: DataStatus,
    /// inputs of the last computation, only present right after a refresh
    pub metrics: Option<RuleMetrics>,
}

impl EvaluationReport {
    fn new(evaluation: PerformanceEvaluation, metrics: Option<RuleMetrics>) -> Self {
        let data_status = if evaluation.attendance_rate.is_some() && evaluation.leave_rate.is_some()
        {
            DataStatus::Ready
        } else {
            DataStatus::Pending
        };
        Self {
            attendance_rate_percent: percent(evaluation.attendance_rate),
            leave_rate_percent: percent(evaluation.leave_rate),
            data_status,
            evaluation,
            metrics,
        }
    }
}

/// First and last local calendar dates covered by the cycle, both counted.
fn cycle_dates(cycle: &PerformanceCycle, offset: FixedOffset) -> (NaiveDate, NaiveDate) {
    let first = cycle.start_time.with_timezone(&offset).date_naive();
    let last = cycle.end_time.with_timezone(&offset).date_naive();
    (first, last)
}

pub async fn create_cycle<S>(store: &S, actor: &Actor, req: NewCycle) -> Result<PerformanceCycle, AppError>
where
    S: PerformanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let cycle_name = non_blank(&req.cycle_name, "cycle_name")?;
    TimeRange::new(req.start_time, req.end_time)?;
    Weights {
        attendance: req.attendance_weight,
        leave: req.leave_weight,
    }
    .validate()?;

    let cycle = store
        .insert_cycle(&NewCycle { cycle_name, ..req })
        .await?;
    info!(cycle_id = cycle.id, "Performance cycle created");
    Ok(cycle)
}

pub async fn get_cycle<S>(store: &S, id: i64) -> Result<PerformanceCycle, AppError>
where
    S: PerformanceStore + ?Sized,
{
    store
        .get_cycle(id)
        .await?
        .ok_or(AppError::NotFound("Performance cycle"))
}

/// Attendance and leave figures of one employee over a cycle.
pub async fn compute_metrics<S>(
    store: &S,
    employee_id: i64,
    cycle: &PerformanceCycle,
    offset: FixedOffset,
) -> Result<RuleMetrics, AppError>
where
    S: LeaveStore + AttendanceStore + ?Sized,
{
    let (first, last) = cycle_dates(cycle, offset);
    let expected_days = count_weekdays(first, last);

    let records = store.attendance_between(employee_id, first, last).await?;
    let tally = AttendanceTally::from_records(&records);

    let window = cycle.window();
    let segments = store.taken_segments_between(employee_id, &window).await?;
    let leave_days = prorated_leave_days(&segments, &window);

    Ok(RuleMetrics::derive(expected_days, tally, leave_days))
}

async fn recompute<S>(
    store: &S,
    mut evaluation: PerformanceEvaluation,
    cycle: &PerformanceCycle,
    offset: FixedOffset,
) -> Result<EvaluationReport, AppError>
where
    S: LeaveStore + AttendanceStore + PerformanceStore + ?Sized,
{
    let metrics = compute_metrics(store, evaluation.employee_id, cycle, offset).await?;
    let rule_score = compute_rule_score(metrics.attendance_rate, metrics.leave_rate, cycle.weights())
        .map(|score| round_to(score, 2));

    store
        .save_metrics(evaluation.id, metrics.attendance_rate, metrics.leave_rate, rule_score)
        .await?;

    if !metrics.has_data() {
        info!(
            evaluation_id = evaluation.id,
            employee_id = evaluation.employee_id,
            "No attendance data in cycle, rule score pending"
        );
    }

    evaluation.attendance_rate = metrics.attendance_rate;
    evaluation.leave_rate = metrics.leave_rate;
    evaluation.rule_score = rule_score;
    Ok(EvaluationReport::new(evaluation, Some(metrics)))
}

pub async fn create_evaluation<S>(
    store: &S,
    actor: &Actor,
    cycle_id: i64,
    employee_id: i64,
    offset: FixedOffset,
) -> Result<EvaluationReport, AppError>
where
    S: LeaveStore + AttendanceStore + PerformanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let cycle = get_cycle(store, cycle_id).await?;
    let evaluation = store.insert_evaluation(cycle.id, employee_id).await?;
    info!(evaluation_id = evaluation.id, cycle_id, employee_id, "Evaluation created");
    recompute(store, evaluation, &cycle, offset).await
}

/// Stored evaluation; visible to HR/Admin and to the evaluated employee.
pub async fn get_evaluation<S>(store: &S, actor: &Actor, id: i64) -> Result<EvaluationReport, AppError>
where
    S: PerformanceStore + ?Sized,
{
    let evaluation = store
        .get_evaluation(id)
        .await?
        .ok_or(AppError::NotFound("Evaluation"))?;
    if !actor.is_hr_or_admin() && !actor.is_employee(evaluation.employee_id) {
        return Err(AppError::Forbidden("You can only view your own evaluation"));
    }
    Ok(EvaluationReport::new(evaluation, None))
}

pub async fn refresh_evaluation<S>(
    store: &S,
    actor: &Actor,
    id: i64,
    offset: FixedOffset,
) -> Result<EvaluationReport, AppError>
where
    S: LeaveStore + AttendanceStore + PerformanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let evaluation = store
        .get_evaluation(id)
        .await?
        .ok_or(AppError::NotFound("Evaluation"))?;
    let cycle = get_cycle(store, evaluation.cycle_id).await?;
    recompute(store, evaluation, &cycle, offset).await
}

pub async fn refresh_cycle<S>(
    store: &S,
    actor: &Actor,
    cycle_id: i64,
    offset: FixedOffset,
) -> Result<Vec<EvaluationReport>, AppError>
where
    S: LeaveStore + AttendanceStore + PerformanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    let cycle = get_cycle(store, cycle_id).await?;
    let evaluations = store.evaluations_for_cycle(cycle_id).await?;

    let mut reports = Vec::with_capacity(evaluations.len());
    for evaluation in evaluations {
        reports.push(recompute(store, evaluation, &cycle, offset).await?);
    }
    info!(cycle_id, refreshed = reports.len(), "Cycle evaluations refreshed");
    Ok(reports)
}

pub async fn cycle_evaluations<S>(
    store: &S,
    actor: &Actor,
    cycle_id: i64,
) -> Result<Vec<EvaluationReport>, AppError>
where
    S: PerformanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    get_cycle(store, cycle_id).await?;
    let evaluations = store.evaluations_for_cycle(cycle_id).await?;
    Ok(evaluations
        .into_iter()
        .map(|e| EvaluationReport::new(e, None))
        .collect())
}

/// Recomputes every evaluation of the applicant whose cycle intersects the
/// leave. Returns how many were refreshed.
pub async fn refresh_for_leave<S>(
    store: &S,
    leave: &LeaveWithSegments,
    offset: FixedOffset,
) -> Result<usize, AppError>
where
    S: LeaveStore + AttendanceStore + PerformanceStore + ?Sized,
{
    let start = leave.segments.iter().map(|s| s.start).min();
    let end = leave.segments.iter().map(|s| s.end).max();
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(0);
    };
    let span = TimeRange::new(start, end)?;

    let employee_id = leave.application.employee_id;
    let evaluations = store.evaluations_overlapping(employee_id, &span).await?;
    let mut refreshed = 0;
    for evaluation in evaluations {
        let Some(cycle) = store.get_cycle(evaluation.cycle_id).await? else {
            warn!(evaluation_id = evaluation.id, "Evaluation points at a missing cycle");
            continue;
        };
        recompute(store, evaluation, &cycle, offset).await?;
        refreshed += 1;
    }
    Ok(refreshed)
}

pub async fn set_final_score<S>(
    store: &S,
    actor: &Actor,
    id: i64,
    score: f64,
) -> Result<EvaluationReport, AppError>
where
    S: PerformanceStore + ?Sized,
{
    actor.require_hr_or_admin()?;
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(AppError::Validation(
            "final_score must be between 0 and 100".to_string(),
        ));
    }
    let score = round_to(score, 2);
    if !store.set_final_score(id, score).await? {
        return Err(AppError::NotFound("Evaluation"));
    }
    info!(evaluation_id = id, score, user_id = actor.user_id, "Final score set");

    let evaluation = store
        .get_evaluation(id)
        .await?
        .ok_or(AppError::NotFound("Evaluation"))?;
    Ok(EvaluationReport::new(evaluation, None))
}
