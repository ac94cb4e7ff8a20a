//! In-process store used by unit and HTTP tests. Every write takes one lock,
//! so checks and inserts are atomic the way the database constraints make
//! them atomic in `postgres`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{
    AttendanceStore, DirectoryStore, EmployeeQuery, LeaveQuery, LeaveStore, PerformanceStore,
    ShiftStore,
};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceShift, AttendanceStatus, NewShift};
use crate::model::employee::{Employee, EmployeeStatus, NewEmployee};
use crate::model::leave::{
    LeaveApplication, LeavePolicy, LeaveStatus, LeaveTimeSegment, LeaveType, LeaveWithSegments,
    NewLeave, NewSegment,
};
use crate::model::organization::{NewOrganization, OrgType, Organization};
use crate::model::performance::{
    CycleStatus, EvaluationStatus, NewCycle, PerformanceCycle, PerformanceEvaluation,
};
use crate::rules::org_tree::would_create_cycle;
use crate::rules::overlap::{TimeRange, find_conflict};

#[derive(Default)]
struct State {
    next_id: i64,
    policies: HashMap<LeaveType, LeavePolicy>,
    leaves: Vec<LeaveApplication>,
    segments: Vec<LeaveTimeSegment>,
    attendance: Vec<AttendanceRecord>,
    shifts: Vec<AttendanceShift>,
    cycles: Vec<PerformanceCycle>,
    evaluations: Vec<PerformanceEvaluation>,
    orgs: Vec<Organization>,
    employees: Vec<Employee>,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn employee_exists(&self, id: i64) -> bool {
        self.employees.iter().any(|e| e.id == id)
    }

    fn leave_with_segments(&self, app: &LeaveApplication) -> LeaveWithSegments {
        let mut segments: Vec<LeaveTimeSegment> = self
            .segments
            .iter()
            .filter(|s| s.leave_id == app.id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.start);
        LeaveWithSegments {
            application: app.clone(),
            segments,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

/// Ids created by [`MemoryStore::with_team`].
#[derive(Debug, Clone, Copy)]
pub struct Team {
    pub org_id: i64,
    pub manager: i64,
    pub member: i64,
    pub peer: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One organization with a manager and two direct reports.
    pub fn with_team() -> (Self, Team) {
        let store = Self::new();
        let team = {
            let mut state = store.lock();
            let org_id = state.id();
            state.orgs.push(Organization {
                id: org_id,
                org_code: "RND".to_string(),
                org_name: "Research".to_string(),
                org_type: OrgType::Department,
                parent_org_id: None,
                enabled: true,
            });
            let hire = |state: &mut State, code: &str, manager: Option<i64>| {
                let id = state.id();
                state.employees.push(Employee {
                    id,
                    emp_code: code.to_string(),
                    emp_name: code.to_lowercase(),
                    email: format!("{}@company.com", code.to_lowercase()),
                    org_id,
                    manager_emp_id: manager,
                    emp_status: EmployeeStatus::Active,
                    hire_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
                });
                id
            };
            let manager = hire(&mut *state, "MGR", None);
            let member = hire(&mut *state, "EMP1", Some(manager));
            let peer = hire(&mut *state, "EMP2", Some(manager));
            Team {
                org_id,
                manager,
                member,
                peer,
            }
        };
        (store, team)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn leave_policy(&self, leave_type: LeaveType) -> Result<Option<LeavePolicy>, AppError> {
        Ok(self.lock().policies.get(&leave_type).cloned())
    }

    async fn upsert_leave_policy(&self, policy: &LeavePolicy) -> Result<(), AppError> {
        self.lock().policies.insert(policy.leave_type, policy.clone());
        Ok(())
    }

    async fn insert_leave(
        &self,
        leave: &NewLeave,
        segments: &[NewSegment],
    ) -> Result<LeaveWithSegments, AppError> {
        let mut state = self.lock();
        if !state.employee_exists(leave.employee_id) {
            return Err(AppError::NotFound("Employee"));
        }
        let mine: Vec<&LeaveTimeSegment> = state
            .segments
            .iter()
            .filter(|s| s.employee_id == leave.employee_id)
            .collect();
        if segments
            .iter()
            .any(|seg| find_conflict(&seg.range, mine.iter().copied()).is_some())
        {
            return Err(AppError::Overlap);
        }

        let id = state.id();
        let application = LeaveApplication {
            id,
            employee_id: leave.employee_id,
            leave_type: leave.leave_type,
            status: LeaveStatus::Reviewing,
            reason: leave.reason.clone(),
            attachment_url: leave.attachment_url.clone(),
            total_days: leave.total_days,
            apply_time: Utc::now(),
            updated_by: None,
        };
        state.leaves.push(application.clone());
        for seg in segments {
            let seg_id = state.id();
            state.segments.push(LeaveTimeSegment {
                id: seg_id,
                leave_id: id,
                employee_id: leave.employee_id,
                start: seg.range.start,
                end: seg.range.end,
                days: seg.days,
                is_active: true,
            });
        }
        Ok(state.leave_with_segments(&application))
    }

    async fn get_leave(&self, id: i64) -> Result<Option<LeaveWithSegments>, AppError> {
        let state = self.lock();
        Ok(state
            .leaves
            .iter()
            .find(|l| l.id == id)
            .map(|l| state.leave_with_segments(l)))
    }

    async fn apply_transition(
        &self,
        id: i64,
        from: LeaveStatus,
        to: LeaveStatus,
        actor_user_id: i64,
    ) -> Result<bool, AppError> {
        let mut state = self.lock();
        let Some(app) = state.leaves.iter_mut().find(|l| l.id == id) else {
            return Ok(false);
        };
        if app.status != from {
            return Ok(false);
        }
        app.status = to;
        app.updated_by = Some(actor_user_id);
        let active = to.holds_segments();
        for seg in state.segments.iter_mut().filter(|s| s.leave_id == id) {
            seg.is_active = active;
        }
        Ok(true)
    }

    async fn list_leaves(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveApplication>, i64), AppError> {
        let state = self.lock();
        let mut matching: Vec<LeaveApplication> = state
            .leaves
            .iter()
            .filter(|l| query.employee_id.is_none_or(|e| l.employee_id == e))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.apply_time.cmp(&a.apply_time).then(b.id.cmp(&a.id)));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn reviewing_for_manager(
        &self,
        manager_emp_id: i64,
    ) -> Result<Vec<LeaveApplication>, AppError> {
        let state = self.lock();
        Ok(state
            .leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Reviewing)
            .filter(|l| {
                state
                    .employees
                    .iter()
                    .any(|e| e.id == l.employee_id && e.manager_emp_id == Some(manager_emp_id))
            })
            .cloned()
            .collect())
    }

    async fn taken_segments_between(
        &self,
        employee_id: i64,
        window: &TimeRange,
    ) -> Result<Vec<LeaveTimeSegment>, AppError> {
        let state = self.lock();
        Ok(state
            .segments
            .iter()
            .filter(|s| s.employee_id == employee_id && s.range().overlaps(window))
            .filter(|s| {
                state
                    .leaves
                    .iter()
                    .any(|l| l.id == s.leave_id && l.status.counts_as_taken())
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_check_in(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let mut state = self.lock();
        if let Some(rec) = state
            .attendance
            .iter_mut()
            .find(|r| r.employee_id == employee_id && r.date == date)
        {
            if rec.check_in.is_some() {
                return Ok(None);
            }
            rec.check_in = Some(at);
            if rec.status == AttendanceStatus::Normal {
                rec.status = status;
            }
            return Ok(Some(rec.clone()));
        }
        let id = state.id();
        let rec = AttendanceRecord {
            id,
            employee_id,
            date,
            check_in: Some(at),
            check_out: None,
            status,
        };
        state.attendance.push(rec.clone());
        Ok(Some(rec))
    }

    async fn record_check_out(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let mut state = self.lock();
        let Some(rec) = state.attendance.iter_mut().find(|r| {
            r.employee_id == employee_id
                && r.date == date
                && r.check_in.is_some()
                && r.check_out.is_none()
        }) else {
            return Ok(None);
        };
        rec.check_out = Some(at);
        if rec.status == AttendanceStatus::Normal {
            rec.status = status;
        }
        Ok(Some(rec.clone()))
    }

    async fn upsert_attendance_status(
        &self,
        employee_id: i64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let mut state = self.lock();
        if !state.employee_exists(employee_id) {
            return Err(AppError::NotFound("Employee"));
        }
        if let Some(rec) = state
            .attendance
            .iter_mut()
            .find(|r| r.employee_id == employee_id && r.date == date)
        {
            rec.status = status;
            return Ok(rec.clone());
        }
        let id = state.id();
        let rec = AttendanceRecord {
            id,
            employee_id,
            date,
            check_in: None,
            check_out: None,
            status,
        };
        state.attendance.push(rec.clone());
        Ok(rec)
    }

    async fn attendance_between(
        &self,
        employee_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut records: Vec<AttendanceRecord> = self
            .lock()
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

#[async_trait]
impl ShiftStore for MemoryStore {
    async fn create_shift(
        &self,
        shift: &NewShift,
        created_by: i64,
    ) -> Result<AttendanceShift, AppError> {
        let mut state = self.lock();
        let id = state.id();
        let version = state.shifts.iter().map(|s| s.version).max().unwrap_or(0) + 1;
        let created = AttendanceShift {
            id,
            version,
            shift_name: shift.shift_name.clone(),
            windows: shift.windows(),
            is_active: false,
            created_by,
            created_at: Utc::now(),
        };
        state.shifts.push(created.clone());
        Ok(created)
    }

    async fn activate_shift(&self, id: i64) -> Result<Option<AttendanceShift>, AppError> {
        let mut state = self.lock();
        if !state.shifts.iter().any(|s| s.id == id) {
            return Ok(None);
        }
        for shift in state.shifts.iter_mut() {
            shift.is_active = shift.id == id;
        }
        Ok(state.shifts.iter().find(|s| s.id == id).cloned())
    }

    async fn active_shift(&self) -> Result<Option<AttendanceShift>, AppError> {
        Ok(self.lock().shifts.iter().find(|s| s.is_active).cloned())
    }

    async fn list_shifts(&self) -> Result<Vec<AttendanceShift>, AppError> {
        let mut shifts = self.lock().shifts.clone();
        shifts.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(shifts)
    }
}

#[async_trait]
impl PerformanceStore for MemoryStore {
    async fn insert_cycle(&self, cycle: &NewCycle) -> Result<PerformanceCycle, AppError> {
        let mut state = self.lock();
        let id = state.id();
        let created = PerformanceCycle {
            id,
            cycle_name: cycle.cycle_name.clone(),
            cycle_type: cycle.cycle_type,
            start_time: cycle.start_time,
            end_time: cycle.end_time,
            attendance_weight: cycle.attendance_weight,
            leave_weight: cycle.leave_weight,
            status: CycleStatus::NotStarted,
        };
        state.cycles.push(created.clone());
        Ok(created)
    }

    async fn get_cycle(&self, id: i64) -> Result<Option<PerformanceCycle>, AppError> {
        Ok(self.lock().cycles.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_evaluation(
        &self,
        cycle_id: i64,
        employee_id: i64,
    ) -> Result<PerformanceEvaluation, AppError> {
        let mut state = self.lock();
        if !state.employee_exists(employee_id) || !state.cycles.iter().any(|c| c.id == cycle_id) {
            return Err(AppError::NotFound("Employee"));
        }
        if state
            .evaluations
            .iter()
            .any(|e| e.cycle_id == cycle_id && e.employee_id == employee_id)
        {
            return Err(AppError::Conflict(
                "Evaluation already exists for this employee and cycle",
            ));
        }
        let id = state.id();
        let created = PerformanceEvaluation {
            id,
            cycle_id,
            employee_id,
            attendance_rate: None,
            leave_rate: None,
            rule_score: None,
            final_score: None,
            evaluation_status: EvaluationStatus::NotStarted,
        };
        state.evaluations.push(created.clone());
        Ok(created)
    }

    async fn get_evaluation(&self, id: i64) -> Result<Option<PerformanceEvaluation>, AppError> {
        Ok(self.lock().evaluations.iter().find(|e| e.id == id).cloned())
    }

    async fn evaluations_for_cycle(
        &self,
        cycle_id: i64,
    ) -> Result<Vec<PerformanceEvaluation>, AppError> {
        let mut evaluations: Vec<PerformanceEvaluation> = self
            .lock()
            .evaluations
            .iter()
            .filter(|e| e.cycle_id == cycle_id)
            .cloned()
            .collect();
        evaluations.sort_by_key(|e| e.employee_id);
        Ok(evaluations)
    }

    async fn evaluations_overlapping(
        &self,
        employee_id: i64,
        window: &TimeRange,
    ) -> Result<Vec<PerformanceEvaluation>, AppError> {
        let state = self.lock();
        Ok(state
            .evaluations
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .filter(|e| {
                state
                    .cycles
                    .iter()
                    .any(|c| c.id == e.cycle_id && c.window().overlaps(window))
            })
            .cloned()
            .collect())
    }

    async fn save_metrics(
        &self,
        evaluation_id: i64,
        attendance_rate: Option<f64>,
        leave_rate: Option<f64>,
        rule_score: Option<f64>,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        if let Some(ev) = state.evaluations.iter_mut().find(|e| e.id == evaluation_id) {
            ev.attendance_rate = attendance_rate;
            ev.leave_rate = leave_rate;
            ev.rule_score = rule_score;
        }
        Ok(())
    }

    async fn set_final_score(&self, evaluation_id: i64, score: f64) -> Result<bool, AppError> {
        let mut state = self.lock();
        match state.evaluations.iter_mut().find(|e| e.id == evaluation_id) {
            Some(ev) => {
                ev.final_score = Some(score);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_org(&self, org: &NewOrganization) -> Result<Organization, AppError> {
        let mut state = self.lock();
        if state.orgs.iter().any(|o| o.org_code == org.org_code) {
            return Err(AppError::Conflict("Organization code already exists"));
        }
        if let Some(parent) = org.parent_org_id {
            if !state.orgs.iter().any(|o| o.id == parent) {
                return Err(AppError::NotFound("Parent organization"));
            }
        }
        let id = state.id();
        let created = Organization {
            id,
            org_code: org.org_code.clone(),
            org_name: org.org_name.clone(),
            org_type: org.org_type,
            parent_org_id: org.parent_org_id,
            enabled: true,
        };
        state.orgs.push(created.clone());
        Ok(created)
    }

    async fn list_orgs(&self) -> Result<Vec<Organization>, AppError> {
        let mut orgs = self.lock().orgs.clone();
        orgs.sort_by(|a, b| a.org_code.cmp(&b.org_code));
        Ok(orgs)
    }

    async fn org_parents(&self) -> Result<HashMap<i64, Option<i64>>, AppError> {
        Ok(self
            .lock()
            .orgs
            .iter()
            .map(|o| (o.id, o.parent_org_id))
            .collect())
    }

    async fn set_org_parent(&self, id: i64, parent: Option<i64>) -> Result<bool, AppError> {
        let mut state = self.lock();
        if let Some(parent) = parent {
            if !state.orgs.iter().any(|o| o.id == parent) {
                return Err(AppError::NotFound("Parent organization"));
            }
            let parents: HashMap<i64, Option<i64>> =
                state.orgs.iter().map(|o| (o.id, o.parent_org_id)).collect();
            if would_create_cycle(id, parent, &parents) {
                return Err(AppError::OrgCycle);
            }
        }
        match state.orgs.iter_mut().find(|o| o.id == id) {
            Some(org) => {
                org.parent_org_id = parent;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, AppError> {
        let mut state = self.lock();
        if state
            .employees
            .iter()
            .any(|e| e.emp_code == employee.emp_code || e.email == employee.email)
        {
            return Err(AppError::Conflict("Employee code or email already exists"));
        }
        let org_ok = state.orgs.iter().any(|o| o.id == employee.org_id);
        let manager_ok = employee
            .manager_emp_id
            .is_none_or(|m| state.employee_exists(m));
        if !org_ok || !manager_ok {
            return Err(AppError::NotFound("Organization or manager"));
        }
        let id = state.id();
        let created = Employee {
            id,
            emp_code: employee.emp_code.clone(),
            emp_name: employee.emp_name.clone(),
            email: employee.email.clone(),
            org_id: employee.org_id,
            manager_emp_id: employee.manager_emp_id,
            emp_status: EmployeeStatus::Probation,
            hire_date: employee.hire_date,
        };
        state.employees.push(created.clone());
        Ok(created)
    }

    async fn get_employee(&self, id: i64) -> Result<Option<Employee>, AppError> {
        Ok(self.lock().employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_employees(
        &self,
        query: &EmployeeQuery,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        let state = self.lock();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<Employee> = state
            .employees
            .iter()
            .filter(|e| query.org_id.is_none_or(|o| e.org_id == o))
            .filter(|e| query.manager_emp_id.is_none_or(|m| e.manager_emp_id == Some(m)))
            .filter(|e| {
                needle.as_ref().is_none_or(|n| {
                    e.emp_name.to_lowercase().contains(n)
                        || e.email.to_lowercase().contains(n)
                        || e.emp_code.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn leave(employee_id: i64) -> NewLeave {
        NewLeave {
            employee_id,
            leave_type: LeaveType::Personal,
            reason: None,
            attachment_url: None,
            total_days: 1.0,
        }
    }

    fn seg(start: DateTime<Utc>, end: DateTime<Utc>) -> NewSegment {
        let range = TimeRange::new(start, end).unwrap();
        NewSegment {
            range,
            days: range.days(),
        }
    }

    #[actix_web::test]
    async fn concurrent_overlapping_submissions_admit_one() {
        let (store, team) = MemoryStore::with_team();
        let a = [seg(at(2, 9), at(3, 18))];
        let b = [seg(at(3, 9), at(4, 18))];
        let la = leave(team.member);
        let lb = leave(team.member);
        let (ra, rb) = futures::join!(store.insert_leave(&la, &a), store.insert_leave(&lb, &b));
        assert_eq!(
            [ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        assert!(matches!(rb, Err(AppError::Overlap)) || matches!(ra, Err(AppError::Overlap)));
    }

    #[actix_web::test]
    async fn failed_insert_writes_nothing() {
        let (store, team) = MemoryStore::with_team();
        store
            .insert_leave(&leave(team.member), &[seg(at(5, 9), at(5, 18))])
            .await
            .unwrap();
        // second segment collides, first one must not be stored either
        let err = store
            .insert_leave(
                &leave(team.member),
                &[seg(at(2, 9), at(2, 18)), seg(at(5, 12), at(5, 13))],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Overlap));
        let (all, total) = store
            .list_leaves(&LeaveQuery {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(all.len(), 1);
    }

    #[actix_web::test]
    async fn other_employees_do_not_conflict() {
        let (store, team) = MemoryStore::with_team();
        let range = [seg(at(2, 9), at(3, 18))];
        store.insert_leave(&leave(team.member), &range).await.unwrap();
        assert!(store.insert_leave(&leave(team.peer), &range).await.is_ok());
    }

    #[actix_web::test]
    async fn completed_leave_frees_its_range() {
        let (store, team) = MemoryStore::with_team();
        let range = [seg(at(2, 9), at(3, 18))];
        let created = store.insert_leave(&leave(team.member), &range).await.unwrap();
        let id = created.application.id;

        assert!(
            store
                .apply_transition(id, LeaveStatus::Reviewing, LeaveStatus::Approved, 7)
                .await
                .unwrap()
        );
        assert!(matches!(
            store.insert_leave(&leave(team.member), &range).await,
            Err(AppError::Overlap)
        ));

        assert!(
            store
                .apply_transition(id, LeaveStatus::Approved, LeaveStatus::Completed, 7)
                .await
                .unwrap()
        );
        let stored = store.get_leave(id).await.unwrap().unwrap();
        assert!(stored.segments.iter().all(|s| !s.is_active));
        assert!(store.insert_leave(&leave(team.member), &range).await.is_ok());
    }

    #[actix_web::test]
    async fn stale_transition_is_refused() {
        let (store, team) = MemoryStore::with_team();
        let created = store
            .insert_leave(&leave(team.member), &[seg(at(2, 9), at(2, 18))])
            .await
            .unwrap();
        let id = created.application.id;
        assert!(
            store
                .apply_transition(id, LeaveStatus::Reviewing, LeaveStatus::Approved, 1)
                .await
                .unwrap()
        );
        assert!(
            !store
                .apply_transition(id, LeaveStatus::Reviewing, LeaveStatus::Rejected, 2)
                .await
                .unwrap()
        );
    }

    #[actix_web::test]
    async fn reparenting_under_descendant_is_refused() {
        let store = MemoryStore::new();
        let new_org = |code: &str, parent| NewOrganization {
            org_code: code.to_string(),
            org_name: code.to_string(),
            org_type: OrgType::Team,
            parent_org_id: parent,
        };
        let root = store.insert_org(&new_org("A", None)).await.unwrap();
        let child = store.insert_org(&new_org("B", Some(root.id))).await.unwrap();
        assert!(matches!(
            store.set_org_parent(root.id, Some(child.id)).await,
            Err(AppError::OrgCycle)
        ));
        assert!(store.set_org_parent(child.id, None).await.unwrap());
    }

    #[actix_web::test]
    async fn active_segments_never_overlap() {
        let (store, team) = MemoryStore::with_team();
        let base = at(1, 0);
        let mut n = 0u32;
        // every start and length on a small grid, rejecting every third one
        for offset in (0..48).step_by(3) {
            for len in [1i64, 2, 5, 12, 30] {
                n += 1;
                let start = base + chrono::Duration::hours(offset);
                let end = start + chrono::Duration::hours(len);
                if let Ok(created) = store
                    .insert_leave(&leave(team.member), &[seg(start, end)])
                    .await
                {
                    if n % 3 == 0 {
                        let id = created.application.id;
                        store
                            .apply_transition(id, LeaveStatus::Reviewing, LeaveStatus::Rejected, 1)
                            .await
                            .unwrap();
                    }
                }
            }
        }

        let state = store.lock();
        let active: Vec<&LeaveTimeSegment> =
            state.segments.iter().filter(|s| s.is_active).collect();
        assert!(active.len() > 1);
        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                assert!(!a.range().overlaps(&b.range()));
            }
        }
    }
}
