use crate::api::attendance::{RecordAttendance, RecordsQuery};
use crate::api::employee::{EmployeeFilter, EmployeeListResponse};
use crate::api::leave::{LeaveFilter, LeaveListResponse, MyLeaveFilter};
use crate::api::organization::MoveOrganization;
use crate::api::performance::{FinalScore, NewEvaluation};
use crate::model::attendance::{AttendanceRecord, AttendanceShift, AttendanceStatus, NewShift};
use crate::model::employee::{Employee, EmployeeStatus, NewEmployee};
use crate::model::leave::{
    LeaveApplication, LeavePolicy, LeaveStatus, LeaveTimeSegment, LeaveType, LeaveWithSegments,
};
use crate::model::organization::{NewOrganization, OrgType, Organization};
use crate::model::performance::{
    CycleStatus, CycleType, EvaluationStatus, NewCycle, PerformanceCycle, PerformanceEvaluation,
};
use crate::rules::leave_status::LeaveAction;
use crate::rules::overlap::TimeRange;
use crate::rules::scoring::RuleMetrics;
use crate::rules::shift::ShiftWindows;
use crate::service::attendance::CurrentShift;
use crate::service::leave::SubmitLeave;
use crate::service::performance::{DataStatus, EvaluationReport};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Rules API",
        version = "1.0.0",
        description = r#"
## Human Resource Management (HRM) Rules Service

Enforces the business rules behind leave, attendance and performance data.

### 🔹 Key Features
- **Leave Management**
  - Multi-segment leave applications with overlap protection
  - Approval state machine: reviewing, approved, rejected, completed
- **Attendance Management**
  - Daily check-in and check-out judged against the active shift
  - Versioned shifts, one active at a time
- **Performance**
  - Evaluation cycles with weighted attendance and leave rates
- **Organization**
  - Organization tree without cycles, employees with direct managers

### 🔐 Security
Every endpoint is protected using **JWT Bearer authentication**.
Only **Admin** or **HR** can change policies, shifts, cycles and the organization.

### 📦 Response Format
- JSON-based RESTful responses
- Errors carry a `message` field
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::submit_leave,
        crate::api::leave::leave_list,
        crate::api::leave::my_leaves,
        crate::api::leave::approval_tasks,
        crate::api::leave::set_policy,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::complete_leave,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::monthly_records,
        crate::api::attendance::record_status,
        crate::api::attendance::list_shifts,
        crate::api::attendance::create_shift,
        crate::api::attendance::current_shift,
        crate::api::attendance::activate_shift,

        crate::api::performance::create_cycle,
        crate::api::performance::get_cycle,
        crate::api::performance::cycle_evaluations,
        crate::api::performance::refresh_cycle,
        crate::api::performance::create_evaluation,
        crate::api::performance::get_evaluation,
        crate::api::performance::refresh_evaluation,
        crate::api::performance::set_final_score,

        crate::api::organization::list_orgs,
        crate::api::organization::create_org,
        crate::api::organization::reparent,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees
    ),
    components(
        schemas(
            LeaveFilter,
            MyLeaveFilter,
            LeaveListResponse,
            SubmitLeave,
            TimeRange,
            LeaveAction,
            LeaveApplication,
            LeaveTimeSegment,
            LeaveWithSegments,
            LeavePolicy,
            LeaveStatus,
            LeaveType,
            RecordsQuery,
            RecordAttendance,
            AttendanceRecord,
            AttendanceShift,
            AttendanceStatus,
            NewShift,
            ShiftWindows,
            CurrentShift,
            NewCycle,
            PerformanceCycle,
            PerformanceEvaluation,
            CycleType,
            CycleStatus,
            EvaluationStatus,
            EvaluationReport,
            DataStatus,
            RuleMetrics,
            NewEvaluation,
            FinalScore,
            Organization,
            NewOrganization,
            OrgType,
            MoveOrganization,
            Employee,
            NewEmployee,
            EmployeeStatus,
            EmployeeFilter,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Performance", description = "Performance evaluation APIs"),
        (name = "Organization", description = "Organization tree APIs"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
