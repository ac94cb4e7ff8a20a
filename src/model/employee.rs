use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmployeeStatus {
    Probation,
    Active,
    Resigned,
    Suspended,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "emp_code": "EMP-001",
        "emp_name": "John Doe",
        "email": "john.doe@company.com",
        "org_id": 10,
        "manager_emp_id": null,
        "emp_status": "active",
        "hire_date": "2024-01-01"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "EMP-001")]
    pub emp_code: String,

    #[schema(example = "John Doe")]
    pub emp_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = 10)]
    pub org_id: i64,

    /// direct manager, approves this employee's leave
    #[schema(example = 3, nullable = true)]
    pub manager_emp_id: Option<i64>,

    pub emp_status: EmployeeStatus,

    #[schema(example = "2024-01-01")]
    pub hire_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "EMP-002")]
    pub emp_code: String,
    #[schema(example = "Jane Roe")]
    pub emp_name: String,
    #[schema(example = "jane@company.com", format = "email")]
    pub email: String,
    #[schema(example = 1)]
    pub org_id: i64,
    #[schema(example = 1)]
    pub manager_emp_id: Option<i64>,
    #[schema(example = "2026-01-01")]
    pub hire_date: NaiveDate,
}
