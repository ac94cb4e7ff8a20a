//! Use cases behind the HTTP handlers. Each function takes the store it
//! needs and the acting user, checks permissions and rules, then writes.

use crate::error::AppError;
use crate::model::role::Role;

pub mod attendance;
pub mod leave;
pub mod organization;
pub mod performance;

/// The caller as the rules see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
    /// linked employee record, absent for pure admin accounts
    pub employee_id: Option<i64>,
}

impl Actor {
    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only"))
        }
    }

    pub fn employee_id(&self) -> Result<i64, AppError> {
        self.employee_id
            .ok_or(AppError::Forbidden("No employee profile"))
    }

    pub fn is_employee(&self, employee_id: i64) -> bool {
        self.employee_id == Some(employee_id)
    }
}

pub(crate) fn non_blank(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
