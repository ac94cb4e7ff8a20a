use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::leave::LeaveStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid status transition: {from} cannot go to {to}")]
    InvalidTransition { from: LeaveStatus, to: LeaveStatus },

    #[error("Leave time overlaps a reviewing or approved leave; complete the old leave first")]
    Overlap,

    #[error("Attendance weight and leave weight must sum to 100 (got {attendance} + {leave})")]
    InvalidWeightConfig { attendance: i16, leave: i16 },

    #[error("Invalid shift: {0}")]
    InvalidShift(&'static str),

    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("No active check-in found for today")]
    NoActiveCheckIn,

    #[error("Cycle detected in organization hierarchy")]
    OrgCycle,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Corrupt {what} value in database: {value}")]
    CorruptRow { what: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidTransition { .. }
            | AppError::InvalidWeightConfig { .. }
            | AppError::InvalidShift(_)
            | AppError::AlreadyCheckedIn
            | AppError::NoActiveCheckIn
            | AppError::OrgCycle
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Overlap | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::CorruptRow { .. } | AppError::Config(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            return HttpResponse::build(status).json(json!({
                "message": "Something went wrong, Contact with system admin"
            }));
        }
        HttpResponse::build(status).json(json!({ "message": self.to_string() }))
    }
}
