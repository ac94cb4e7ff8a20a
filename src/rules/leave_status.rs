use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave::LeaveStatus;

/// What a user can do to a leave application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaveAction {
    Approve,
    Reject,
    Complete,
}

impl LeaveAction {
    pub fn target(self) -> LeaveStatus {
        match self {
            LeaveAction::Approve => LeaveStatus::Approved,
            LeaveAction::Reject => LeaveStatus::Rejected,
            LeaveAction::Complete => LeaveStatus::Completed,
        }
    }
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Rejected | LeaveStatus::Completed)
    }

    /// Segments of a leave in this status take part in the overlap guard.
    pub fn holds_segments(self) -> bool {
        matches!(self, LeaveStatus::Reviewing | LeaveStatus::Approved)
    }

    /// Leave days in this status count against the leave rate.
    pub fn counts_as_taken(self) -> bool {
        self == LeaveStatus::Approved
    }

    pub fn can_transition_to(self, to: LeaveStatus) -> bool {
        matches!(
            (self, to),
            (LeaveStatus::Reviewing, LeaveStatus::Approved)
                | (LeaveStatus::Reviewing, LeaveStatus::Rejected)
                | (LeaveStatus::Approved, LeaveStatus::Completed)
        )
    }

    pub fn transition(self, to: LeaveStatus) -> Result<LeaveStatus, AppError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AppError::InvalidTransition { from: self, to })
        }
    }
}
