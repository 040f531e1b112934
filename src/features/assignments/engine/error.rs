use thiserror::Error;

use crate::core::error::{AppError, StoreError};
use crate::features::roster::models::UnknownUser;

#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("No recipients left after removing the assigner")]
    EmptyRecipients,

    #[error(transparent)]
    UnknownUser(#[from] UnknownUser),

    #[error("Fan-out mismatch: {parents} parent assignment(s) against {children} child assignment(s)")]
    FanOutMismatch { parents: usize, children: usize },

    #[error("No parent assignment for subject {subject_id:?}")]
    UnpairedSubject { subject_id: Option<i64> },

    #[error("Failed to link assignment {child_id} to parent {parent_id}: {reason}")]
    LinkFailure {
        child_id: i64,
        parent_id: i64,
        reason: String,
    },

    #[error("Failed to synchronize submission of user {recipient_id} on assignment {assignment_id}: {reason}")]
    SynchronizationFailure {
        assignment_id: i64,
        recipient_id: i64,
        reason: String,
    },

    #[error("Report assignment {0} not found")]
    AssignmentNotFound(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DistributionError> for AppError {
    fn from(err: DistributionError) -> Self {
        match err {
            DistributionError::EmptyRecipients | DistributionError::UnknownUser(_) => {
                AppError::Validation(err.to_string())
            }
            DistributionError::FanOutMismatch { .. } | DistributionError::UnpairedSubject { .. } => {
                AppError::Conflict(err.to_string())
            }
            DistributionError::AssignmentNotFound(_) => AppError::NotFound(err.to_string()),
            DistributionError::Forbidden(msg) => AppError::Forbidden(msg),
            DistributionError::InvalidRequest(msg) => AppError::BadRequest(msg),
            DistributionError::Store(e) => e.into(),
            DistributionError::LinkFailure { .. }
            | DistributionError::SynchronizationFailure { .. } => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
