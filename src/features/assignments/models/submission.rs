use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Submission status, stored as SMALLINT
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
    sqlx::Type,
)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    NotGiven = 0,
    Pending = 1,
    Submitted = 2,
    Approved = 3,
    Rejected = 4,
}

impl SubmissionStatus {
    /// Whether `self -> next` is a legal step of the submission lifecycle.
    ///
    /// `Rejected -> Pending` is the deadline extension granted by an approver.
    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, next),
            (NotGiven, Pending)
                | (Pending, Submitted)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Rejected, Pending)
        )
    }

    /// Created but not yet handed to the recipient. The only state the
    /// distribution pipeline moves forward (to `Pending`).
    pub fn awaits_release(self) -> bool {
        self == SubmissionStatus::NotGiven
    }

    /// Initial status of a recipient's submission
    pub fn initial(is_given: bool) -> Self {
        if is_given {
            SubmissionStatus::Pending
        } else {
            SubmissionStatus::NotGiven
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::NotGiven => write!(f, "not_given"),
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Submitted => write!(f, "submitted"),
            SubmissionStatus::Approved => write!(f, "approved"),
            SubmissionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Database model for one recipient's working copy of an assignment
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Submission {
    pub id: i64,
    pub report_assignment_id: i64,
    pub submitted_by: i64,
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    /// Report content, opaque to the distribution engine
    pub fields: Option<serde_json::Value>,
    pub date_submitted: Option<DateTime<Utc>>,
}
