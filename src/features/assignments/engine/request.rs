use chrono::NaiveDate;

use crate::features::auth::model::UserRole;
use crate::features::catalog::models::CategoryProfile;
use crate::features::roster::models::RecipientRole;

/// The user performing a distribution action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: UserRole,
}

/// A classified recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    pub id: i64,
    pub role: RecipientRole,
}

/// Author-supplied fields shared by every assignment of one action
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDetails {
    /// `None` means "derive from the catalog"
    pub title: Option<String>,
    pub instruction: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub allow_late: bool,
    pub max_submission_count: Option<i32>,
    pub is_given: bool,
    pub year_id: i64,
    pub quarter: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRef {
    pub id: i64,
    pub name: String,
}

/// Existing assignment(s) a distribution hangs under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorBatch {
    /// The assignment the user opened
    pub primary_id: i64,
    /// The primary plus its per-subject siblings, as (subject_id, assignment_id)
    pub members: Vec<(Option<i64>, i64)>,
}

impl AncestorBatch {
    pub fn single(assignment_id: i64, subject_id: Option<i64>) -> Self {
        Self {
            primary_id: assignment_id,
            members: vec![(subject_id, assignment_id)],
        }
    }

    /// A subject-less ancestor is the parent of every per-subject child
    pub fn is_subject_less(&self) -> bool {
        self.members.iter().all(|(subject_id, _)| subject_id.is_none())
    }
}

/// Everything one "submit" action decided up front, built once and passed
/// through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRequest {
    pub actor: Actor,
    pub recipients: Vec<Recipient>,
    pub category: CategoryProfile,
    pub details: AssignmentDetails,
    pub grade_level_id: Option<i64>,
    pub subjects: Vec<SubjectRef>,
    pub ancestor: Option<AncestorBatch>,
    /// Outcome of the ownership check for non-own-obligation distributions
    pub coordinator_of_record: Option<i64>,
}

impl DistributionRequest {
    /// A coordinator creating their own quarterly obligation for a
    /// self-scoping category, as opposed to handing a report down.
    pub fn is_own_obligation(&self) -> bool {
        self.actor.role == UserRole::Coordinator
            && self.ancestor.is_none()
            && self.category.kind.is_self_scoping()
    }

    pub fn fans_out(&self) -> bool {
        self.category.kind.requires_subject_fan_out()
            && self.grade_level_id.is_some()
            && !self.subjects.is_empty()
    }
}
