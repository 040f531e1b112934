use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a report assignment
///
/// One row per "this report, for this quarter/year, assigned by X to a set
/// of recipients". Recipients are the submitters of its submissions.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ReportAssignment {
    pub id: i64,
    pub category_id: i64,
    pub sub_category_id: Option<i64>,
    pub given_by: i64,
    pub coordinator_user_id: Option<i64>,
    pub parent_report_assignment_id: Option<i64>,
    pub title: String,
    pub instruction: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub allow_late: bool,
    /// `None` means unlimited
    pub max_submission_count: Option<i32>,
    pub is_given: bool,
    pub is_archived: bool,
    pub year_id: i64,
    pub quarter: i16,
    pub grade_level_id: Option<i64>,
    pub subject_id: Option<i64>,
    /// Shared by every row one fan-out wrote in the same batch
    pub distribution_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportAssignment {
    pub fn is_root(&self) -> bool {
        self.parent_report_assignment_id.is_none()
    }

    pub fn matches_category(&self, category_id: i64, sub_category_id: Option<i64>) -> bool {
        self.category_id == category_id && self.sub_category_id == sub_category_id
    }
}

/// Data for creating a new report assignment
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    pub category_id: i64,
    pub sub_category_id: Option<i64>,
    pub given_by: i64,
    pub coordinator_user_id: Option<i64>,
    pub parent_report_assignment_id: Option<i64>,
    pub title: String,
    pub instruction: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub allow_late: bool,
    pub max_submission_count: Option<i32>,
    pub is_given: bool,
    pub year_id: i64,
    pub quarter: i16,
    pub grade_level_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub distribution_batch_id: Option<Uuid>,
}

/// In-place changes to an existing assignment; `None` leaves a column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentPatch {
    pub title: Option<String>,
    pub instruction: Option<Option<String>>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub allow_late: Option<bool>,
    pub max_submission_count: Option<Option<i32>>,
    pub is_given: Option<bool>,
    pub coordinator_user_id: Option<Option<i64>>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == AssignmentPatch::default()
    }

    pub fn apply_to(&self, assignment: &mut ReportAssignment) {
        if let Some(title) = &self.title {
            assignment.title = title.clone();
        }
        if let Some(instruction) = &self.instruction {
            assignment.instruction = instruction.clone();
        }
        if let Some(from_date) = self.from_date {
            assignment.from_date = from_date;
        }
        if let Some(to_date) = self.to_date {
            assignment.to_date = to_date;
        }
        if let Some(allow_late) = self.allow_late {
            assignment.allow_late = allow_late;
        }
        if let Some(max) = self.max_submission_count {
            assignment.max_submission_count = max;
        }
        if let Some(is_given) = self.is_given {
            assignment.is_given = is_given;
        }
        if let Some(coordinator) = self.coordinator_user_id {
            assignment.coordinator_user_id = coordinator;
        }
    }
}
