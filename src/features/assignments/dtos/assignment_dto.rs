use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::features::assignments::models::{
    AssignmentPatch, ReportAssignment, Submission, SubmissionStatus,
};

/// What the author asked for when submitting the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    Create,
    Edit,
    /// "Set as report to teachers": hand an existing assignment onward
    Distribute,
}

fn default_true() -> bool {
    true
}

/// Request DTO for the report assignment form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_submit_dates"))]
pub struct SubmitAssignmentDto {
    /// Omitted means the router decides from the editing id and the actor
    pub action: Option<SubmitAction>,

    /// The assignment the form was opened from, if any
    pub editing_assignment_id: Option<i64>,

    pub category_id: i64,
    pub sub_category_id: Option<i64>,

    #[serde(default)]
    pub recipient_ids: Vec<i64>,

    /// Defaults to the sub-category (or category) name
    #[validate(length(max = 255, message = "Title must not exceed 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Instruction must not exceed 5000 characters"))]
    pub instruction: Option<String>,

    pub from_date: NaiveDate,
    pub to_date: NaiveDate,

    #[serde(default)]
    pub allow_late: bool,

    /// Omitted means unlimited
    #[validate(range(min = 1, message = "Max submission count must be at least 1"))]
    pub max_submission_count: Option<i32>,

    #[serde(default = "default_true")]
    pub is_given: bool,

    pub year_id: i64,

    #[validate(range(min = 1, max = 4, message = "Quarter must be between 1 and 4"))]
    pub quarter: i16,

    pub grade_level_id: Option<i64>,

    #[serde(default)]
    pub subject_ids: Vec<i64>,
}

fn validate_submit_dates(dto: &SubmitAssignmentDto) -> Result<(), ValidationError> {
    check_date_range(Some(dto.from_date), Some(dto.to_date))
}

fn check_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ValidationError> {
    match (from, to) {
        (Some(from), Some(to)) if to < from => {
            let mut err = ValidationError::new("date_range");
            err.message = Some("To date must not be before from date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl SubmitAssignmentDto {
    /// Full replacement of the editable columns
    pub fn to_patch(&self) -> AssignmentPatch {
        AssignmentPatch {
            title: self
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
            instruction: Some(self.instruction.clone().filter(|i| !i.trim().is_empty())),
            from_date: Some(self.from_date),
            to_date: Some(self.to_date),
            allow_late: Some(self.allow_late),
            max_submission_count: Some(self.max_submission_count),
            is_given: Some(self.is_given),
            coordinator_user_id: None,
        }
    }
}

/// Request DTO for an explicit in-place edit; omitted fields stay as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_dates"))]
pub struct UpdateAssignmentDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// An empty string clears the instruction
    #[validate(length(max = 5000, message = "Instruction must not exceed 5000 characters"))]
    pub instruction: Option<String>,

    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub allow_late: Option<bool>,

    #[validate(range(min = 1, message = "Max submission count must be at least 1"))]
    pub max_submission_count: Option<i32>,

    pub is_given: Option<bool>,

    /// Replaces the recipient list when present
    pub recipient_ids: Option<Vec<i64>>,
}

fn validate_update_dates(dto: &UpdateAssignmentDto) -> Result<(), ValidationError> {
    check_date_range(dto.from_date, dto.to_date)
}

impl UpdateAssignmentDto {
    pub fn to_patch(&self) -> AssignmentPatch {
        AssignmentPatch {
            title: self.title.clone(),
            instruction: self
                .instruction
                .as_ref()
                .map(|i| Some(i.clone()).filter(|i| !i.trim().is_empty())),
            from_date: self.from_date,
            to_date: self.to_date,
            allow_late: self.allow_late,
            max_submission_count: self.max_submission_count.map(Some),
            is_given: self.is_given,
            coordinator_user_id: None,
        }
    }
}

/// Request DTO for handing an existing assignment onward.
///
/// Everything except the recipients is inherited from the assignment being
/// distributed unless overridden here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_distribute_dates"))]
pub struct DistributeAssignmentDto {
    #[validate(length(min = 1, message = "At least one recipient is required"))]
    pub recipient_ids: Vec<i64>,

    #[validate(length(max = 255, message = "Title must not exceed 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Instruction must not exceed 5000 characters"))]
    pub instruction: Option<String>,

    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub allow_late: Option<bool>,

    #[validate(range(min = 1, message = "Max submission count must be at least 1"))]
    pub max_submission_count: Option<i32>,

    pub is_given: Option<bool>,

    /// Subjects to fan out over; defaults to the ancestor's subject batch
    pub subject_ids: Option<Vec<i64>>,
}

fn validate_distribute_dates(dto: &DistributeAssignmentDto) -> Result<(), ValidationError> {
    check_date_range(dto.from_date, dto.to_date)
}

/// Request DTO for retrying a parent link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkParentDto {
    pub parent_id: i64,
}

/// Response DTO for a report assignment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponseDto {
    pub id: i64,
    pub category_id: i64,
    pub sub_category_id: Option<i64>,
    pub given_by: i64,
    pub coordinator_user_id: Option<i64>,
    pub parent_report_assignment_id: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReportAssignment> for AssignmentResponseDto {
    fn from(a: ReportAssignment) -> Self {
        Self {
            id: a.id,
            category_id: a.category_id,
            sub_category_id: a.sub_category_id,
            given_by: a.given_by,
            coordinator_user_id: a.coordinator_user_id,
            parent_report_assignment_id: a.parent_report_assignment_id,
            title: a.title,
            instruction: a.instruction,
            from_date: a.from_date,
            to_date: a.to_date,
            allow_late: a.allow_late,
            max_submission_count: a.max_submission_count,
            is_given: a.is_given,
            year_id: a.year_id,
            quarter: a.quarter,
            grade_level_id: a.grade_level_id,
            subject_id: a.subject_id,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    pub id: i64,
    pub submitted_by: i64,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub date_submitted: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionDto {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            submitted_by: s.submitted_by,
            status: s.status,
            rejection_reason: s.rejection_reason,
            date_submitted: s.date_submitted,
        }
    }
}

/// Response DTO for one assignment with its submissions and direct children
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetailDto {
    pub assignment: AssignmentResponseDto,
    pub submissions: Vec<SubmissionDto>,
    pub children: Vec<AssignmentResponseDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_json() -> serde_json::Value {
        serde_json::json!({
            "categoryId": 1,
            "recipientIds": [10, 11],
            "fromDate": "2025-01-06",
            "toDate": "2025-03-28",
            "yearId": 2025,
            "quarter": 1
        })
    }

    #[test]
    fn test_submit_defaults() {
        let dto: SubmitAssignmentDto = serde_json::from_value(submit_json()).unwrap();
        assert!(dto.is_given);
        assert!(!dto.allow_late);
        assert!(dto.subject_ids.is_empty());
        assert!(dto.action.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_submit_rejects_bad_quarter_and_dates() {
        let mut json = submit_json();
        json["quarter"] = serde_json::json!(5);
        let dto: SubmitAssignmentDto = serde_json::from_value(json).unwrap();
        assert!(dto.validate().is_err());

        let mut json = submit_json();
        json["toDate"] = serde_json::json!("2024-12-31");
        let dto: SubmitAssignmentDto = serde_json::from_value(json).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_submit_patch_replaces_everything() {
        let mut dto: SubmitAssignmentDto = serde_json::from_value(submit_json()).unwrap();
        dto.title = Some("  ".to_string());
        let patch = dto.to_patch();

        assert_eq!(patch.title, None);
        assert_eq!(patch.instruction, Some(None));
        assert_eq!(patch.max_submission_count, Some(None));
        assert_eq!(patch.is_given, Some(true));
        assert_eq!(patch.coordinator_user_id, None);
    }

    #[test]
    fn test_update_patch_only_touches_given_fields() {
        let dto = UpdateAssignmentDto {
            instruction: Some(String::new()),
            allow_late: Some(true),
            ..Default::default()
        };
        let patch = dto.to_patch();

        assert_eq!(patch.instruction, Some(None));
        assert_eq!(patch.allow_late, Some(true));
        assert_eq!(patch.title, None);
        assert_eq!(patch.from_date, None);
        assert!(UpdateAssignmentDto::default().to_patch().is_empty());
    }
}
