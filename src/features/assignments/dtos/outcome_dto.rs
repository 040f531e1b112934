use serde::Serialize;
use utoipa::ToSchema;

use crate::features::assignments::engine::{OwnershipOutcome, RouteDecision, SpecBatch};

/// Per-assignment result of a distribution action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpecState {
    Succeeded,
    /// Created, but the parent link is missing
    PartiallyLinked,
    Failed,
}

/// Overall result of a distribution action, one terminal message per action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Succeeded,
    /// Everything created and linked; some submissions could not be synchronized
    SucceededWithWarnings,
    CreatedNotFullyLinked,
    PartiallyFailed,
    Failed,
}

impl DistributionStatus {
    pub fn summarize(specs: &[SpecOutcomeDto], has_sync_warnings: bool) -> Self {
        let failed = specs.iter().filter(|s| s.state == SpecState::Failed).count();
        let unlinked = specs
            .iter()
            .any(|s| s.state == SpecState::PartiallyLinked);

        if specs.is_empty() || failed == specs.len() {
            DistributionStatus::Failed
        } else if failed > 0 {
            DistributionStatus::PartiallyFailed
        } else if unlinked {
            DistributionStatus::CreatedNotFullyLinked
        } else if has_sync_warnings {
            DistributionStatus::SucceededWithWarnings
        } else {
            DistributionStatus::Succeeded
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DistributionStatus::Succeeded => "Report assignment distributed",
            DistributionStatus::SucceededWithWarnings => {
                "Report assignment distributed with warnings"
            }
            DistributionStatus::CreatedNotFullyLinked => {
                "Report assignment created but not fully linked"
            }
            DistributionStatus::PartiallyFailed => "Some report assignments could not be created",
            DistributionStatus::Failed => "Report assignment could not be created",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecOutcomeDto {
    pub batch: SpecBatch,
    pub subject_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub recipients: Vec<i64>,
    pub state: SpecState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Aggregate result of a create/distribute action
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionOutcomeDto {
    pub status: DistributionStatus,
    pub ownership: OwnershipOutcome,
    pub assignments: Vec<SpecOutcomeDto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
impl DistributionOutcomeDto {
    pub fn created_ids(&self) -> Vec<i64> {
        self.assignments
            .iter()
            .filter_map(|s| s.assignment_id)
            .collect()
    }
}

/// Result of an in-place edit
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcomeDto {
    pub assignment_id: i64,
    pub status: DistributionStatus,
    /// Present when the recipient change re-ran the ownership check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipOutcome>,
    pub added_recipients: Vec<i64>,
    pub removed_recipients: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of the form submit endpoint: the router's decision and what it did
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcomeDto {
    pub decision: RouteDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DistributionOutcomeDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<UpdateOutcomeDto>,
}

impl SubmitOutcomeDto {
    pub fn status(&self) -> DistributionStatus {
        self.created
            .as_ref()
            .map(|c| c.status)
            .or_else(|| self.updated.as_ref().map(|u| u.status))
            .unwrap_or(DistributionStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(state: SpecState) -> SpecOutcomeDto {
        SpecOutcomeDto {
            batch: SpecBatch::Root,
            subject_id: None,
            assignment_id: (state != SpecState::Failed).then_some(1),
            parent_id: None,
            recipients: vec![10],
            state,
            errors: vec![],
        }
    }

    #[test]
    fn test_summarize() {
        use SpecState::*;
        assert_eq!(
            DistributionStatus::summarize(&[spec(Succeeded)], false),
            DistributionStatus::Succeeded
        );
        assert_eq!(
            DistributionStatus::summarize(&[spec(Succeeded)], true),
            DistributionStatus::SucceededWithWarnings
        );
        assert_eq!(
            DistributionStatus::summarize(&[spec(Succeeded), spec(PartiallyLinked)], true),
            DistributionStatus::CreatedNotFullyLinked
        );
        assert_eq!(
            DistributionStatus::summarize(&[spec(PartiallyLinked), spec(Failed)], false),
            DistributionStatus::PartiallyFailed
        );
        assert_eq!(
            DistributionStatus::summarize(&[spec(Failed), spec(Failed)], false),
            DistributionStatus::Failed
        );
    }
}
