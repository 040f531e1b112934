//! Coordinator-of-record decision.
//!
//! `coordinator_user_id` is only ever set when a principal hands a report to
//! exactly one coordinator and no teachers, and that coordinator already owns
//! the (category, sub-category) obligation. Everything else leaves it empty.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use super::request::{Actor, Recipient};
use crate::features::roster::models::RecipientRole;

/// Result of the pure pre-check, before any history is consulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipCheck {
    /// No coordinator among the recipients
    NotApplicable,
    /// Coordinators present but acting as terminal report filers
    ActingAsTeacher(Vec<i64>),
    /// Several coordinators and no teachers; never granted
    Ambiguous(Vec<i64>),
    /// Exactly one coordinator, no teachers, principal authority
    Candidate(i64),
}

pub fn decide_coordinator_of_record(actor: &Actor, recipients: &[Recipient]) -> OwnershipCheck {
    let coordinators: Vec<i64> = recipients
        .iter()
        .filter(|r| r.role == RecipientRole::Coordinator)
        .map(|r| r.id)
        .collect();
    let has_teacher = recipients.iter().any(|r| r.role == RecipientRole::Teacher);

    if coordinators.is_empty() {
        return OwnershipCheck::NotApplicable;
    }
    // Coordinator-to-coordinator distributions never produce ownership
    if !actor.role.has_principal_authority() || has_teacher {
        return OwnershipCheck::ActingAsTeacher(coordinators);
    }
    if coordinators.len() > 1 {
        return OwnershipCheck::Ambiguous(coordinators);
    }
    OwnershipCheck::Candidate(coordinators[0])
}

/// Observable ownership result reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OwnershipOutcome {
    NotApplicable,
    ActingAsTeacher {
        #[serde(rename = "coordinatorIds")]
        coordinator_ids: Vec<i64>,
    },
    Ambiguous {
        #[serde(rename = "coordinatorIds")]
        coordinator_ids: Vec<i64>,
    },
    Granted {
        #[serde(rename = "coordinatorId")]
        coordinator_id: i64,
    },
    Denied {
        #[serde(rename = "coordinatorId")]
        coordinator_id: i64,
    },
    /// A coordinator's own root obligation
    SelfOwned {
        #[serde(rename = "coordinatorId")]
        coordinator_id: i64,
    },
}

impl OwnershipOutcome {
    /// Value to store in `coordinator_user_id`
    pub fn coordinator_user_id(&self) -> Option<i64> {
        match self {
            OwnershipOutcome::Granted { coordinator_id }
            | OwnershipOutcome::SelfOwned { coordinator_id } => Some(*coordinator_id),
            _ => None,
        }
    }
}

/// Decides whether a candidate coordinator owns a reporting obligation.
///
/// Implementations must answer `false` on any lookup problem.
#[async_trait]
pub trait CoordinatorOwnershipResolver: Send + Sync {
    async fn resolve_ownership(
        &self,
        candidate_id: i64,
        category_id: i64,
        sub_category_id: Option<i64>,
        actor: &Actor,
    ) -> bool;
}

/// Run the pre-check and, for a single candidate, ask the resolver
pub async fn resolve_coordinator_of_record(
    resolver: &dyn CoordinatorOwnershipResolver,
    actor: &Actor,
    recipients: &[Recipient],
    category_id: i64,
    sub_category_id: Option<i64>,
) -> OwnershipOutcome {
    match decide_coordinator_of_record(actor, recipients) {
        OwnershipCheck::NotApplicable => OwnershipOutcome::NotApplicable,
        OwnershipCheck::ActingAsTeacher(coordinator_ids) => {
            OwnershipOutcome::ActingAsTeacher { coordinator_ids }
        }
        OwnershipCheck::Ambiguous(coordinator_ids) => {
            tracing::info!(
                "Ambiguous coordinator ownership for category {}: {:?}",
                category_id,
                coordinator_ids
            );
            OwnershipOutcome::Ambiguous { coordinator_ids }
        }
        OwnershipCheck::Candidate(coordinator_id) => {
            if resolver
                .resolve_ownership(coordinator_id, category_id, sub_category_id, actor)
                .await
            {
                OwnershipOutcome::Granted { coordinator_id }
            } else {
                OwnershipOutcome::Denied { coordinator_id }
            }
        }
    }
}
