use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::error::StoreError;
use crate::features::assignments::engine::{Actor, CoordinatorOwnershipResolver};
use crate::features::assignments::services::AssignmentHistory;

/// Ownership oracle backed by assignment history.
///
/// A candidate owns a (category, sub-category) obligation when any assignment
/// they received, or any assignment the actor authored, for that pair records
/// them as `coordinator_user_id`. Lookups run under a timeout and every
/// failure counts as "not owning".
pub struct HistoryOwnershipResolver {
    history: Arc<dyn AssignmentHistory>,
    timeout: Duration,
}

impl HistoryOwnershipResolver {
    pub fn new(history: Arc<dyn AssignmentHistory>, timeout: Duration) -> Self {
        Self { history, timeout }
    }

    async fn owns(
        &self,
        candidate_id: i64,
        category_id: i64,
        sub_category_id: Option<i64>,
        actor: &Actor,
    ) -> Result<bool, StoreError> {
        let received = self.history.assignments_for_recipient(candidate_id).await?;
        let authored = self.history.assignments_given_by(actor.id).await?;

        Ok(received
            .iter()
            .chain(authored.iter())
            .filter(|a| a.matches_category(category_id, sub_category_id))
            .any(|a| a.coordinator_user_id == Some(candidate_id)))
    }
}

#[async_trait]
impl CoordinatorOwnershipResolver for HistoryOwnershipResolver {
    async fn resolve_ownership(
        &self,
        candidate_id: i64,
        category_id: i64,
        sub_category_id: Option<i64>,
        actor: &Actor,
    ) -> bool {
        let lookup = self.owns(candidate_id, category_id, sub_category_id, actor);
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(owns)) => owns,
            Ok(Err(e)) => {
                tracing::warn!(
                    "Ownership lookup for coordinator {} failed, treating as not owning: {}",
                    candidate_id,
                    e
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    "Ownership lookup for coordinator {} timed out after {:?}",
                    candidate_id,
                    self.timeout
                );
                false
            }
        }
    }
}
