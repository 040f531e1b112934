use std::sync::Arc;

use uuid::Uuid;

use crate::features::assignments::engine::{
    pair_by_subject, AssignmentSpec, DistributionError, SpecBatch,
};
use crate::features::assignments::models::NewAssignment;
use crate::features::assignments::services::AssignmentStore;

/// Result of persisting one spec
#[derive(Debug)]
pub struct Materialized {
    pub result: Result<i64, String>,
}

impl Materialized {
    pub fn assignment_id(&self) -> Option<i64> {
        self.result.as_ref().ok().copied()
    }
}

/// One attempted parent link
#[derive(Debug)]
pub struct LinkAttempt {
    pub child_id: i64,
    pub parent_id: i64,
    pub result: Result<(), DistributionError>,
}

/// Persists assignment specs and links children to parents
pub struct AssignmentWriter {
    store: Arc<dyn AssignmentStore>,
}

impl AssignmentWriter {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    /// Create every spec in order. A failing spec is recorded and the rest
    /// still run; nothing already created is undone. Each spec batch is
    /// stamped with its own fresh batch id.
    pub async fn materialize(&self, specs: &[AssignmentSpec]) -> Vec<Materialized> {
        let mut batch_ids: Vec<(SpecBatch, Uuid)> = Vec::new();
        let mut created = Vec::with_capacity(specs.len());
        for (spec_index, spec) in specs.iter().enumerate() {
            let batch_id = match batch_ids.iter().find(|(batch, _)| *batch == spec.batch) {
                Some((_, id)) => *id,
                None => {
                    let id = Uuid::now_v7();
                    batch_ids.push((spec.batch, id));
                    id
                }
            };
            let assignment = NewAssignment {
                distribution_batch_id: Some(batch_id),
                ..spec.assignment.clone()
            };

            let result = match self.store.create_assignment(&assignment).await {
                Ok(id) => {
                    tracing::info!(
                        "Report assignment created: id={}, given_by={}, subject_id={:?}, parent={:?}, batch={}",
                        id,
                        assignment.given_by,
                        assignment.subject_id,
                        assignment.parent_report_assignment_id,
                        batch_id
                    );
                    Ok(id)
                }
                Err(e) => {
                    tracing::error!("Failed to create assignment for spec {}: {}", spec_index, e);
                    Err(e.to_string())
                }
            };
            created.push(Materialized { result });
        }
        created
    }

    /// Best-effort parent link. Safe to retry.
    pub async fn link_parent(&self, child_id: i64, parent_id: i64) -> Result<(), DistributionError> {
        self.store
            .set_parent(child_id, parent_id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Failed to link assignment {} to parent {}: {}",
                    child_id,
                    parent_id,
                    e
                );
                DistributionError::LinkFailure {
                    child_id,
                    parent_id,
                    reason: e.to_string(),
                }
            })
    }

    /// Link a child batch to a parent batch of the same action, pairing by
    /// subject id. A batch mismatch aborts before any link is attempted.
    pub async fn link_batches(
        &self,
        parents: &[(Option<i64>, i64)],
        children: &[(Option<i64>, i64)],
    ) -> Result<Vec<LinkAttempt>, DistributionError> {
        let pairs = pair_by_subject(parents, children).map_err(|e| {
            tracing::warn!("Skipping parent links: {}", e);
            e
        })?;

        let mut attempts = Vec::with_capacity(pairs.len());
        for (child_id, parent_id) in pairs {
            let result = self.link_parent(child_id, parent_id).await;
            attempts.push(LinkAttempt {
                child_id,
                parent_id,
                result,
            });
        }
        Ok(attempts)
    }
}
