//! Keeps each recipient's submission in step with its assignment.
//!
//! Only `NotGiven -> Pending` is ever driven from here; later states belong
//! to the approval workflow.

use std::sync::Arc;

use crate::features::assignments::engine::DistributionError;
use crate::features::assignments::models::{Submission, SubmissionStatus};
use crate::features::assignments::services::AssignmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Create {
        recipient_id: i64,
        status: SubmissionStatus,
    },
    Advance {
        recipient_id: i64,
    },
    Remove {
        recipient_id: i64,
    },
}

/// Decide what to do with each submission of one assignment.
///
/// `prune` removes submissions of users no longer among the recipients.
pub fn plan_sync(
    existing: &[Submission],
    recipients: &[i64],
    is_given: bool,
    prune: bool,
) -> Vec<SyncAction> {
    let mut actions = Vec::new();
    let mut seen: Vec<i64> = Vec::with_capacity(recipients.len());

    for &recipient_id in recipients {
        if seen.contains(&recipient_id) {
            continue;
        }
        seen.push(recipient_id);

        match existing.iter().find(|s| s.submitted_by == recipient_id) {
            None => actions.push(SyncAction::Create {
                recipient_id,
                status: SubmissionStatus::initial(is_given),
            }),
            Some(s)
                if is_given
                    && s.status.awaits_release()
                    && s.status.can_transition_to(SubmissionStatus::Pending) =>
            {
                actions.push(SyncAction::Advance { recipient_id })
            }
            Some(_) => {}
        }
    }

    if prune {
        actions.extend(
            existing
                .iter()
                .filter(|s| !recipients.contains(&s.submitted_by))
                .map(|s| SyncAction::Remove {
                    recipient_id: s.submitted_by,
                }),
        );
    }

    actions
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: usize,
    pub advanced: usize,
    pub removed: usize,
    pub failures: Vec<DistributionError>,
}

impl SyncReport {
    pub fn warnings(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.to_string()).collect()
    }
}

pub struct SubmissionSynchronizer {
    store: Arc<dyn AssignmentStore>,
}

impl SubmissionSynchronizer {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    /// Apply the plan for one assignment. Failures are collected per
    /// recipient and never abort the rest.
    pub async fn synchronize(
        &self,
        assignment_id: i64,
        recipients: &[i64],
        is_given: bool,
        prune: bool,
    ) -> SyncReport {
        let (existing, prune) = match self.store.list_submissions_by_assignment(assignment_id).await
        {
            Ok(existing) => (existing, prune),
            Err(e) => {
                // Upserts never move a submission backwards, so planning
                // against nothing is still safe; pruning is not.
                tracing::warn!(
                    "Failed to list submissions of assignment {}, syncing blind: {}",
                    assignment_id,
                    e
                );
                (Vec::new(), false)
            }
        };

        let mut report = SyncReport::default();
        for action in plan_sync(&existing, recipients, is_given, prune) {
            let (recipient_id, result) = match action {
                SyncAction::Create {
                    recipient_id,
                    status,
                } => (
                    recipient_id,
                    self.store
                        .upsert_submission(assignment_id, recipient_id, status)
                        .await
                        .map(|_| report.created += 1),
                ),
                SyncAction::Advance { recipient_id } => (
                    recipient_id,
                    self.store
                        .upsert_submission(assignment_id, recipient_id, SubmissionStatus::Pending)
                        .await
                        .map(|_| report.advanced += 1),
                ),
                SyncAction::Remove { recipient_id } => (
                    recipient_id,
                    self.store
                        .remove_submission(assignment_id, recipient_id)
                        .await
                        .map(|_| report.removed += 1),
                ),
            };

            if let Err(e) = result {
                tracing::warn!(
                    "Failed to synchronize submission of user {} on assignment {}: {}",
                    recipient_id,
                    assignment_id,
                    e
                );
                report.failures.push(DistributionError::SynchronizationFailure {
                    assignment_id,
                    recipient_id,
                    reason: e.to_string(),
                });
            }
        }

        tracing::debug!(
            "Synchronized assignment {}: created={}, advanced={}, removed={}, failed={}",
            assignment_id,
            report.created,
            report.advanced,
            report.removed,
            report.failures.len()
        );
        report
    }

    /// Move the recipient's own `NotGiven` submission on `assignment_id` to
    /// `Pending`. Returns whether anything changed; never creates a submission.
    pub async fn advance_existing(
        &self,
        assignment_id: i64,
        recipient_id: i64,
    ) -> Result<bool, DistributionError> {
        let to_failure = |e: crate::core::error::StoreError| {
            DistributionError::SynchronizationFailure {
                assignment_id,
                recipient_id,
                reason: e.to_string(),
            }
        };

        let existing = self
            .store
            .list_submissions_by_assignment(assignment_id)
            .await
            .map_err(to_failure)?;

        let needs_advance = existing
            .iter()
            .any(|s| {
                s.submitted_by == recipient_id
                    && s.status.awaits_release()
                    && s.status.can_transition_to(SubmissionStatus::Pending)
            });
        if !needs_advance {
            return Ok(false);
        }

        self.store
            .upsert_submission(assignment_id, recipient_id, SubmissionStatus::Pending)
            .await
            .map_err(to_failure)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{assignment, submission, InMemoryStore};
    use SubmissionStatus::*;

    #[test]
    fn test_plan_creates_missing_with_initial_status() {
        let plan = plan_sync(&[], &[10, 11, 10], true, false);
        assert_eq!(
            plan,
            vec![
                SyncAction::Create {
                    recipient_id: 10,
                    status: Pending
                },
                SyncAction::Create {
                    recipient_id: 11,
                    status: Pending
                },
            ]
        );

        let plan = plan_sync(&[], &[10], false, false);
        assert_eq!(
            plan,
            vec![SyncAction::Create {
                recipient_id: 10,
                status: NotGiven
            }]
        );
    }

    #[test]
    fn test_plan_advances_not_given_only() {
        let existing = vec![
            submission(1, 10, NotGiven),
            submission(1, 11, Submitted),
            submission(1, 12, Rejected),
            submission(1, 13, Pending),
        ];
        let plan = plan_sync(&existing, &[10, 11, 12, 13], true, false);
        assert_eq!(plan, vec![SyncAction::Advance { recipient_id: 10 }]);

        assert!(plan_sync(&existing, &[10], false, false).is_empty());
    }

    #[test]
    fn test_plan_prunes_removed_recipients() {
        let existing = vec![submission(1, 10, Pending), submission(1, 11, Pending)];

        let plan = plan_sync(&existing, &[10], true, true);
        assert_eq!(plan, vec![SyncAction::Remove { recipient_id: 11 }]);

        assert!(plan_sync(&existing, &[10], true, false).is_empty());
    }

    #[tokio::test]
    async fn test_synchronize_collects_failures() {
        let store = Arc::new(InMemoryStore::new());
        let id = store.insert_assignment(assignment(1, 10, None), &[]);
        store.fail_submissions_for(11);
        let sync = SubmissionSynchronizer::new(store.clone());

        let report = sync.synchronize(id, &[10, 11, 12], true, false).await;

        assert_eq!(report.created, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            DistributionError::SynchronizationFailure {
                recipient_id: 11,
                ..
            }
        ));
        assert_eq!(store.status_of(id, 10), Some(Pending));
        assert_eq!(store.status_of(id, 11), None);
    }

    #[tokio::test]
    async fn test_synchronize_never_regresses_submitted() {
        let store = Arc::new(InMemoryStore::new());
        let id = store.insert_assignment(assignment(1, 10, None), &[10]);
        store.set_status(id, 10, Submitted);
        let sync = SubmissionSynchronizer::new(store.clone());

        let report = sync.synchronize(id, &[10], true, true).await;

        assert_eq!(report.created + report.advanced + report.removed, 0);
        assert_eq!(store.status_of(id, 10), Some(Submitted));
    }

    #[tokio::test]
    async fn test_advance_existing() {
        let store = Arc::new(InMemoryStore::new());
        let mut not_given = assignment(1, 10, None);
        not_given.is_given = false;
        let id = store.insert_assignment(not_given, &[20]);
        let sync = SubmissionSynchronizer::new(store.clone());

        assert_eq!(store.status_of(id, 20), Some(NotGiven));
        assert!(sync.advance_existing(id, 20).await.unwrap());
        assert_eq!(store.status_of(id, 20), Some(Pending));
        assert!(!sync.advance_existing(id, 20).await.unwrap());
        assert!(!sync.advance_existing(id, 99).await.unwrap());
        assert_eq!(store.status_of(id, 99), None);
    }

    #[tokio::test]
    async fn test_advance_existing_leaves_rejected_for_the_approver() {
        let store = Arc::new(InMemoryStore::new());
        let id = store.insert_assignment(assignment(1, 10, None), &[20]);
        store.set_status(id, 20, Rejected);
        let sync = SubmissionSynchronizer::new(store.clone());

        assert!(Rejected.can_transition_to(Pending));
        assert!(!sync.advance_existing(id, 20).await.unwrap());
        assert_eq!(store.status_of(id, 20), Some(Rejected));

        let report = sync.synchronize(id, &[20], true, false).await;
        assert_eq!(report.advanced, 0);
        assert_eq!(store.status_of(id, 20), Some(Rejected));
    }
}
