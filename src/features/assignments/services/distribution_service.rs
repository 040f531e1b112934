use std::sync::Arc;

use crate::features::assignments::dtos::{
    AssignmentDetailDto, AssignmentResponseDto, DistributeAssignmentDto, DistributionOutcomeDto,
    DistributionStatus, SpecOutcomeDto, SpecState, SubmitAction, SubmitAssignmentDto,
    SubmitOutcomeDto, UpdateAssignmentDto, UpdateOutcomeDto,
};
use crate::features::assignments::engine::{
    build_assignment_specs, resolve_coordinator_of_record, route, Actor, AncestorBatch,
    AssignmentDetails, AssignmentSpec, CoordinatorOwnershipResolver, DistributionError,
    DistributionRequest, OwnershipOutcome, ParentRef, Recipient, RouteDecision, SpecBatch,
    SubjectRef,
};
use crate::features::assignments::models::{AssignmentPatch, ReportAssignment};
use crate::features::assignments::services::{
    AssignmentHistory, AssignmentStore, AssignmentWriter, SubmissionSynchronizer,
};
use crate::features::catalog::services::Catalog;
use crate::features::roster::services::{load_roster, RosterSource};
use crate::shared::types::PaginationQuery;

/// How far up the parent chain a link retry looks for cycles
const MAX_ANCESTRY_DEPTH: usize = 32;

/// Everything a create action needs once the ancestor (if any) is resolved
struct CreateInput {
    category_id: i64,
    sub_category_id: Option<i64>,
    recipient_ids: Vec<i64>,
    details: AssignmentDetails,
    grade_level_id: Option<i64>,
    subject_ids: Vec<i64>,
}

impl CreateInput {
    fn from_submit(dto: &SubmitAssignmentDto) -> Self {
        Self {
            category_id: dto.category_id,
            sub_category_id: dto.sub_category_id,
            recipient_ids: dto.recipient_ids.clone(),
            details: AssignmentDetails {
                title: dto.title.clone(),
                instruction: dto.instruction.clone(),
                from_date: dto.from_date,
                to_date: dto.to_date,
                allow_late: dto.allow_late,
                max_submission_count: dto.max_submission_count,
                is_given: dto.is_given,
                year_id: dto.year_id,
                quarter: dto.quarter,
            },
            grade_level_id: dto.grade_level_id,
            subject_ids: dto.subject_ids.clone(),
        }
    }

    fn inherit(
        ancestor: &ReportAssignment,
        siblings: &[ReportAssignment],
        dto: &DistributeAssignmentDto,
    ) -> Self {
        let subject_ids = dto.subject_ids.clone().unwrap_or_else(|| {
            siblings.iter().filter_map(|s| s.subject_id).collect()
        });
        // Per-subject titles are re-derived unless the distributor names one
        let title = dto.title.clone().or_else(|| {
            ancestor
                .subject_id
                .is_none()
                .then(|| ancestor.title.clone())
        });

        Self {
            category_id: ancestor.category_id,
            sub_category_id: ancestor.sub_category_id,
            recipient_ids: dto.recipient_ids.clone(),
            details: AssignmentDetails {
                title,
                instruction: dto
                    .instruction
                    .clone()
                    .or_else(|| ancestor.instruction.clone()),
                from_date: dto.from_date.unwrap_or(ancestor.from_date),
                to_date: dto.to_date.unwrap_or(ancestor.to_date),
                allow_late: dto.allow_late.unwrap_or(ancestor.allow_late),
                max_submission_count: dto
                    .max_submission_count
                    .or(ancestor.max_submission_count),
                is_given: dto.is_given.unwrap_or(true),
                year_id: ancestor.year_id,
                quarter: ancestor.quarter,
            },
            grade_level_id: ancestor.grade_level_id,
            subject_ids,
        }
    }
}

/// Runs a distribution action end to end:
/// route, classify, resolve ownership, fan out, materialize, link, synchronize.
pub struct DistributionService {
    roster: Arc<dyn RosterSource>,
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn AssignmentStore>,
    history: Arc<dyn AssignmentHistory>,
    ownership: Arc<dyn CoordinatorOwnershipResolver>,
    writer: AssignmentWriter,
    sync: SubmissionSynchronizer,
}

impl DistributionService {
    pub fn new(
        roster: Arc<dyn RosterSource>,
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn AssignmentStore>,
        history: Arc<dyn AssignmentHistory>,
        ownership: Arc<dyn CoordinatorOwnershipResolver>,
    ) -> Self {
        Self {
            writer: AssignmentWriter::new(store.clone()),
            sync: SubmissionSynchronizer::new(store.clone()),
            roster,
            catalog,
            store,
            history,
            ownership,
        }
    }

    /// Handle the report assignment form. The router decides between an
    /// in-place update and creating new (child) assignments.
    pub async fn submit(
        &self,
        actor: Actor,
        dto: &SubmitAssignmentDto,
    ) -> Result<SubmitOutcomeDto, DistributionError> {
        ensure_can_distribute(&actor)?;

        let editing = match dto.editing_assignment_id {
            Some(id) => Some(self.load(id).await?),
            None => None,
        };

        let is_explicit_edit = dto.action == Some(SubmitAction::Edit);
        let is_distribution_from_ancestor = match (dto.action, &editing) {
            (Some(action), _) => action == SubmitAction::Distribute,
            (None, Some(assignment)) => {
                assignment.given_by != actor.id && self.is_recipient(assignment.id, actor.id).await?
            }
            (None, None) => false,
        };

        let decision = route(
            dto.editing_assignment_id,
            is_explicit_edit,
            is_distribution_from_ancestor,
        );
        tracing::debug!("Routing submit from user {}: {:?}", actor.id, decision);

        match (decision, editing) {
            (RouteDecision::Update { .. }, Some(assignment)) => {
                let recipients = Some(dto.recipient_ids.clone()).filter(|r| !r.is_empty());
                let updated = self
                    .apply_update(actor, assignment, dto.to_patch(), recipients)
                    .await?;
                Ok(SubmitOutcomeDto {
                    decision,
                    created: None,
                    updated: Some(updated),
                })
            }
            (RouteDecision::Update { assignment_id }, None) => {
                Err(DistributionError::AssignmentNotFound(assignment_id))
            }
            (RouteDecision::CreateChildren { ancestor_id }, editing) => {
                let ancestor = ancestor_id.and(editing);
                if let Some(ancestor) = &ancestor {
                    if !ancestor.matches_category(dto.category_id, dto.sub_category_id) {
                        return Err(DistributionError::InvalidRequest(
                            "Category must match the assignment being distributed".to_string(),
                        ));
                    }
                }
                let created = self
                    .create(actor, CreateInput::from_submit(dto), ancestor)
                    .await?;
                Ok(SubmitOutcomeDto {
                    decision,
                    created: Some(created),
                    updated: None,
                })
            }
        }
    }

    /// Hand an existing assignment onward. Never mutates the ancestor row.
    pub async fn distribute(
        &self,
        actor: Actor,
        ancestor_id: i64,
        dto: &DistributeAssignmentDto,
    ) -> Result<DistributionOutcomeDto, DistributionError> {
        ensure_can_distribute(&actor)?;

        let ancestor = self.load(ancestor_id).await?;
        let siblings = self.history.subject_siblings(&ancestor).await?;
        let input = CreateInput::inherit(&ancestor, &siblings, dto);

        self.create(actor, input, Some(ancestor)).await
    }

    /// Explicit in-place edit by the author
    pub async fn update(
        &self,
        actor: Actor,
        assignment_id: i64,
        dto: &UpdateAssignmentDto,
    ) -> Result<UpdateOutcomeDto, DistributionError> {
        ensure_can_distribute(&actor)?;

        let assignment = self.load(assignment_id).await?;
        self.apply_update(actor, assignment, dto.to_patch(), dto.recipient_ids.clone())
            .await
    }

    /// Retry a parent link left behind by a partial failure
    pub async fn relink(
        &self,
        actor: Actor,
        child_id: i64,
        parent_id: i64,
    ) -> Result<AssignmentResponseDto, DistributionError> {
        ensure_can_distribute(&actor)?;

        let child = self.load(child_id).await?;
        if child.given_by != actor.id {
            return Err(DistributionError::Forbidden(
                "Only the author can link this assignment".to_string(),
            ));
        }
        if child.parent_report_assignment_id == Some(parent_id) {
            return Ok(child.into());
        }

        let parent = self.load(parent_id).await?;
        if !parent.matches_category(child.category_id, child.sub_category_id) {
            return Err(DistributionError::InvalidRequest(
                "Parent assignment belongs to a different category".to_string(),
            ));
        }
        if parent.subject_id.is_some() && parent.subject_id != child.subject_id {
            return Err(DistributionError::UnpairedSubject {
                subject_id: child.subject_id,
            });
        }
        if self.is_ancestor_or_self(child.id, &parent).await? {
            return Err(DistributionError::InvalidRequest(
                "Linking would create a cycle".to_string(),
            ));
        }

        self.writer.link_parent(child.id, parent.id).await?;
        tracing::info!("Assignment {} linked to parent {}", child.id, parent.id);

        Ok(self.load(child.id).await?.into())
    }

    /// One assignment with its submissions and direct children
    pub async fn detail(
        &self,
        actor: Actor,
        assignment_id: i64,
    ) -> Result<AssignmentDetailDto, DistributionError> {
        let assignment = self.load(assignment_id).await?;
        let submissions = self
            .store
            .list_submissions_by_assignment(assignment.id)
            .await?;

        let visible = actor.role.has_principal_authority()
            || assignment.given_by == actor.id
            || assignment.coordinator_user_id == Some(actor.id)
            || submissions.iter().any(|s| s.submitted_by == actor.id);
        if !visible {
            return Err(DistributionError::Forbidden(
                "You do not have access to this assignment".to_string(),
            ));
        }

        let children = self.history.children_of(assignment.id).await?;

        Ok(AssignmentDetailDto {
            assignment: assignment.into(),
            submissions: submissions.into_iter().map(Into::into).collect(),
            children: children.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn list_given(
        &self,
        actor: Actor,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<AssignmentResponseDto>, i64), DistributionError> {
        let rows = self.history.assignments_given_by(actor.id).await?;
        Ok(paginate(rows, pagination))
    }

    pub async fn list_received(
        &self,
        actor: Actor,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<AssignmentResponseDto>, i64), DistributionError> {
        let rows = self.history.assignments_for_recipient(actor.id).await?;
        Ok(paginate(rows, pagination))
    }

    async fn create(
        &self,
        actor: Actor,
        input: CreateInput,
        ancestor: Option<ReportAssignment>,
    ) -> Result<DistributionOutcomeDto, DistributionError> {
        if let Some(ancestor) = &ancestor {
            if ancestor.given_by != actor.id && !self.is_recipient(ancestor.id, actor.id).await? {
                return Err(DistributionError::Forbidden(
                    "Only a recipient or the author can distribute this assignment".to_string(),
                ));
            }
        }

        let category = self
            .catalog
            .category_profile(input.category_id, input.sub_category_id)
            .await?;

        let roster = load_roster(self.roster.as_ref()).await?;
        let mut recipients: Vec<Recipient> = Vec::with_capacity(input.recipient_ids.len());
        for &id in &input.recipient_ids {
            if id == actor.id || recipients.iter().any(|r| r.id == id) {
                continue;
            }
            recipients.push(Recipient {
                id,
                role: roster.classify(id)?,
            });
        }

        let subjects = self.resolve_subjects(&input).await?;

        let mut request = DistributionRequest {
            actor,
            recipients,
            category,
            details: input.details,
            grade_level_id: input.grade_level_id,
            subjects,
            ancestor: None,
            coordinator_of_record: None,
        };

        if let Some(ancestor) = &ancestor {
            request.ancestor = Some(if request.fans_out() {
                let members = self
                    .history
                    .subject_siblings(ancestor)
                    .await?
                    .iter()
                    .map(|s| (s.subject_id, s.id))
                    .collect();
                AncestorBatch {
                    primary_id: ancestor.id,
                    members,
                }
            } else {
                AncestorBatch::single(ancestor.id, ancestor.subject_id)
            });
        }

        let ownership = if request.is_own_obligation() {
            OwnershipOutcome::SelfOwned {
                coordinator_id: actor.id,
            }
        } else {
            resolve_coordinator_of_record(
                self.ownership.as_ref(),
                &actor,
                &request.recipients,
                request.category.category_id,
                request.category.sub_category_id,
            )
            .await
        };
        if !request.is_own_obligation() {
            request.coordinator_of_record = ownership.coordinator_user_id();
        }

        // Everything above is validation; nothing has been written yet
        let specs = build_assignment_specs(&request)?;
        let created = self.writer.materialize(&specs).await;

        let mut outcomes: Vec<SpecOutcomeDto> = specs
            .iter()
            .zip(&created)
            .map(|(spec, m)| SpecOutcomeDto {
                batch: spec.batch,
                subject_id: spec.subject_id(),
                assignment_id: m.assignment_id(),
                parent_id: match spec.parent {
                    ParentRef::Existing(id) => Some(id),
                    _ => None,
                },
                recipients: spec.recipients.clone(),
                state: if m.result.is_ok() {
                    SpecState::Succeeded
                } else {
                    SpecState::Failed
                },
                errors: m.result.as_ref().err().cloned().into_iter().collect(),
            })
            .collect();

        let mut warnings = Vec::new();
        self.link_same_action_batches(&specs, &mut outcomes, &mut warnings)
            .await;

        let mut has_sync_warnings = false;
        for (spec, outcome) in specs.iter().zip(&outcomes) {
            let Some(id) = outcome.assignment_id else {
                continue;
            };
            let report = self
                .sync
                .synchronize(id, &spec.recipients, spec.assignment.is_given, false)
                .await;
            has_sync_warnings |= !report.failures.is_empty();
            warnings.extend(report.warnings());
        }

        // The distributor's own copy of the ancestor is now in play
        if request.details.is_given && ancestor.is_some() {
            let mut parents: Vec<i64> = outcomes.iter().filter_map(|o| o.parent_id).collect();
            parents.sort_unstable();
            parents.dedup();
            for parent_id in parents {
                if let Err(e) = self.sync.advance_existing(parent_id, actor.id).await {
                    tracing::warn!("{}", e);
                    has_sync_warnings = true;
                    warnings.push(e.to_string());
                }
            }
        }

        let status = DistributionStatus::summarize(&outcomes, has_sync_warnings);
        tracing::info!(
            "Distribution by user {} finished: status={:?}, specs={}, created={}",
            actor.id,
            status,
            outcomes.len(),
            outcomes.iter().filter(|o| o.assignment_id.is_some()).count()
        );

        Ok(DistributionOutcomeDto {
            status,
            ownership,
            assignments: outcomes,
            warnings,
        })
    }

    /// Link the child batch of an own obligation to the roots created with it
    async fn link_same_action_batches(
        &self,
        specs: &[AssignmentSpec],
        outcomes: &mut [SpecOutcomeDto],
        warnings: &mut Vec<String>,
    ) {
        let waiting: Vec<usize> = specs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.parent == ParentRef::SameActionRoot)
            .map(|(i, _)| i)
            .collect();
        if waiting.is_empty() {
            return;
        }

        let parents: Vec<(Option<i64>, i64)> = specs
            .iter()
            .zip(outcomes.iter())
            .filter(|(s, _)| s.batch == SpecBatch::Root)
            .filter_map(|(s, o)| o.assignment_id.map(|id| (s.subject_id(), id)))
            .collect();
        let children: Vec<(Option<i64>, i64)> = waiting
            .iter()
            .filter_map(|&i| outcomes[i].assignment_id.map(|id| (specs[i].subject_id(), id)))
            .collect();

        match self.writer.link_batches(&parents, &children).await {
            Ok(attempts) => {
                for attempt in attempts {
                    let Some(outcome) = outcomes
                        .iter_mut()
                        .find(|o| o.assignment_id == Some(attempt.child_id))
                    else {
                        continue;
                    };
                    match attempt.result {
                        Ok(()) => outcome.parent_id = Some(attempt.parent_id),
                        Err(e) => {
                            outcome.state = SpecState::PartiallyLinked;
                            outcome.errors.push(e.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                warnings.push(e.to_string());
                for &i in &waiting {
                    if outcomes[i].state == SpecState::Succeeded {
                        outcomes[i].state = SpecState::PartiallyLinked;
                        outcomes[i].errors.push(e.to_string());
                    }
                }
            }
        }
    }

    async fn apply_update(
        &self,
        actor: Actor,
        assignment: ReportAssignment,
        mut patch: AssignmentPatch,
        recipient_ids: Option<Vec<i64>>,
    ) -> Result<UpdateOutcomeDto, DistributionError> {
        if assignment.given_by != actor.id {
            return Err(DistributionError::Forbidden(
                "Only the author can edit this assignment".to_string(),
            ));
        }

        let existing = self
            .store
            .list_submissions_by_assignment(assignment.id)
            .await?;
        let current: Vec<i64> = existing.iter().map(|s| s.submitted_by).collect();
        let is_own_root =
            assignment.is_root() && assignment.coordinator_user_id == Some(assignment.given_by);

        let mut ownership = None;
        let recipients = match recipient_ids {
            Some(ids) if is_own_root => {
                if ids.iter().any(|id| *id != actor.id && !current.contains(id)) {
                    return Err(DistributionError::InvalidRequest(
                        "Use the distribute action to hand your own assignment to more recipients"
                            .to_string(),
                    ));
                }
                current.clone()
            }
            Some(ids) => {
                let roster = load_roster(self.roster.as_ref()).await?;
                let mut recipients: Vec<Recipient> = Vec::with_capacity(ids.len());
                for id in ids {
                    if id == actor.id || recipients.iter().any(|r| r.id == id) {
                        continue;
                    }
                    recipients.push(Recipient {
                        id,
                        role: roster.classify(id)?,
                    });
                }
                if recipients.is_empty() {
                    return Err(DistributionError::EmptyRecipients);
                }

                let ids: Vec<i64> = recipients.iter().map(|r| r.id).collect();
                if !same_members(&ids, &current) {
                    let outcome = resolve_coordinator_of_record(
                        self.ownership.as_ref(),
                        &actor,
                        &recipients,
                        assignment.category_id,
                        assignment.sub_category_id,
                    )
                    .await;
                    patch.coordinator_user_id = Some(outcome.coordinator_user_id());
                    ownership = Some(outcome);
                }
                ids
            }
            None => current.clone(),
        };
        let recipients_changed = !same_members(&recipients, &current);

        if !patch.is_empty() {
            self.store.update_assignment(assignment.id, &patch).await?;
        }

        let mut updated = assignment.clone();
        patch.apply_to(&mut updated);
        tracing::info!(
            "Report assignment updated: id={}, recipients_changed={}",
            updated.id,
            recipients_changed
        );

        let report = self
            .sync
            .synchronize(updated.id, &recipients, updated.is_given, recipients_changed)
            .await;

        Ok(UpdateOutcomeDto {
            assignment_id: updated.id,
            status: if report.failures.is_empty() {
                DistributionStatus::Succeeded
            } else {
                DistributionStatus::SucceededWithWarnings
            },
            ownership,
            added_recipients: recipients
                .iter()
                .filter(|r| !current.contains(r))
                .copied()
                .collect(),
            removed_recipients: current
                .iter()
                .filter(|r| !recipients.contains(r))
                .copied()
                .collect(),
            warnings: report.warnings(),
        })
    }

    async fn resolve_subjects(
        &self,
        input: &CreateInput,
    ) -> Result<Vec<SubjectRef>, DistributionError> {
        if input.grade_level_id.is_none() || input.subject_ids.is_empty() {
            return Ok(Vec::new());
        }

        let subjects = self.catalog.subjects_by_ids(&input.subject_ids).await?;
        if let Some(missing) = input
            .subject_ids
            .iter()
            .find(|id| !subjects.iter().any(|s| s.id == **id))
        {
            return Err(DistributionError::InvalidRequest(format!(
                "Subject {} not found",
                missing
            )));
        }
        if let Some(other) = subjects
            .iter()
            .find(|s| s.grade_level_id.is_some() && s.grade_level_id != input.grade_level_id)
        {
            return Err(DistributionError::InvalidRequest(format!(
                "Subject {} is not taught at the selected grade level",
                other.id
            )));
        }

        Ok(subjects
            .into_iter()
            .map(|s| SubjectRef {
                id: s.id,
                name: s.name,
            })
            .collect())
    }

    async fn load(&self, id: i64) -> Result<ReportAssignment, DistributionError> {
        self.history
            .assignment_by_id(id)
            .await?
            .ok_or(DistributionError::AssignmentNotFound(id))
    }

    async fn is_recipient(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<bool, DistributionError> {
        Ok(self
            .store
            .list_submissions_by_assignment(assignment_id)
            .await?
            .iter()
            .any(|s| s.submitted_by == user_id))
    }

    /// Whether `id` is `start` or one of its ancestors
    async fn is_ancestor_or_self(
        &self,
        id: i64,
        start: &ReportAssignment,
    ) -> Result<bool, DistributionError> {
        let mut current = Some(start.clone());
        for _ in 0..MAX_ANCESTRY_DEPTH {
            let Some(assignment) = current else {
                return Ok(false);
            };
            if assignment.id == id {
                return Ok(true);
            }
            current = match assignment.parent_report_assignment_id {
                Some(parent_id) => self.history.assignment_by_id(parent_id).await?,
                None => None,
            };
        }
        Ok(current.is_some())
    }
}

fn ensure_can_distribute(actor: &Actor) -> Result<(), DistributionError> {
    if actor.role.can_distribute() {
        Ok(())
    } else {
        Err(DistributionError::Forbidden(
            "Teachers cannot distribute report assignments".to_string(),
        ))
    }
}

fn same_members(a: &[i64], b: &[i64]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

fn paginate(
    rows: Vec<ReportAssignment>,
    pagination: &PaginationQuery,
) -> (Vec<AssignmentResponseDto>, i64) {
    let (page, total) = pagination.page_of(rows);
    (page.into_iter().map(Into::into).collect(), total)
}
