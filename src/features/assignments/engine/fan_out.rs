//! Expansion of one distribution request into assignment specs.

use serde::Serialize;
use utoipa::ToSchema;

use super::error::DistributionError;
use super::request::{DistributionRequest, SubjectRef};
use crate::features::assignments::models::NewAssignment;

/// Which batch of an action a spec belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpecBatch {
    /// Originates an obligation (or is handed down directly from an existing row)
    Root,
    /// Hangs under a root created by the same action or under an ancestor
    Child,
}

/// Where a spec's parent comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    None,
    /// Known before creation; written with the row
    Existing(i64),
    /// The root of the same subject created by this action; linked afterwards
    SameActionRoot,
}

/// One assignment row to create plus the recipients it is handed to
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSpec {
    pub batch: SpecBatch,
    pub parent: ParentRef,
    pub recipients: Vec<i64>,
    pub assignment: NewAssignment,
}

impl AssignmentSpec {
    pub fn subject_id(&self) -> Option<i64> {
        self.assignment.subject_id
    }
}

/// Pair children with parents by subject id.
///
/// Batches must be the same size and every child subject needs a distinct
/// parent of the same subject. Returns `(child, parent_id)` pairs.
pub fn pair_by_subject<T: Copy>(
    parents: &[(Option<i64>, i64)],
    children: &[(Option<i64>, T)],
) -> Result<Vec<(T, i64)>, DistributionError> {
    if parents.len() != children.len() {
        return Err(DistributionError::FanOutMismatch {
            parents: parents.len(),
            children: children.len(),
        });
    }

    let mut used = vec![false; parents.len()];
    let mut pairs = Vec::with_capacity(children.len());
    for (subject_id, child) in children {
        let slot = parents
            .iter()
            .enumerate()
            .position(|(i, (parent_subject, _))| !used[i] && parent_subject == subject_id)
            .ok_or(DistributionError::UnpairedSubject {
                subject_id: *subject_id,
            })?;
        used[slot] = true;
        pairs.push((*child, parents[slot].1));
    }
    Ok(pairs)
}

pub fn build_assignment_specs(
    request: &DistributionRequest,
) -> Result<Vec<AssignmentSpec>, DistributionError> {
    let actor_id = request.actor.id;

    let mut others: Vec<i64> = Vec::with_capacity(request.recipients.len());
    for recipient in &request.recipients {
        if recipient.id != actor_id && !others.contains(&recipient.id) {
            others.push(recipient.id);
        }
    }

    let slots = subject_slots(request);

    if request.is_own_obligation() {
        let mut specs: Vec<AssignmentSpec> = slots
            .iter()
            .map(|subject| AssignmentSpec {
                batch: SpecBatch::Root,
                parent: ParentRef::None,
                recipients: vec![actor_id],
                assignment: new_assignment(request, *subject, Some(actor_id), None),
            })
            .collect();

        if !others.is_empty() {
            specs.extend(slots.iter().map(|subject| AssignmentSpec {
                batch: SpecBatch::Child,
                parent: ParentRef::SameActionRoot,
                recipients: others.clone(),
                assignment: new_assignment(request, *subject, None, None),
            }));
        }
        return Ok(specs);
    }

    if others.is_empty() {
        return Err(DistributionError::EmptyRecipients);
    }

    let parents: Vec<Option<i64>> = match &request.ancestor {
        None => vec![None; slots.len()],
        Some(ancestor) if !request.fans_out() || ancestor.is_subject_less() => {
            vec![Some(ancestor.primary_id); slots.len()]
        }
        Some(ancestor) => {
            let keyed: Vec<(Option<i64>, usize)> = slots
                .iter()
                .enumerate()
                .map(|(i, s)| (s.map(|s| s.id), i))
                .collect();
            let mut parents = vec![None; slots.len()];
            for (slot, parent_id) in pair_by_subject(&ancestor.members, &keyed)? {
                parents[slot] = Some(parent_id);
            }
            parents
        }
    };

    Ok(slots
        .iter()
        .zip(parents)
        .map(|(subject, parent_id)| AssignmentSpec {
            batch: if parent_id.is_some() {
                SpecBatch::Child
            } else {
                SpecBatch::Root
            },
            parent: parent_id.map(ParentRef::Existing).unwrap_or(ParentRef::None),
            recipients: others.clone(),
            assignment: new_assignment(
                request,
                *subject,
                request.coordinator_of_record,
                parent_id,
            ),
        })
        .collect())
}

/// One slot per distinct selected subject, or a single subject-less slot
fn subject_slots(request: &DistributionRequest) -> Vec<Option<&SubjectRef>> {
    if !request.fans_out() {
        return vec![None];
    }
    let mut slots: Vec<Option<&SubjectRef>> = Vec::with_capacity(request.subjects.len());
    for subject in &request.subjects {
        if !slots.iter().flatten().any(|s| s.id == subject.id) {
            slots.push(Some(subject));
        }
    }
    slots
}

fn new_assignment(
    request: &DistributionRequest,
    subject: Option<&SubjectRef>,
    coordinator_user_id: Option<i64>,
    parent_id: Option<i64>,
) -> NewAssignment {
    let details = &request.details;
    let given_title = details
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let title = match (given_title, subject) {
        (Some(title), _) => title.to_string(),
        (None, Some(subject)) => {
            format!("{} - {}", request.category.default_title(), subject.name)
        }
        (None, None) => request.category.default_title(),
    };

    NewAssignment {
        category_id: request.category.category_id,
        sub_category_id: request.category.sub_category_id,
        given_by: request.actor.id,
        coordinator_user_id,
        parent_report_assignment_id: parent_id,
        title,
        instruction: details.instruction.clone(),
        from_date: details.from_date,
        to_date: details.to_date,
        allow_late: details.allow_late,
        max_submission_count: details.max_submission_count,
        is_given: details.is_given,
        year_id: details.year_id,
        quarter: details.quarter,
        grade_level_id: request.grade_level_id,
        subject_id: subject.map(|s| s.id),
        distribution_batch_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assignments::engine::request::{
        Actor, AncestorBatch, AssignmentDetails, Recipient,
    };
    use crate::features::auth::model::UserRole;
    use crate::features::catalog::models::{CategoryProfile, ReportKind};
    use crate::features::roster::models::RecipientRole;
    use chrono::NaiveDate;

    fn profile(kind: ReportKind) -> CategoryProfile {
        CategoryProfile {
            category_id: 2,
            category_name: "LAEMPL & MPS".to_string(),
            sub_category_id: Some(21),
            sub_category_name: Some("LAEMPL".to_string()),
            kind,
        }
    }

    fn details(title: Option<&str>) -> AssignmentDetails {
        AssignmentDetails {
            title: title.map(String::from),
            instruction: None,
            from_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2025, 3, 28).unwrap(),
            allow_late: false,
            max_submission_count: None,
            is_given: true,
            year_id: 2025,
            quarter: 1,
        }
    }

    fn subjects() -> Vec<SubjectRef> {
        vec![
            SubjectRef {
                id: 301,
                name: "Math".to_string(),
            },
            SubjectRef {
                id: 302,
                name: "English".to_string(),
            },
        ]
    }

    fn teacher(id: i64) -> Recipient {
        Recipient {
            id,
            role: RecipientRole::Teacher,
        }
    }

    fn request(actor_role: UserRole, kind: ReportKind) -> DistributionRequest {
        DistributionRequest {
            actor: Actor {
                id: 5,
                role: actor_role,
            },
            recipients: vec![],
            category: profile(kind),
            details: details(None),
            grade_level_id: None,
            subjects: vec![],
            ancestor: None,
            coordinator_of_record: None,
        }
    }

    #[test]
    fn test_single_spec_without_fan_out() {
        let mut req = request(UserRole::Principal, ReportKind::Accomplishment);
        req.recipients = vec![teacher(10), teacher(11), teacher(10)];

        let specs = build_assignment_specs(&req).unwrap();

        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].recipients, vec![10, 11]);
        assert_eq!(specs[0].batch, SpecBatch::Root);
        assert_eq!(specs[0].parent, ParentRef::None);
        assert_eq!(specs[0].assignment.title, "LAEMPL");
    }

    #[test]
    fn test_empty_recipients_after_removing_actor() {
        let mut req = request(UserRole::Principal, ReportKind::Mps);
        req.recipients = vec![teacher(5)];

        let err = build_assignment_specs(&req).unwrap_err();
        assert!(matches!(err, DistributionError::EmptyRecipients));
    }

    #[test]
    fn test_one_spec_per_subject_with_suffixed_titles() {
        let mut req = request(UserRole::Principal, ReportKind::Mps);
        req.recipients = vec![teacher(10)];
        req.grade_level_id = Some(3);
        req.subjects = subjects();
        req.subjects.push(SubjectRef {
            id: 301,
            name: "Math".to_string(),
        });

        let specs = build_assignment_specs(&req).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].subject_id(), Some(301));
        assert_eq!(specs[1].subject_id(), Some(302));
        assert_eq!(specs[0].assignment.title, "LAEMPL - Math");
        assert_eq!(specs[1].assignment.title, "LAEMPL - English");
        assert!(specs.iter().all(|s| s.assignment.grade_level_id == Some(3)));
    }

    #[test]
    fn test_explicit_title_kept_on_fan_out() {
        let mut req = request(UserRole::Principal, ReportKind::Mps);
        req.recipients = vec![teacher(10)];
        req.grade_level_id = Some(3);
        req.subjects = subjects();
        req.details = details(Some("  Q1 MPS  "));

        let specs = build_assignment_specs(&req).unwrap();
        assert!(specs.iter().all(|s| s.assignment.title == "Q1 MPS"));
    }

    #[test]
    fn test_no_grade_level_means_no_fan_out() {
        let mut req = request(UserRole::Principal, ReportKind::Laempl);
        req.recipients = vec![teacher(10)];
        req.subjects = subjects();

        let specs = build_assignment_specs(&req).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].subject_id(), None);
    }

    #[test]
    fn test_own_obligation_splits_root_and_children() {
        let mut req = request(UserRole::Coordinator, ReportKind::Laempl);
        req.recipients = vec![teacher(10), teacher(11)];
        req.grade_level_id = Some(3);
        req.subjects = subjects();

        let specs = build_assignment_specs(&req).unwrap();

        assert_eq!(specs.len(), 4);
        let roots: Vec<_> = specs.iter().filter(|s| s.batch == SpecBatch::Root).collect();
        let children: Vec<_> = specs.iter().filter(|s| s.batch == SpecBatch::Child).collect();
        assert_eq!(roots.len(), 2);
        assert_eq!(children.len(), 2);
        for root in roots {
            assert_eq!(root.recipients, vec![5]);
            assert_eq!(root.assignment.coordinator_user_id, Some(5));
            assert_eq!(root.parent, ParentRef::None);
        }
        for child in children {
            assert_eq!(child.recipients, vec![10, 11]);
            assert_eq!(child.assignment.coordinator_user_id, None);
            assert_eq!(child.parent, ParentRef::SameActionRoot);
        }
    }

    #[test]
    fn test_own_obligation_without_others_is_not_empty() {
        let req = request(UserRole::Coordinator, ReportKind::Accomplishment);

        let specs = build_assignment_specs(&req).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].recipients, vec![5]);
    }

    #[test]
    fn test_ancestor_children_paired_by_subject() {
        let mut req = request(UserRole::Coordinator, ReportKind::Laempl);
        req.recipients = vec![teacher(10)];
        req.grade_level_id = Some(3);
        req.subjects = subjects();
        req.ancestor = Some(AncestorBatch {
            primary_id: 900,
            members: vec![(Some(302), 901), (Some(301), 900)],
        });

        let specs = build_assignment_specs(&req).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].parent, ParentRef::Existing(900));
        assert_eq!(specs[0].assignment.parent_report_assignment_id, Some(900));
        assert_eq!(specs[1].parent, ParentRef::Existing(901));
        assert!(specs.iter().all(|s| s.batch == SpecBatch::Child));
        assert!(specs.iter().all(|s| s.assignment.coordinator_user_id.is_none()));
    }

    #[test]
    fn test_ancestor_without_fan_out_uses_primary() {
        let mut req = request(UserRole::Coordinator, ReportKind::Accomplishment);
        req.recipients = vec![teacher(10)];
        req.ancestor = Some(AncestorBatch::single(77, None));

        let specs = build_assignment_specs(&req).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].parent, ParentRef::Existing(77));
    }

    #[test]
    fn test_subject_less_ancestor_parents_every_subject() {
        let mut req = request(UserRole::Coordinator, ReportKind::Mps);
        req.recipients = vec![teacher(10)];
        req.grade_level_id = Some(3);
        req.subjects = subjects();
        req.ancestor = Some(AncestorBatch::single(55, None));

        let specs = build_assignment_specs(&req).unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|s| s.parent == ParentRef::Existing(55)));
    }

    #[test]
    fn test_ancestor_batch_size_mismatch() {
        let mut req = request(UserRole::Coordinator, ReportKind::Laempl);
        req.recipients = vec![teacher(10)];
        req.grade_level_id = Some(3);
        req.subjects = subjects();
        req.ancestor = Some(AncestorBatch::single(900, Some(301)));

        let err = build_assignment_specs(&req).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::FanOutMismatch {
                parents: 1,
                children: 2
            }
        ));
    }

    #[test]
    fn test_pair_by_subject_count_mismatch() {
        let parents = [(Some(1), 100), (Some(2), 200)];
        let children = [(Some(1), 10i64), (Some(2), 20), (Some(3), 30)];

        let err = pair_by_subject(&parents, &children).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::FanOutMismatch {
                parents: 2,
                children: 3
            }
        ));
    }

    #[test]
    fn test_pair_by_subject_unmatched_key() {
        let parents = [(Some(1), 100), (Some(2), 200)];
        let children = [(Some(1), 10i64), (Some(4), 40)];

        let err = pair_by_subject(&parents, &children).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::UnpairedSubject { subject_id: Some(4) }
        ));
    }

    #[test]
    fn test_pair_by_subject_ignores_order() {
        let parents = [(Some(2), 200), (Some(1), 100)];
        let children = [(Some(1), 10i64), (Some(2), 20)];

        let pairs = pair_by_subject(&parents, &children).unwrap();
        assert_eq!(pairs, vec![(10, 100), (20, 200)]);
    }
}
