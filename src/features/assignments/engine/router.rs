use serde::Serialize;
use utoipa::ToSchema;

/// Whether a submit action mutates an existing row or creates new ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Update {
        #[serde(rename = "assignmentId")]
        assignment_id: i64,
    },
    CreateChildren {
        #[serde(rename = "ancestorId")]
        ancestor_id: Option<i64>,
    },
}

/// An explicit edit always updates in place. Distributing an ancestor's
/// assignment onward never touches the ancestor row.
pub fn route(
    editing_assignment_id: Option<i64>,
    is_explicit_edit: bool,
    is_distribution_from_ancestor: bool,
) -> RouteDecision {
    match editing_assignment_id {
        None => RouteDecision::CreateChildren { ancestor_id: None },
        Some(assignment_id) if is_explicit_edit => RouteDecision::Update { assignment_id },
        Some(ancestor_id) if is_distribution_from_ancestor => RouteDecision::CreateChildren {
            ancestor_id: Some(ancestor_id),
        },
        Some(assignment_id) => RouteDecision::Update { assignment_id },
    }
}
