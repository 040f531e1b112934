use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::roster::models::RosterEntry;

/// Response DTO for a roster member
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntryDto {
    pub id: i64,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level_id: Option<i64>,
}

impl From<RosterEntry> for RosterEntryDto {
    fn from(e: RosterEntry) -> Self {
        Self {
            id: e.id,
            name: e.name,
            role: e.role,
            grade_level_id: e.grade_level_id,
        }
    }
}

/// Query params for the teacher roster
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRosterQuery {
    /// Only teachers assigned to this grade level
    pub grade_level_id: Option<i64>,
}
