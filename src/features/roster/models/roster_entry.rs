use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

/// A user as listed by the teacher or coordinator roster
#[derive(Debug, Clone, FromRow)]
pub struct RosterEntry {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub grade_level_id: Option<i64>,
}

/// How a recipient participates in a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecipientRole {
    Teacher,
    Coordinator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("User {0} is neither on the teacher nor the coordinator roster")]
pub struct UnknownUser(pub i64);

/// Snapshot of both rosters taken once per distribution action
#[derive(Debug, Clone, Default)]
pub struct Roster {
    teachers: Vec<RosterEntry>,
    coordinators: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(teachers: Vec<RosterEntry>, coordinators: Vec<RosterEntry>) -> Self {
        Self {
            teachers,
            coordinators,
        }
    }

    /// Resolve the recipient role of `user_id`.
    ///
    /// The teacher list is consulted first, so a user holding both a grade
    /// assignment and a coordinator assignment is a teacher here. Ids on
    /// neither list fail closed.
    pub fn classify(&self, user_id: i64) -> Result<RecipientRole, UnknownUser> {
        if self.teachers.iter().any(|t| t.id == user_id) {
            return Ok(RecipientRole::Teacher);
        }
        if self.coordinators.iter().any(|c| c.id == user_id) {
            return Ok(RecipientRole::Coordinator);
        }
        Err(UnknownUser(user_id))
    }

    pub fn teachers(&self) -> &[RosterEntry] {
        &self.teachers
    }

    pub fn coordinators(&self) -> &[RosterEntry] {
        &self.coordinators
    }
}
