use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_COORDINATOR, ROLE_PRINCIPAL, ROLE_TEACHER};

/// Role of a user in the school hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Teacher,
    Coordinator,
    Principal,
    Admin,
}

impl UserRole {
    /// Principals and admins hand out reports with full authority
    pub fn has_principal_authority(&self) -> bool {
        matches!(self, UserRole::Principal | UserRole::Admin)
    }

    /// Roles allowed to create or distribute report assignments
    pub fn can_distribute(&self) -> bool {
        !matches!(self, UserRole::Teacher)
    }

    fn rank(&self) -> u8 {
        match self {
            UserRole::Teacher => 0,
            UserRole::Coordinator => 1,
            UserRole::Principal => 2,
            UserRole::Admin => 3,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserRole::Teacher => ROLE_TEACHER,
            UserRole::Coordinator => ROLE_COORDINATOR,
            UserRole::Principal => ROLE_PRINCIPAL,
            UserRole::Admin => ROLE_ADMIN,
        };
        f.write_str(name)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_TEACHER => Ok(UserRole::Teacher),
            ROLE_COORDINATOR => Ok(UserRole::Coordinator),
            ROLE_PRINCIPAL => Ok(UserRole::Principal),
            ROLE_ADMIN => Ok(UserRole::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Numeric user id in the school database
    pub user_id: i64,
    pub sub: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Highest recognised role carried by the token
    pub fn role(&self) -> Option<UserRole> {
        self.roles
            .iter()
            .filter_map(|r| r.parse::<UserRole>().ok())
            .max_by_key(|r| r.rank())
    }

    pub fn can_distribute(&self) -> bool {
        self.role().map(|r| r.can_distribute()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 7,
            sub: "sub-7".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_role_picks_highest() {
        let user = user_with(&["teacher", "coordinator"]);
        assert_eq!(user.role(), Some(UserRole::Coordinator));
    }

    #[test]
    fn test_role_ignores_unknown() {
        let user = user_with(&["librarian"]);
        assert_eq!(user.role(), None);
        assert!(!user.can_distribute());
    }

    #[test]
    fn test_teacher_cannot_distribute() {
        assert!(!user_with(&["teacher"]).can_distribute());
        assert!(user_with(&["Principal"]).can_distribute());
    }
}
