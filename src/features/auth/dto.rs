use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::{AuthenticatedUser, UserRole};

/// DTO for /auth/me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponseDto {
    pub user_id: i64,
    pub sub: String,
    pub role: Option<UserRole>,
    pub roles: Vec<String>,
    pub can_distribute: bool,
}

impl From<AuthenticatedUser> for MeResponseDto {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            role: user.role(),
            can_distribute: user.can_distribute(),
            user_id: user.user_id,
            sub: user.sub,
            roles: user.roles,
        }
    }
}
