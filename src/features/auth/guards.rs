//! Role guards for report assignment endpoints.
//!
//! Hierarchy (highest first): admin, principal, coordinator, teacher.
//! Teachers only fill reports; every other role may hand reports down.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for users allowed to create and distribute report assignments.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireDistributor(user): RequireDistributor) { ... }
/// ```
pub struct RequireDistributor(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireDistributor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.can_distribute() {
            return Err(AppError::Forbidden(
                "Only principals and coordinators can distribute reports".to_string(),
            ));
        }

        Ok(RequireDistributor(user.clone()))
    }
}
