use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::assignments::dtos::{
    AssignmentDetailDto, AssignmentResponseDto, DistributeAssignmentDto, DistributionOutcomeDto,
    LinkParentDto, SubmitAssignmentDto, SubmitOutcomeDto, UpdateAssignmentDto, UpdateOutcomeDto,
};
use crate::features::assignments::engine::Actor;
use crate::features::assignments::services::DistributionService;
use crate::features::auth::guards::RequireDistributor;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

fn actor_of(user: &AuthenticatedUser) -> Result<Actor> {
    let role = user
        .role()
        .ok_or_else(|| AppError::Forbidden("No school role assigned".to_string()))?;
    Ok(Actor {
        id: user.user_id,
        role,
    })
}

/// Submit the report assignment form
///
/// Creates new assignments, distributes the opened assignment onward, or
/// updates it in place, depending on the action and who is submitting.
#[utoipa::path(
    post,
    path = "/api/report-assignments",
    request_body = SubmitAssignmentDto,
    responses(
        (status = 200, description = "Submission processed", body = ApiResponse<SubmitOutcomeDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not allowed to distribute"),
        (status = 409, description = "Subject batches do not pair up")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn submit_assignment(
    State(service): State<Arc<DistributionService>>,
    RequireDistributor(user): RequireDistributor,
    AppJson(dto): AppJson<SubmitAssignmentDto>,
) -> Result<Json<ApiResponse<SubmitOutcomeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = service.submit(actor_of(&user)?, &dto).await?;
    let message = outcome.status().message().to_string();
    Ok(Json(ApiResponse::success(Some(outcome), Some(message), None)))
}

/// Edit an assignment in place (author only)
#[utoipa::path(
    put,
    path = "/api/report-assignments/{id}",
    params(("id" = i64, Path, description = "Report assignment ID")),
    request_body = UpdateAssignmentDto,
    responses(
        (status = 200, description = "Assignment updated", body = ApiResponse<UpdateOutcomeDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Assignment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn update_assignment(
    State(service): State<Arc<DistributionService>>,
    RequireDistributor(user): RequireDistributor,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateAssignmentDto>,
) -> Result<Json<ApiResponse<UpdateOutcomeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = service.update(actor_of(&user)?, id, &dto).await?;
    let message = outcome.status.message().to_string();
    Ok(Json(ApiResponse::success(Some(outcome), Some(message), None)))
}

/// Distribute an assignment onward to the caller's own recipients
#[utoipa::path(
    post,
    path = "/api/report-assignments/{id}/distribute",
    params(("id" = i64, Path, description = "Report assignment ID to distribute")),
    request_body = DistributeAssignmentDto,
    responses(
        (status = 200, description = "Child assignments created", body = ApiResponse<DistributionOutcomeDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not a recipient or author"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Subject batches do not pair up")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn distribute_assignment(
    State(service): State<Arc<DistributionService>>,
    RequireDistributor(user): RequireDistributor,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<DistributeAssignmentDto>,
) -> Result<Json<ApiResponse<DistributionOutcomeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = service.distribute(actor_of(&user)?, id, &dto).await?;
    let message = outcome.status.message().to_string();
    Ok(Json(ApiResponse::success(Some(outcome), Some(message), None)))
}

/// Retry linking an assignment to its parent
#[utoipa::path(
    put,
    path = "/api/report-assignments/{id}/parent",
    params(("id" = i64, Path, description = "Child report assignment ID")),
    request_body = LinkParentDto,
    responses(
        (status = 200, description = "Assignment linked", body = ApiResponse<AssignmentResponseDto>),
        (status = 400, description = "Invalid parent"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Assignment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn link_parent(
    State(service): State<Arc<DistributionService>>,
    RequireDistributor(user): RequireDistributor,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<LinkParentDto>,
) -> Result<Json<ApiResponse<AssignmentResponseDto>>> {
    let assignment = service.relink(actor_of(&user)?, id, dto.parent_id).await?;
    Ok(Json(ApiResponse::success(
        Some(assignment),
        Some("Assignment linked".to_string()),
        None,
    )))
}

/// Get an assignment with its submissions and direct children
#[utoipa::path(
    get,
    path = "/api/report-assignments/{id}",
    params(("id" = i64, Path, description = "Report assignment ID")),
    responses(
        (status = 200, description = "Assignment detail", body = ApiResponse<AssignmentDetailDto>),
        (status = 403, description = "No access"),
        (status = 404, description = "Assignment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn get_assignment(
    State(service): State<Arc<DistributionService>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AssignmentDetailDto>>> {
    let detail = service.detail(actor_of(&user)?, id).await?;
    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

/// List assignments the caller handed out
#[utoipa::path(
    get,
    path = "/api/report-assignments/given",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Assignments given", body = ApiResponse<Vec<AssignmentResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn list_given(
    State(service): State<Arc<DistributionService>>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AssignmentResponseDto>>>> {
    let (items, total) = service.list_given(actor_of(&user)?, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paged(total, &pagination)),
    )))
}

/// List assignments the caller has to fill
#[utoipa::path(
    get,
    path = "/api/report-assignments/received",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Assignments received", body = ApiResponse<Vec<AssignmentResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "report-assignments"
)]
pub async fn list_received(
    State(service): State<Arc<DistributionService>>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AssignmentResponseDto>>>> {
    let (items, total) = service
        .list_received(actor_of(&user)?, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paged(total, &pagination)),
    )))
}
