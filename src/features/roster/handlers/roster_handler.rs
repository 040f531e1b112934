use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::roster::dtos::{RosterEntryDto, TeacherRosterQuery};
use crate::features::roster::services::RosterSource;
use crate::shared::types::{ApiResponse, Meta};

/// List teachers, optionally for a single grade level
#[utoipa::path(
    get,
    path = "/api/roster/teachers",
    params(TeacherRosterQuery),
    responses(
        (status = 200, description = "Teacher roster", body = ApiResponse<Vec<RosterEntryDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "roster"
)]
pub async fn list_teachers(
    State(source): State<Arc<dyn RosterSource>>,
    Query(query): Query<TeacherRosterQuery>,
) -> Result<Json<ApiResponse<Vec<RosterEntryDto>>>> {
    let teachers: Vec<RosterEntryDto> = source
        .teachers(query.grade_level_id)
        .await?
        .into_iter()
        .map(RosterEntryDto::from)
        .collect();
    let total = teachers.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(teachers),
        None,
        Some(Meta::total(total)),
    )))
}

/// List coordinators
#[utoipa::path(
    get,
    path = "/api/roster/coordinators",
    responses(
        (status = 200, description = "Coordinator roster", body = ApiResponse<Vec<RosterEntryDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "roster"
)]
pub async fn list_coordinators(
    State(source): State<Arc<dyn RosterSource>>,
) -> Result<Json<ApiResponse<Vec<RosterEntryDto>>>> {
    let coordinators: Vec<RosterEntryDto> = source
        .coordinators()
        .await?
        .into_iter()
        .map(RosterEntryDto::from)
        .collect();
    let total = coordinators.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(coordinators),
        None,
        Some(Meta::total(total)),
    )))
}
