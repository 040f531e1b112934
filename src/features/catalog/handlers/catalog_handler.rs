use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::catalog::dtos::{CategoryTreeDto, SubjectDto, SubjectQuery};
use crate::features::catalog::services::Catalog;
use crate::shared::types::ApiResponse;

/// List report categories with their sub-categories
#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    responses(
        (status = 200, description = "Category tree", body = ApiResponse<Vec<CategoryTreeDto>>),
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(catalog): State<Arc<dyn Catalog>>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeDto>>>> {
    let categories = catalog.categories().await?;
    let sub_categories = catalog.sub_categories().await?;
    let tree = CategoryTreeDto::build_tree(categories, sub_categories);
    Ok(Json(ApiResponse::success(Some(tree), None, None)))
}

/// List subjects, optionally for one grade level
#[utoipa::path(
    get,
    path = "/api/catalog/subjects",
    params(SubjectQuery),
    responses(
        (status = 200, description = "Subjects", body = ApiResponse<Vec<SubjectDto>>),
    ),
    tag = "catalog"
)]
pub async fn list_subjects(
    State(catalog): State<Arc<dyn Catalog>>,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<ApiResponse<Vec<SubjectDto>>>> {
    let subjects = catalog
        .subjects(query.grade_level_id)
        .await?
        .into_iter()
        .map(SubjectDto::from)
        .collect();
    Ok(Json(ApiResponse::success(Some(subjects), None, None)))
}
