use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::catalog::handlers;
use crate::features::catalog::services::Catalog;

/// Create routes for the catalog feature
///
/// Note: This feature is public (no authentication required)
pub fn routes(catalog: Arc<dyn Catalog>) -> Router {
    Router::new()
        .route("/api/catalog/categories", get(handlers::list_categories))
        .route("/api/catalog/subjects", get(handlers::list_subjects))
        .with_state(catalog)
}
