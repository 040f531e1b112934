use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::assignments::handlers;
use crate::features::assignments::services::DistributionService;

/// Create routes for the report assignment feature
pub fn routes(service: Arc<DistributionService>) -> Router {
    Router::new()
        .route("/api/report-assignments", post(handlers::submit_assignment))
        .route("/api/report-assignments/given", get(handlers::list_given))
        .route("/api/report-assignments/received", get(handlers::list_received))
        .route(
            "/api/report-assignments/{id}",
            get(handlers::get_assignment).put(handlers::update_assignment),
        )
        .route(
            "/api/report-assignments/{id}/distribute",
            post(handlers::distribute_assignment),
        )
        .route(
            "/api/report-assignments/{id}/parent",
            put(handlers::link_parent),
        )
        .with_state(service)
}
