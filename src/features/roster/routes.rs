use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::roster::handlers;
use crate::features::roster::services::RosterSource;

/// Create routes for the roster feature (recipient pickers)
pub fn routes(source: Arc<dyn RosterSource>) -> Router {
    Router::new()
        .route("/api/roster/teachers", get(handlers::list_teachers))
        .route("/api/roster/coordinators", get(handlers::list_coordinators))
        .with_state(source)
}
