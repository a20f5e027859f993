//! Route definitions for monitored-system endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::system;
use crate::state::AppState;

/// Routes mounted at `/systems`.
///
/// ```text
/// GET    /systems                    -> list_systems
/// POST   /systems                    -> create_system
/// GET    /systems/{id}               -> get_system
/// PUT    /systems/{id}               -> update_system
/// DELETE /systems/{id}               -> delete_system
/// POST   /systems/{id}/recompute     -> recompute_status
/// POST   /systems/{id}/sync-metrics  -> sync_metrics
/// POST   /systems/{id}/telemetry     -> ingest_telemetry
/// GET    /systems/{id}/metrics       -> list_metrics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/systems", get(system::list_systems).post(system::create_system))
        .route(
            "/systems/{id}",
            get(system::get_system)
                .put(system::update_system)
                .delete(system::delete_system),
        )
        .route("/systems/{id}/recompute", post(system::recompute_status))
        .route("/systems/{id}/sync-metrics", post(system::sync_metrics))
        .route("/systems/{id}/telemetry", post(system::ingest_telemetry))
        .route("/systems/{id}/metrics", get(system::list_metrics))
}
