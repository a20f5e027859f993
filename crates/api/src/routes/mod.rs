pub mod alarms;
pub mod health;
pub mod scripts;
pub mod settings;
pub mod systems;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                              viewer WebSocket
///
/// /systems                         list, create
/// /systems/{id}                    get, update, delete
/// /systems/{id}/recompute          recompute overall status (POST)
/// /systems/{id}/sync-metrics       sync metric rows from config (POST)
/// /systems/{id}/telemetry          ingest a raw line (POST)
/// /systems/{id}/metrics            current metric rows (GET)
///
/// /alarms                          list (?unresolved, limit)
/// /alarms/{id}/acknowledge         acknowledge one (POST)
/// /alarms/acknowledge-all          acknowledge everything pending (POST)
///
/// /scripts/test                    dry-run a parser script (POST)
///
/// /settings                        flat key/value map (GET, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(systems::router())
        .merge(alarms::router())
        .merge(scripts::router())
        .merge(settings::router())
}
