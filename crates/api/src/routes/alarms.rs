//! Route definitions for alarm endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alarm;
use crate::state::AppState;

/// Routes mounted at `/alarms`.
///
/// ```text
/// GET  /alarms                   -> list_alarms
/// POST /alarms/{id}/acknowledge  -> acknowledge_alarm
/// POST /alarms/acknowledge-all   -> acknowledge_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alarms", get(alarm::list_alarms))
        .route("/alarms/{id}/acknowledge", post(alarm::acknowledge_alarm))
        .route("/alarms/acknowledge-all", post(alarm::acknowledge_all))
}
