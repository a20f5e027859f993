//! Route definitions for settings endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET /settings  -> list_settings
/// PUT /settings  -> update_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/settings",
        get(settings::list_settings).put(settings::update_settings),
    )
}
