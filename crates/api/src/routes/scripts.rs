//! Route definitions for parser-script endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::script;
use crate::state::AppState;

/// Routes mounted at `/scripts`.
///
/// ```text
/// POST /scripts/test  -> test_script
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/scripts/test", post(script::test_script))
}
