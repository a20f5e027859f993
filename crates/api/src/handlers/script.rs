//! Handler for the parser-script test endpoint.
//!
//! Script failures are data on this endpoint, not HTTP errors: operators
//! iterate on a script in the configuration UI and need the failure text,
//! so everything past input validation returns 200.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sitewatch_core::script;
use sitewatch_core::telemetry::FieldValue;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for POST /scripts/test.
#[derive(Debug, Deserialize)]
pub struct ScriptTestRequest {
    pub code: String,
    pub raw: String,
}

/// Response for POST /scripts/test.
#[derive(Debug, Serialize)]
pub struct ScriptTestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BTreeMap<String, FieldValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /scripts/test
pub async fn test_script(
    State(state): State<AppState>,
    Json(input): Json<ScriptTestRequest>,
) -> AppResult<Json<ScriptTestResponse>> {
    if input.code.trim().is_empty() {
        return Err(AppError::BadRequest("code is required".to_string()));
    }
    if input.raw.is_empty() {
        return Err(AppError::BadRequest("raw is required".to_string()));
    }

    let response =
        match script::run_parser_script(&input.code, &input.raw, state.config.script_timeout).await
        {
            Ok(result) => ScriptTestResponse {
                success: true,
                result: Some(result),
                error: None,
            },
            Err(err) => ScriptTestResponse {
                success: false,
                result: None,
                error: Some(err.to_string()),
            },
        };
    Ok(Json(response))
}
