//! Handlers for the flat key/value settings endpoints.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use sitewatch_db::models::setting::{KEY_AUDIO_ENABLED, KEY_MUTE_END_TIME};
use sitewatch_db::repositories::SettingRepo;
use sitewatch_events::NotificationEvent;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /settings
pub async fn list_settings(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BTreeMap<String, String>>>> {
    let settings = SettingRepo::list(&state.pool).await?;
    let map = settings.into_iter().map(|s| (s.key, s.value)).collect();
    Ok(Json(DataResponse { data: map }))
}

/// PUT /settings
///
/// Upserts every key in the body. Touching an audio key additionally asks
/// the siren path to re-derive its state from the fresh values.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<BTreeMap<String, String>>,
) -> AppResult<Json<DataResponse<BTreeMap<String, String>>>> {
    if input.is_empty() {
        return Err(AppError::BadRequest("no settings provided".to_string()));
    }
    for (key, value) in &input {
        SettingRepo::upsert(&state.pool, key, value).await?;
    }

    state
        .event_bus
        .publish(NotificationEvent::settings_changed(json!(input)));
    if input.contains_key(KEY_AUDIO_ENABLED) || input.contains_key(KEY_MUTE_END_TIME) {
        state.event_bus.publish(NotificationEvent::siren_resync());
    }

    let settings = SettingRepo::list(&state.pool).await?;
    let map = settings.into_iter().map(|s| (s.key, s.value)).collect();
    Ok(Json(DataResponse { data: map }))
}
