//! Handlers for alarm endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use sitewatch_core::types::DbId;
use sitewatch_db::models::alarm::Alarm;
use sitewatch_db::repositories::AlarmRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::services::alarms;
use crate::state::AppState;

/// Query parameters for the alarm list endpoint.
#[derive(Debug, Deserialize)]
pub struct AlarmsQuery {
    /// Restrict to unresolved alarms (default: false).
    pub unresolved: Option<bool>,
    /// Maximum rows to return (default: 100, max: 500).
    pub limit: Option<i64>,
}

/// Request body for acknowledge endpoints.
#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub actor: String,
}

/// Response for the bulk acknowledge endpoint.
#[derive(Debug, Serialize)]
pub struct AcknowledgeAllResponse {
    pub count: u64,
}

/// GET /alarms
pub async fn list_alarms(
    State(state): State<AppState>,
    Query(query): Query<AlarmsQuery>,
) -> AppResult<Json<DataResponse<Vec<Alarm>>>> {
    let limit = query.limit.unwrap_or(100);
    if !(1..=500).contains(&limit) {
        return Err(AppError::BadRequest(
            "limit must be between 1 and 500".to_string(),
        ));
    }
    let alarms = AlarmRepo::list(&state.pool, query.unresolved.unwrap_or(false), limit).await?;
    Ok(Json(DataResponse { data: alarms }))
}

/// POST /alarms/{id}/acknowledge
pub async fn acknowledge_alarm(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AcknowledgeRequest>,
) -> AppResult<Json<DataResponse<Alarm>>> {
    let actor = require_actor(&input)?;
    let alarm = alarms::acknowledge(&state.pool, &state.event_bus, id, actor).await?;
    Ok(Json(DataResponse { data: alarm }))
}

/// POST /alarms/acknowledge-all
pub async fn acknowledge_all(
    State(state): State<AppState>,
    Json(input): Json<AcknowledgeRequest>,
) -> AppResult<Json<DataResponse<AcknowledgeAllResponse>>> {
    let actor = require_actor(&input)?;
    let count = alarms::acknowledge_all(&state.pool, &state.event_bus, actor).await?;
    Ok(Json(DataResponse {
        data: AcknowledgeAllResponse { count },
    }))
}

fn require_actor(input: &AcknowledgeRequest) -> AppResult<&str> {
    let actor = input.actor.trim();
    if actor.is_empty() {
        return Err(AppError::BadRequest("actor is required".to_string()));
    }
    Ok(actor)
}
