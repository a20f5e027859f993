//! Handlers for monitored-system endpoints: CRUD, metric listing, and the
//! operational POST endpoints (recompute, sync-metrics, telemetry).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use sitewatch_core::config::SystemConfig;
use sitewatch_core::status::{SystemKind, SystemStatus};
use sitewatch_core::types::DbId;
use sitewatch_core::CoreError;
use sitewatch_db::models::metric::Metric;
use sitewatch_db::models::system::{CreateSystem, System, UpdateSystem};
use sitewatch_db::repositories::{MetricRepo, SystemRepo};
use sitewatch_events::NotificationEvent;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::services::{aggregator, ingest, metric_sync};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for creating a system.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSystemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: SystemKind,
    #[serde(default)]
    pub config: serde_json::Value,
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i32>,
    pub protocol: Option<String>,
}

/// Request body for updating a system. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSystemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub config: Option<serde_json::Value>,
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i32>,
    pub protocol: Option<String>,
    pub is_enabled: Option<bool>,
}

/// Request body for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryRequest {
    pub raw: String,
}

/// Response for the recompute endpoint.
#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<SystemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<SystemStatus>,
}

/// Response for the telemetry endpoint.
#[derive(Debug, Serialize)]
pub struct TelemetryResponse {
    pub updated: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<RecomputeResponse>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /systems
pub async fn list_systems(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<System>>>> {
    let systems = SystemRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: systems }))
}

/// POST /systems
///
/// The config blob is parsed up front so a malformed blob is rejected at
/// write time, and the system's metric rows are created from it.
pub async fn create_system(
    State(state): State<AppState>,
    Json(input): Json<CreateSystemRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<System>>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let config = SystemConfig::from_value(input.kind, &input.config)?;

    let system = SystemRepo::create(
        &state.pool,
        &CreateSystem {
            name: input.name,
            kind: input.kind,
            config: input.config,
            port: input.port,
            protocol: input.protocol,
        },
    )
    .await?;
    metric_sync::sync_metrics(&state.pool, system.id, &config).await?;

    tracing::info!(system_id = system.id, kind = %system.kind, "System created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: system })))
}

/// GET /systems/{id}
pub async fn get_system(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<System>>> {
    let system = fetch_active(&state, id).await?;
    Ok(Json(DataResponse { data: system }))
}

/// PUT /systems/{id}
///
/// A config change re-syncs the system's metric rows before returning.
pub async fn update_system(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSystemRequest>,
) -> AppResult<Json<DataResponse<System>>> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let existing = fetch_active(&state, id).await?;
    if let Some(config) = &input.config {
        // Reject a malformed blob before it is persisted.
        SystemConfig::from_value(existing.kind(), config)?;
    }
    let config_changed = input.config.is_some();

    let system = SystemRepo::update(
        &state.pool,
        id,
        &UpdateSystem {
            name: input.name,
            config: input.config,
            port: input.port,
            protocol: input.protocol,
            is_enabled: input.is_enabled,
        },
    )
    .await?
    .ok_or(CoreError::NotFound {
        entity: "System",
        id,
    })?;

    if config_changed {
        let config = system.parsed_config()?;
        metric_sync::sync_metrics(&state.pool, system.id, &config).await?;
    }
    Ok(Json(DataResponse { data: system }))
}

/// DELETE /systems/{id}
///
/// Soft delete; viewers are told to drop the system from their views.
pub async fn delete_system(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = SystemRepo::soft_delete(&state.pool, id).await?;
    if !deleted {
        return Err(CoreError::NotFound {
            entity: "System",
            id,
        }
        .into());
    }
    state
        .event_bus
        .publish(NotificationEvent::system_deleted(id));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /systems/{id}/recompute
pub async fn recompute_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RecomputeResponse>>> {
    fetch_active(&state, id).await?;
    let transition = aggregator::recompute_status(&state.pool, &state.event_bus, id).await?;
    Ok(Json(DataResponse {
        data: transition_response(transition),
    }))
}

/// POST /systems/{id}/sync-metrics
pub async fn sync_metrics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<metric_sync::SyncOutcome>>> {
    let system = fetch_active(&state, id).await?;
    let config = system.parsed_config()?;
    let outcome = metric_sync::sync_metrics(&state.pool, system.id, &config).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /systems/{id}/telemetry
pub async fn ingest_telemetry(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TelemetryRequest>,
) -> AppResult<Json<DataResponse<TelemetryResponse>>> {
    let system = fetch_active(&state, id).await?;
    if !system.is_enabled {
        return Err(AppError::Core(CoreError::Validation(
            "system is disabled".to_string(),
        )));
    }
    let outcome = ingest::apply_telemetry(
        &state.pool,
        &state.event_bus,
        &system,
        &input.raw,
        state.config.script_timeout,
    )
    .await?;
    Ok(Json(DataResponse {
        data: TelemetryResponse {
            updated: outcome.updated,
            transition: outcome
                .transition
                .map(|t| transition_response(Some(t))),
        },
    }))
}

/// GET /systems/{id}/metrics
pub async fn list_metrics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Metric>>>> {
    fetch_active(&state, id).await?;
    let metrics = MetricRepo::list_for_system(&state.pool, id).await?;
    Ok(Json(DataResponse { data: metrics }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a system by id, treating soft-deleted rows as absent.
async fn fetch_active(state: &AppState, id: DbId) -> AppResult<System> {
    let system = SystemRepo::get_by_id(&state.pool, id)
        .await?
        .filter(|s| s.is_active)
        .ok_or(CoreError::NotFound {
            entity: "System",
            id,
        })?;
    Ok(system)
}

fn transition_response(transition: Option<(SystemStatus, SystemStatus)>) -> RecomputeResponse {
    match transition {
        Some((from, to)) => RecomputeResponse {
            changed: true,
            from: Some(from),
            to: Some(to),
        },
        None => RecomputeResponse {
            changed: false,
            from: None,
            to: None,
        },
    }
}
