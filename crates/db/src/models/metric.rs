//! Metric entity model.

use serde::Serialize;
use sqlx::FromRow;

use sitewatch_core::types::{DbId, Timestamp};

/// A row from the `metrics` table.
///
/// `warning_threshold` / `critical_threshold` are display caches derived
/// from the owning system's config; the authoritative rules live in the
/// config blob. `value` and `trend` are owned by telemetry processing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Metric {
    pub id: DbId,
    pub system_id: DbId,
    pub name: String,
    pub value: f64,
    /// Raw string form of the last sample, used by string-valued equality
    /// conditions (status-code metrics).
    pub raw_value: String,
    pub unit: String,
    pub display_min: Option<f64>,
    pub display_max: Option<f64>,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub trend: Option<String>,
    pub updated_at: Timestamp,
}
