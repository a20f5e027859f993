//! Repository for the `metrics` table.
//!
//! Rows are created and reconciled only by the metric synchronizer;
//! `value` and `trend` are written only by telemetry processing.

use sqlx::PgPool;

use sitewatch_core::types::DbId;

use crate::models::metric::Metric;

/// Column list for `metrics` queries.
const COLUMNS: &str = "\
    id, system_id, name, value, raw_value, unit, display_min, display_max, \
    warning_threshold, critical_threshold, trend, updated_at";

/// Display-cache fields written during config reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDisplayFields {
    pub unit: String,
    pub display_min: Option<f64>,
    pub display_max: Option<f64>,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
}

/// Provides metric row access scoped per system.
pub struct MetricRepo;

impl MetricRepo {
    /// List all metrics of a system in name order.
    pub async fn list_for_system(
        pool: &PgPool,
        system_id: DbId,
    ) -> Result<Vec<Metric>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM metrics WHERE system_id = $1 ORDER BY name");
        sqlx::query_as::<_, Metric>(&query)
            .bind(system_id)
            .fetch_all(pool)
            .await
    }

    /// Find a metric by its name within a system.
    pub async fn get_by_name(
        pool: &PgPool,
        system_id: DbId,
        name: &str,
    ) -> Result<Option<Metric>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM metrics WHERE system_id = $1 AND name = $2");
        sqlx::query_as::<_, Metric>(&query)
            .bind(system_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Create a metric for a newly configured display item. Value starts
    /// at 0 and trend unset; telemetry owns both from here on.
    pub async fn create(
        pool: &PgPool,
        system_id: DbId,
        name: &str,
        display: &MetricDisplayFields,
    ) -> Result<Metric, sqlx::Error> {
        let query = format!(
            "INSERT INTO metrics \
                (system_id, name, value, unit, display_min, display_max, \
                 warning_threshold, critical_threshold) \
             VALUES ($1, $2, 0, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Metric>(&query)
            .bind(system_id)
            .bind(name)
            .bind(&display.unit)
            .bind(display.display_min)
            .bind(display.display_max)
            .bind(display.warning_threshold)
            .bind(display.critical_threshold)
            .fetch_one(pool)
            .await
    }

    /// Update only the display-cache fields of an existing metric,
    /// leaving `value` and `trend` untouched.
    pub async fn update_display(
        pool: &PgPool,
        id: DbId,
        display: &MetricDisplayFields,
    ) -> Result<Option<Metric>, sqlx::Error> {
        let query = format!(
            "UPDATE metrics SET \
                unit = $2, display_min = $3, display_max = $4, \
                warning_threshold = $5, critical_threshold = $6, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Metric>(&query)
            .bind(id)
            .bind(&display.unit)
            .bind(display.display_min)
            .bind(display.display_max)
            .bind(display.warning_threshold)
            .bind(display.critical_threshold)
            .fetch_optional(pool)
            .await
    }

    /// Record a fresh telemetry sample.
    pub async fn update_value(
        pool: &PgPool,
        id: DbId,
        value: f64,
        raw_value: &str,
        trend: &str,
    ) -> Result<Option<Metric>, sqlx::Error> {
        let query = format!(
            "UPDATE metrics SET value = $2, raw_value = $3, trend = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Metric>(&query)
            .bind(id)
            .bind(value)
            .bind(raw_value)
            .bind(trend)
            .fetch_optional(pool)
            .await
    }
}
