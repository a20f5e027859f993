//! Repository for the `systems` table.

use sqlx::PgPool;

use sitewatch_core::status::SystemStatus;
use sitewatch_core::types::DbId;

use crate::models::system::{CreateSystem, System, UpdateSystem};

/// Column list for `systems` queries.
const COLUMNS: &str = "\
    id, name, kind, status, is_enabled, is_active, config, \
    port, protocol, created_at, updated_at";

/// Provides CRUD and status operations for monitored systems.
pub struct SystemRepo;

impl SystemRepo {
    /// List all non-deleted systems, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<System>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM systems WHERE is_active = TRUE ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, System>(&query).fetch_all(pool).await
    }

    /// Get a single system by ID (including soft-deleted rows).
    pub async fn get_by_id(pool: &PgPool, id: DbId) -> Result<Option<System>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM systems WHERE id = $1");
        sqlx::query_as::<_, System>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new system. Status starts as `offline` until first data.
    pub async fn create(pool: &PgPool, dto: &CreateSystem) -> Result<System, sqlx::Error> {
        let query = format!(
            "INSERT INTO systems (name, kind, config, port, protocol) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, System>(&query)
            .bind(&dto.name)
            .bind(dto.kind.as_str())
            .bind(&dto.config)
            .bind(dto.port)
            .bind(&dto.protocol)
            .fetch_one(pool)
            .await
    }

    /// Update a system. Absent DTO fields are left unchanged.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateSystem,
    ) -> Result<Option<System>, sqlx::Error> {
        let query = format!(
            "UPDATE systems SET \
                name = COALESCE($2, name), \
                config = COALESCE($3, config), \
                port = COALESCE($4, port), \
                protocol = COALESCE($5, protocol), \
                is_enabled = COALESCE($6, is_enabled), \
                updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, System>(&query)
            .bind(id)
            .bind(&dto.name)
            .bind(&dto.config)
            .bind(dto.port)
            .bind(&dto.protocol)
            .bind(dto.is_enabled)
            .fetch_optional(pool)
            .await
    }

    /// Persist a new overall status. Returns false if the system is gone.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: SystemStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE systems SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a system. Returns true if a row was marked.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE systems SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Systems eligible for offline alarm creation: enabled, active, and
    /// currently offline.
    pub async fn list_offline_candidates(pool: &PgPool) -> Result<Vec<System>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM systems \
             WHERE is_enabled = TRUE AND is_active = TRUE AND status = 'offline'"
        );
        sqlx::query_as::<_, System>(&query).fetch_all(pool).await
    }
}
