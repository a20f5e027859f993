//! Repository for the `alarms` table.

use sqlx::PgPool;

use sitewatch_core::status::AlarmSeverity;
use sitewatch_core::types::DbId;

use crate::models::alarm::Alarm;

/// Column list for `alarms` queries.
const COLUMNS: &str = "\
    id, system_id, severity, message, acknowledged, \
    acknowledged_at, acknowledged_by, resolved_at, created_at";

/// Provides alarm lifecycle persistence.
pub struct AlarmRepo;

impl AlarmRepo {
    /// List alarms, newest first, optionally restricted to unresolved.
    pub async fn list(
        pool: &PgPool,
        unresolved_only: bool,
        limit: i64,
    ) -> Result<Vec<Alarm>, sqlx::Error> {
        let filter = if unresolved_only {
            "WHERE resolved_at IS NULL"
        } else {
            ""
        };
        let query =
            format!("SELECT {COLUMNS} FROM alarms {filter} ORDER BY created_at DESC LIMIT $1");
        sqlx::query_as::<_, Alarm>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Get a single alarm by ID.
    pub async fn get_by_id(pool: &PgPool, id: DbId) -> Result<Option<Alarm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alarms WHERE id = $1");
        sqlx::query_as::<_, Alarm>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new unresolved alarm.
    pub async fn create(
        pool: &PgPool,
        system_id: DbId,
        severity: AlarmSeverity,
        message: &str,
    ) -> Result<Alarm, sqlx::Error> {
        let query = format!(
            "INSERT INTO alarms (system_id, severity, message) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(system_id)
            .bind(severity.as_str())
            .bind(message)
            .fetch_one(pool)
            .await
    }

    /// Acknowledge a single alarm.
    ///
    /// Idempotent: re-acknowledging keeps the original timestamp and
    /// actor, and acknowledging a resolved alarm never touches
    /// `resolved_at`. Returns the row as it stands after the call, or
    /// `None` if the alarm does not exist.
    pub async fn acknowledge(
        pool: &PgPool,
        id: DbId,
        actor: &str,
    ) -> Result<Option<Alarm>, sqlx::Error> {
        let query = format!(
            "UPDATE alarms SET \
                acknowledged = TRUE, \
                acknowledged_at = COALESCE(acknowledged_at, NOW()), \
                acknowledged_by = COALESCE(acknowledged_by, $2) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(id)
            .bind(actor)
            .fetch_optional(pool)
            .await
    }

    /// Acknowledge every unresolved, unacknowledged alarm in one
    /// predicate-scoped UPDATE, so alarms created between a read and a
    /// write can never be silently half-acknowledged. Returns the ids of
    /// the rows that changed.
    pub async fn acknowledge_all(pool: &PgPool, actor: &str) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "UPDATE alarms SET \
                acknowledged = TRUE, acknowledged_at = NOW(), acknowledged_by = $1 \
             WHERE resolved_at IS NULL AND acknowledged = FALSE \
             RETURNING id",
        )
        .bind(actor)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Resolve every unresolved alarm of a system. Returns the number of
    /// rows resolved.
    pub async fn resolve_for_system(pool: &PgPool, system_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE alarms SET resolved_at = NOW() \
             WHERE system_id = $1 AND resolved_at IS NULL",
        )
        .bind(system_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Whether any unresolved, unacknowledged alarm exists anywhere.
    /// The siren actuation path sounds while this is true.
    pub async fn any_unacknowledged(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(\
                SELECT 1 FROM alarms \
                WHERE resolved_at IS NULL AND acknowledged = FALSE\
             )",
        )
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Whether an unresolved alarm with this exact message already exists
    /// for the system. Used to deduplicate per-cause alarms (offline
    /// detection in particular).
    pub async fn exists_unresolved(
        pool: &PgPool,
        system_id: DbId,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(\
                SELECT 1 FROM alarms \
                WHERE system_id = $1 AND message = $2 AND resolved_at IS NULL\
             )",
        )
        .bind(system_id)
        .bind(message)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
