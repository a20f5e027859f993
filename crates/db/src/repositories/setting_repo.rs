//! Repository for the `settings` table.

use sqlx::PgPool;

use crate::models::setting::{AudioSettings, Setting, KEY_AUDIO_ENABLED, KEY_MUTE_END_TIME};

/// Provides flat key/value settings access.
pub struct SettingRepo;

impl SettingRepo {
    /// List all settings.
    pub async fn list(pool: &PgPool) -> Result<Vec<Setting>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(pool)
            .await
    }

    /// Get a single setting value.
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Insert or overwrite a setting.
    pub async fn upsert(pool: &PgPool, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch a fresh audio/mute snapshot. Called at the start of each
    /// siren actuation, never cached across operations.
    pub async fn audio_snapshot(pool: &PgPool) -> Result<AudioSettings, sqlx::Error> {
        let rows: Vec<Setting> = sqlx::query_as(
            "SELECT key, value FROM settings WHERE key = $1 OR key = $2",
        )
        .bind(KEY_AUDIO_ENABLED)
        .bind(KEY_MUTE_END_TIME)
        .fetch_all(pool)
        .await?;
        Ok(AudioSettings::from_rows(&rows))
    }
}
