//! Flat key/value settings and the audio/mute snapshot derived from them.

use serde::Serialize;
use sqlx::FromRow;

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Settings key enabling/disabling the siren audio path.
pub const KEY_AUDIO_ENABLED: &str = "audioEnabled";

/// Settings key holding the mute expiry as an epoch-millisecond string.
pub const KEY_MUTE_END_TIME: &str = "muteEndTime";

/// Point-in-time snapshot of the audio/mute settings.
///
/// Fetched fresh at the start of each siren actuation rather than cached,
/// so concurrent settings writes are never observed stale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudioSettings {
    pub audio_enabled: bool,
    /// Epoch milliseconds; audio is muted while `now < mute_end_time`.
    pub mute_end_time: Option<i64>,
}

impl AudioSettings {
    /// Build a snapshot from raw settings rows. Missing keys default to
    /// audio enabled, no mute.
    pub fn from_rows(rows: &[Setting]) -> Self {
        let mut audio_enabled = true;
        let mut mute_end_time = None;
        for row in rows {
            match row.key.as_str() {
                KEY_AUDIO_ENABLED => audio_enabled = row.value != "false",
                KEY_MUTE_END_TIME => mute_end_time = row.value.parse::<i64>().ok(),
                _ => {}
            }
        }
        Self {
            audio_enabled,
            mute_end_time,
        }
    }

    /// Whether the siren should actually sound at `now_ms`.
    pub fn audible_at(&self, now_ms: i64) -> bool {
        if !self.audio_enabled {
            return false;
        }
        match self.mute_end_time {
            Some(end) => now_ms >= end,
            None => true,
        }
    }
}
