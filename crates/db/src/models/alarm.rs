//! Alarm entity model.

use serde::Serialize;
use sqlx::FromRow;

use sitewatch_core::status::AlarmSeverity;
use sitewatch_core::types::{DbId, Timestamp};

/// A row from the `alarms` table.
///
/// Lifecycle: created unresolved, optionally acknowledged, eventually
/// resolved. Resolution does not require prior acknowledgment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alarm {
    pub id: DbId,
    pub system_id: DbId,
    pub severity: String,
    pub message: String,
    pub acknowledged: bool,
    pub acknowledged_at: Option<Timestamp>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Alarm {
    pub fn severity(&self) -> AlarmSeverity {
        AlarmSeverity::parse(&self.severity).unwrap_or(AlarmSeverity::Warning)
    }
}
