//! Monitored system entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use sitewatch_core::config::SystemConfig;
use sitewatch_core::status::{SystemKind, SystemStatus};
use sitewatch_core::types::{DbId, Timestamp};
use sitewatch_core::CoreError;

/// A row from the `systems` table.
///
/// `kind` and `status` are stored as TEXT; use [`System::kind`] and
/// [`System::status`] for the typed views.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct System {
    pub id: DbId,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub is_enabled: bool,
    pub is_active: bool,
    pub config: serde_json::Value,
    pub port: Option<i32>,
    pub protocol: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl System {
    /// Typed system kind. The CHECK constraint makes unknown values
    /// unreachable for rows written through this crate.
    pub fn kind(&self) -> SystemKind {
        SystemKind::parse(&self.kind).unwrap_or(SystemKind::Equipment)
    }

    /// Typed current status.
    pub fn status(&self) -> SystemStatus {
        SystemStatus::parse(&self.status).unwrap_or(SystemStatus::Offline)
    }

    /// Parse the stored config blob for this system's kind.
    pub fn parsed_config(&self) -> Result<SystemConfig, CoreError> {
        SystemConfig::from_value(self.kind(), &self.config)
    }
}

/// DTO for creating a system.
#[derive(Debug, Deserialize)]
pub struct CreateSystem {
    pub name: String,
    pub kind: SystemKind,
    #[serde(default)]
    pub config: serde_json::Value,
    pub port: Option<i32>,
    pub protocol: Option<String>,
}

/// DTO for updating a system. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSystem {
    pub name: Option<String>,
    pub config: Option<serde_json::Value>,
    pub port: Option<i32>,
    pub protocol: Option<String>,
    pub is_enabled: Option<bool>,
}
