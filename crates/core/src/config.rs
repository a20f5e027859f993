//! Parsed per-system configuration.
//!
//! Systems store their configuration as a JSONB blob whose shape depends on
//! the system kind: equipment systems carry a raw-frame pattern list, while
//! UPS and sensor systems carry a delimiter plus an ordered display-item
//! list. The blob is parsed into [`SystemConfig`] exactly once at the
//! boundary and dispatched on from there, with no duck-typed field probing
//! downstream.

use serde::{Deserialize, Serialize};

use crate::condition::StatusConditions;
use crate::error::CoreError;
use crate::status::SystemKind;

/// One configured display item: how to extract and threshold a single
/// metric from raw telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayItem {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    /// Legacy scalar warning threshold.
    #[serde(default)]
    pub warning: Option<f64>,
    /// Legacy scalar critical threshold.
    #[serde(default)]
    pub critical: Option<f64>,
    /// Display scaling bounds for gauges.
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Condition-mode rule set. When present (and non-empty) it is
    /// authoritative and the legacy scalars are ignored.
    #[serde(default)]
    pub conditions: Option<StatusConditions>,
}

/// Representative thresholds cached on the metric row for at-a-glance
/// display. Derived, never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedThresholds {
    pub warning: Option<f64>,
    pub critical: Option<f64>,
}

impl DisplayItem {
    /// Whether this item thresholds via condition rules.
    pub fn uses_conditions(&self) -> bool {
        self.conditions.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Derive the cached thresholds for this item.
    ///
    /// Condition mode yields a single representative critical bound: the
    /// first `gte` bound across all tiers in priority order, falling back
    /// to the first condition's numeric bound. There is no representative
    /// warning threshold in condition mode (status is binary
    /// normal/critical). Legacy mode takes both scalars verbatim.
    pub fn derived_thresholds(&self) -> DerivedThresholds {
        match &self.conditions {
            Some(rules) if !rules.is_empty() => {
                let all = rules.tiers();
                let first_gte = all.iter().flat_map(|tier| tier.iter()).find_map(|c| {
                    matches!(c, crate::condition::ThresholdCondition::Gte { .. })
                        .then(|| c.numeric_bound())
                        .flatten()
                });
                let fallback = all
                    .iter()
                    .flat_map(|tier| tier.iter())
                    .find_map(|c| c.numeric_bound());
                DerivedThresholds {
                    warning: None,
                    critical: first_gte.or(fallback),
                }
            }
            _ => DerivedThresholds {
                warning: self.warning,
                critical: self.critical,
            },
        }
    }
}

/// Tagged union over the two config shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemConfig {
    /// Equipment systems: pattern list consumed by the ingestion transport.
    Equipment { patterns: Vec<String> },
    /// UPS / sensor systems: delimiter plus ordered display items.
    Metrics {
        delimiter: String,
        display_items: Vec<DisplayItem>,
        /// Optional user-supplied parsing script; when set it replaces the
        /// built-in delimiter parser.
        parser_script: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawEquipmentConfig {
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMetricsConfig {
    #[serde(default = "default_delimiter")]
    delimiter: String,
    #[serde(rename = "displayItems", default)]
    display_items: Vec<DisplayItem>,
    #[serde(rename = "parserScript", default)]
    parser_script: Option<String>,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl SystemConfig {
    /// Parse a stored config blob for a system of the given kind.
    pub fn from_value(kind: SystemKind, value: &serde_json::Value) -> Result<Self, CoreError> {
        match kind {
            SystemKind::Equipment => {
                let raw: RawEquipmentConfig = serde_json::from_value(value.clone())
                    .map_err(|e| CoreError::Validation(format!("invalid equipment config: {e}")))?;
                Ok(Self::Equipment {
                    patterns: raw.patterns,
                })
            }
            SystemKind::Ups | SystemKind::Sensor => {
                let raw: RawMetricsConfig = serde_json::from_value(value.clone())
                    .map_err(|e| CoreError::Validation(format!("invalid metrics config: {e}")))?;
                Ok(Self::Metrics {
                    delimiter: raw.delimiter,
                    display_items: raw.display_items,
                    parser_script: raw.parser_script,
                })
            }
        }
    }

    /// Display items, empty for equipment configs.
    pub fn display_items(&self) -> &[DisplayItem] {
        match self {
            Self::Equipment { .. } => &[],
            Self::Metrics { display_items, .. } => display_items,
        }
    }

    /// Whether at least one display item uses condition-mode thresholds.
    pub fn uses_conditions(&self) -> bool {
        self.display_items().iter().any(DisplayItem::uses_conditions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
