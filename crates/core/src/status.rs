//! System status, system kind, and alarm severity enums.
//!
//! All three serialize to lowercase strings and are stored in the database
//! as TEXT, so every enum round-trips through `as_str` / `from_str`.

use serde::{Deserialize, Serialize};

/// Overall health of a monitored system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Normal,
    Warning,
    Critical,
    /// Transport-availability signal set by the ingestion layer; overrides
    /// metric-derived status until fresh data arrives or an explicit reset.
    Offline,
}

impl SystemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Offline => "offline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }

    /// Severity rank for worst-of aggregation. `Offline` is handled
    /// out-of-band by the aggregator and never competes here.
    fn rank(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Offline => 3,
        }
    }

    /// Return the worse of two statuses (`critical` beats `warning` beats
    /// `normal`).
    pub fn worst(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

/// Declared type of a monitored system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Equipment,
    Ups,
    Sensor,
}

impl SystemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Ups => "ups",
            Self::Sensor => "sensor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equipment" => Some(Self::Equipment),
            "ups" => Some(Self::Ups),
            "sensor" => Some(Self::Sensor),
            _ => None,
        }
    }
}

/// Severity level of an alarm record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmSeverity {
    Warning,
    Critical,
}

impl AlarmSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_prefers_higher_severity() {
        assert_eq!(
            SystemStatus::Normal.worst(SystemStatus::Warning),
            SystemStatus::Warning
        );
        assert_eq!(
            SystemStatus::Critical.worst(SystemStatus::Warning),
            SystemStatus::Critical
        );
        assert_eq!(
            SystemStatus::Normal.worst(SystemStatus::Normal),
            SystemStatus::Normal
        );
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            SystemStatus::Normal,
            SystemStatus::Warning,
            SystemStatus::Critical,
            SystemStatus::Offline,
        ] {
            assert_eq!(SystemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SystemStatus::parse("bogus"), None);
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [SystemKind::Equipment, SystemKind::Ups, SystemKind::Sensor] {
            assert_eq!(SystemKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&SystemStatus::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(
            serde_json::to_string(&AlarmSeverity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
