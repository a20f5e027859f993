//! Threshold condition evaluation engine.
//!
//! Pure logic with no database access. The caller fetches the metric value and
//! the system's rule set and passes them in. Rule sets come from the
//! `conditions` block of a display item (see [`crate::config`]).
//!
//! Evaluation is total: malformed or empty rule lists never match and fall
//! through to `Normal`.

use serde::{Deserialize, Serialize};

use crate::status::SystemStatus;

/// Right-hand operand of an equality condition.
///
/// Numeric operands compare against the metric's numeric value; text
/// operands compare against the raw string representation, which supports
/// status-code metrics such as `"OK"` / `"FAIL"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Text(String),
}

/// A single threshold condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ThresholdCondition {
    /// Inclusive on both ends. A missing upper bound degenerates to
    /// equality with the lower bound.
    Between { lo: f64, hi: Option<f64> },
    Gte { value: f64 },
    Lte { value: f64 },
    Eq { value: Operand },
    Neq { value: Operand },
}

impl ThresholdCondition {
    /// Whether the condition is satisfied by the given value.
    pub fn matches(&self, value: f64, raw: &str) -> bool {
        match self {
            Self::Between { lo, hi: Some(hi) } => value >= *lo && value <= *hi,
            Self::Between { lo, hi: None } => value == *lo,
            Self::Gte { value: bound } => value >= *bound,
            Self::Lte { value: bound } => value <= *bound,
            Self::Eq { value: operand } => operand_eq(operand, value, raw),
            Self::Neq { value: operand } => !operand_eq(operand, value, raw),
        }
    }

    /// Numeric bound used for at-a-glance display caches, if the condition
    /// has one. Text equality conditions have no numeric bound.
    pub fn numeric_bound(&self) -> Option<f64> {
        match self {
            Self::Between { lo, .. } => Some(*lo),
            Self::Gte { value } | Self::Lte { value } => Some(*value),
            Self::Eq { value } | Self::Neq { value } => match value {
                Operand::Number(n) => Some(*n),
                Operand::Text(_) => None,
            },
        }
    }
}

fn operand_eq(operand: &Operand, value: f64, raw: &str) -> bool {
    match operand {
        Operand::Number(n) => value == *n,
        Operand::Text(s) => raw == s,
    }
}

/// Rule set attached to a display item when the system uses condition-mode
/// thresholds. Conditions within each list are OR'd; any satisfied
/// condition triggers that tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConditions {
    pub critical: Vec<ThresholdCondition>,
    #[serde(rename = "coldCritical")]
    pub cold_critical: Vec<ThresholdCondition>,
    #[serde(rename = "dryCritical")]
    pub dry_critical: Vec<ThresholdCondition>,
    #[serde(rename = "humidCritical")]
    pub humid_critical: Vec<ThresholdCondition>,
}

impl StatusConditions {
    /// Whether any tier contains at least one condition.
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty()
            && self.cold_critical.is_empty()
            && self.dry_critical.is_empty()
            && self.humid_critical.is_empty()
    }

    /// All tiers in priority order, highest first.
    pub fn tiers(&self) -> [&[ThresholdCondition]; 4] {
        [
            &self.critical,
            &self.cold_critical,
            &self.dry_critical,
            &self.humid_critical,
        ]
    }
}

/// Which distinguishing tiers fired for a value.
///
/// The presentation layer uses these to pick a color/icon; they are
/// reported independently of the returned status, so a value that is both
/// `critical` and `coldCritical` still reports `cold = true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierMatches {
    pub cold: bool,
    pub dry: bool,
    pub humid: bool,
}

/// Evaluate a metric value against a rule set.
///
/// Tier priority, highest first: `critical`, `coldCritical`, `dryCritical`,
/// `humidCritical`; all four map to `Critical`. If no tier matches the
/// result is `Normal`; `Warning` is unreachable in condition mode.
pub fn evaluate(value: f64, raw: &str, rules: &StatusConditions) -> SystemStatus {
    for tier in rules.tiers() {
        if tier.iter().any(|c| c.matches(value, raw)) {
            return SystemStatus::Critical;
        }
    }
    SystemStatus::Normal
}

/// Report which of the distinguishing tiers (cold/dry/humid) fired.
pub fn matched_tiers(value: f64, raw: &str, rules: &StatusConditions) -> TierMatches {
    TierMatches {
        cold: rules.cold_critical.iter().any(|c| c.matches(value, raw)),
        dry: rules.dry_critical.iter().any(|c| c.matches(value, raw)),
        humid: rules.humid_critical.iter().any(|c| c.matches(value, raw)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn gte(value: f64) -> ThresholdCondition {
        ThresholdCondition::Gte { value }
    }

    fn between(lo: f64, hi: f64) -> ThresholdCondition {
        ThresholdCondition::Between { lo, hi: Some(hi) }
    }

    #[test]
    fn empty_rules_never_match() {
        let rules = StatusConditions::default();
        assert_eq!(evaluate(9999.0, "9999", &rules), SystemStatus::Normal);
        assert_eq!(matched_tiers(9999.0, "9999", &rules), TierMatches::default());
    }

    #[test]
    fn between_is_inclusive_on_both_ends() {
        let cond = between(10.0, 20.0);
        assert!(cond.matches(10.0, "10"));
        assert!(cond.matches(20.0, "20"));
        assert!(cond.matches(15.0, "15"));
        assert!(!cond.matches(9.999, "9.999"));
        assert!(!cond.matches(20.001, "20.001"));
    }

    #[test]
    fn between_without_upper_bound_is_equality() {
        let cond = ThresholdCondition::Between { lo: 5.0, hi: None };
        assert!(cond.matches(5.0, "5"));
        assert!(!cond.matches(5.1, "5.1"));
        assert!(!cond.matches(4.9, "4.9"));
    }

    #[test]
    fn conditions_within_a_tier_are_ored() {
        let rules = StatusConditions {
            critical: vec![gte(100.0), ThresholdCondition::Lte { value: -10.0 }],
            ..Default::default()
        };
        assert_eq!(evaluate(150.0, "150", &rules), SystemStatus::Critical);
        assert_eq!(evaluate(-20.0, "-20", &rules), SystemStatus::Critical);
        assert_eq!(evaluate(50.0, "50", &rules), SystemStatus::Normal);
    }

    #[test]
    fn every_tier_maps_to_critical() {
        for rules in [
            StatusConditions {
                cold_critical: vec![ThresholdCondition::Lte { value: 0.0 }],
                ..Default::default()
            },
            StatusConditions {
                dry_critical: vec![ThresholdCondition::Lte { value: 0.0 }],
                ..Default::default()
            },
            StatusConditions {
                humid_critical: vec![ThresholdCondition::Lte { value: 0.0 }],
                ..Default::default()
            },
        ] {
            assert_eq!(evaluate(-1.0, "-1", &rules), SystemStatus::Critical);
        }
    }

    #[test]
    fn critical_and_cold_coexist() {
        // A value satisfying both `critical` and `coldCritical` evaluates
        // to critical while still reporting the cold tier for display.
        let rules = StatusConditions {
            critical: vec![ThresholdCondition::Lte { value: 5.0 }],
            cold_critical: vec![ThresholdCondition::Lte { value: 5.0 }],
            ..Default::default()
        };
        assert_eq!(evaluate(2.0, "2", &rules), SystemStatus::Critical);
        let tiers = matched_tiers(2.0, "2", &rules);
        assert!(tiers.cold);
        assert!(!tiers.dry);
        assert!(!tiers.humid);
    }

    #[test]
    fn string_equality_compares_raw_representation() {
        let rules = StatusConditions {
            critical: vec![ThresholdCondition::Eq {
                value: Operand::Text("FAIL".to_string()),
            }],
            ..Default::default()
        };
        // Status-code metrics parse to 0.0; the raw string decides.
        assert_eq!(evaluate(0.0, "FAIL", &rules), SystemStatus::Critical);
        assert_eq!(evaluate(0.0, "OK", &rules), SystemStatus::Normal);
    }

    #[test]
    fn string_inequality_fires_on_unexpected_code() {
        let rules = StatusConditions {
            critical: vec![ThresholdCondition::Neq {
                value: Operand::Text("OK".to_string()),
            }],
            ..Default::default()
        };
        assert_eq!(evaluate(0.0, "DEGRADED", &rules), SystemStatus::Critical);
        assert_eq!(evaluate(0.0, "OK", &rules), SystemStatus::Normal);
    }

    #[test]
    fn numeric_bound_extraction() {
        assert_eq!(between(10.0, 20.0).numeric_bound(), Some(10.0));
        assert_eq!(gte(42.0).numeric_bound(), Some(42.0));
        assert_eq!(
            ThresholdCondition::Eq {
                value: Operand::Text("OK".into())
            }
            .numeric_bound(),
            None
        );
    }

    #[test]
    fn conditions_deserialize_from_config_json() {
        let json = serde_json::json!({
            "critical": [
                { "op": "gte", "value": 35.0 },
                { "op": "eq", "value": "FAIL" }
            ],
            "coldCritical": [
                { "op": "between", "lo": -40.0, "hi": 5.0 }
            ]
        });
        let rules: StatusConditions = serde_json::from_value(json).unwrap();
        assert_eq!(rules.critical.len(), 2);
        assert_eq!(rules.cold_critical.len(), 1);
        assert!(rules.dry_critical.is_empty());
        assert_eq!(evaluate(36.0, "36", &rules), SystemStatus::Critical);
        assert_eq!(evaluate(0.0, "0", &rules), SystemStatus::Critical);
        assert!(matched_tiers(0.0, "0", &rules).cold);
    }
}
