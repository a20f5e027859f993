//! Built-in delimiter parser and trend computation.
//!
//! Raw telemetry for UPS/sensor systems is a single delimited line; fields
//! map positionally onto the configured display items. Systems with a
//! parser script configured go through [`crate::script`] instead.

use serde::{Deserialize, Serialize};

use crate::config::DisplayItem;

/// A single parsed telemetry field: numeric when the raw field parses as a
/// finite number, text otherwise (status-code metrics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric value for storage; text fields store 0 and keep their raw
    /// form for condition evaluation.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(_) => 0.0,
        }
    }

    /// Raw string form used for string-valued equality conditions.
    pub fn raw(&self) -> String {
        match self {
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Text(s) => s.clone(),
        }
    }

    fn parse(field: &str) -> Self {
        match field.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(field.trim().to_string()),
        }
    }
}

/// Direction of a metric's movement between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }

    /// Compare a new sample against the previous one.
    pub fn between(old: f64, new: f64) -> Self {
        if new > old {
            Self::Up
        } else if new < old {
            Self::Down
        } else {
            Self::Stable
        }
    }
}

/// Split a raw line on the configured delimiter and map fields onto the
/// display items in order. Short rows yield only the fields present; extra
/// trailing fields are ignored.
pub fn parse_delimited(
    raw: &str,
    delimiter: &str,
    items: &[DisplayItem],
) -> Vec<(String, FieldValue)> {
    if delimiter.is_empty() {
        return Vec::new();
    }
    raw.split(delimiter)
        .zip(items.iter())
        .map(|(field, item)| (item.name.clone(), FieldValue::parse(field)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<DisplayItem> {
        names
            .iter()
            .map(|name| DisplayItem {
                name: (*name).to_string(),
                unit: String::new(),
                warning: None,
                critical: None,
                min: None,
                max: None,
                conditions: None,
            })
            .collect()
    }

    #[test]
    fn fields_map_positionally() {
        let parsed = parse_delimited("12.5,33,OK", ",", &items(&["temp", "humidity", "state"]));
        assert_eq!(
            parsed,
            vec![
                ("temp".to_string(), FieldValue::Number(12.5)),
                ("humidity".to_string(), FieldValue::Number(33.0)),
                ("state".to_string(), FieldValue::Text("OK".to_string())),
            ]
        );
    }

    #[test]
    fn short_rows_yield_only_present_fields() {
        let parsed = parse_delimited("12.5", ",", &items(&["temp", "humidity"]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "temp");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let parsed = parse_delimited("1,2,3,4", ",", &items(&["a", "b"]));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let parsed = parse_delimited(" 7 ; FAIL ", ";", &items(&["v", "state"]));
        assert_eq!(parsed[0].1, FieldValue::Number(7.0));
        assert_eq!(parsed[1].1, FieldValue::Text("FAIL".to_string()));
    }

    #[test]
    fn empty_delimiter_parses_nothing() {
        assert!(parse_delimited("123", "", &items(&["a"])).is_empty());
    }

    #[test]
    fn trend_between_samples() {
        assert_eq!(Trend::between(1.0, 2.0), Trend::Up);
        assert_eq!(Trend::between(2.0, 1.0), Trend::Down);
        assert_eq!(Trend::between(2.0, 2.0), Trend::Stable);
    }

    #[test]
    fn raw_form_of_integral_numbers_has_no_fraction() {
        assert_eq!(FieldValue::Number(33.0).raw(), "33");
        assert_eq!(FieldValue::Number(12.5).raw(), "12.5");
        assert_eq!(FieldValue::Text("OK".into()).raw(), "OK");
    }
}
