//! Telemetry ingestion: apply one raw line to a system's metrics.
//!
//! The raw line is parsed (built-in delimiter parser, or the system's
//! parser script when one is configured), each parsed field updates its
//! metric row and publishes a metric event, and the overall status is
//! recomputed afterwards. Fresh telemetry on an offline system clears the
//! offline state before any metric is touched.

use std::time::Duration;

use sitewatch_core::config::SystemConfig;
use sitewatch_core::script;
use sitewatch_core::status::SystemStatus;
use sitewatch_core::telemetry::{parse_delimited, FieldValue, Trend};
use sitewatch_core::CoreError;
use sitewatch_db::models::system::System;
use sitewatch_db::repositories::MetricRepo;
use sitewatch_db::DbPool;
use sitewatch_events::{EventBus, NotificationEvent};

use crate::error::{AppError, AppResult};
use crate::services::aggregator;

/// What one ingested line did.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Names of the metrics that received a fresh value.
    pub updated: Vec<String>,
    /// Status transition triggered by this line, if any.
    pub transition: Option<(SystemStatus, SystemStatus)>,
}

/// Apply a raw telemetry line to `system`.
pub async fn apply_telemetry(
    pool: &DbPool,
    bus: &EventBus,
    system: &System,
    raw: &str,
    script_timeout: Duration,
) -> AppResult<IngestOutcome> {
    let config = system.parsed_config()?;
    let fields = parse_fields(&config, raw, script_timeout).await?;

    // Live configuration screens watch the unparsed line.
    bus.publish(NotificationEvent::raw_preview(system.id, raw));

    if system.status() == SystemStatus::Offline {
        aggregator::apply_transition(pool, bus, system, SystemStatus::Normal).await?;
    }

    let mut outcome = IngestOutcome::default();
    for (name, value) in &fields {
        let Some(metric) = MetricRepo::get_by_name(pool, system.id, name).await? else {
            // Fields without a configured display item are dropped.
            continue;
        };
        let number = value.as_number();
        let trend = Trend::between(metric.value, number);
        MetricRepo::update_value(pool, metric.id, number, &value.raw(), trend.as_str()).await?;
        bus.publish(NotificationEvent::metric_update(
            system.id,
            name,
            number,
            trend.as_str(),
        ));
        outcome.updated.push(name.clone());
    }

    outcome.transition = aggregator::recompute_status(pool, bus, system.id).await?;
    Ok(outcome)
}

/// Parse a raw line into named fields per the system's config.
async fn parse_fields(
    config: &SystemConfig,
    raw: &str,
    script_timeout: Duration,
) -> AppResult<Vec<(String, FieldValue)>> {
    match config {
        SystemConfig::Equipment { .. } => Err(AppError::Core(CoreError::Validation(
            "equipment systems do not accept delimited telemetry".to_string(),
        ))),
        SystemConfig::Metrics {
            delimiter,
            display_items,
            parser_script,
        } => match parser_script {
            Some(body) => {
                let parsed = script::run_parser_script(body, raw, script_timeout)
                    .await
                    .map_err(|err| {
                        tracing::warn!(error = %err, "parser script failed");
                        AppError::BadRequest(format!("parser script failed: {err}"))
                    })?;
                Ok(parsed.into_iter().collect())
            }
            None => Ok(parse_delimited(raw, delimiter, display_items)),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sitewatch_core::config::DisplayItem;

    fn metrics_config(delimiter: &str, names: &[&str]) -> SystemConfig {
        SystemConfig::Metrics {
            delimiter: delimiter.to_string(),
            display_items: names
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
                .collect(),
            parser_script: None,
        }
    }

    #[tokio::test]
    async fn delimiter_parse_maps_fields_in_order() {
        let config = metrics_config(";", &["voltage", "state"]);
        let fields = parse_fields(&config, "230;OK", Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(fields[0], ("voltage".into(), FieldValue::Number(230.0)));
        assert_eq!(fields[1], ("state".into(), FieldValue::Text("OK".into())));
    }

    #[tokio::test]
    async fn equipment_systems_reject_telemetry() {
        let config = SystemConfig::Equipment { patterns: vec![] };
        let err = parse_fields(&config, "anything", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Core(CoreError::Validation(_))
        ));
    }
}
