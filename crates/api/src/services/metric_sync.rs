//! Metric synchronizer: reconcile a system's metric rows with its
//! configured display items.
//!
//! Creates exactly one metric per display-item name (value 0), and on
//! existing rows refreshes only the display caches (unit, gauge bounds,
//! derived thresholds). `value` and `trend` belong to telemetry processing
//! and are never touched here. Idempotent: identical config produces no
//! writes after the first call.

use serde::Serialize;

use sitewatch_core::config::{DisplayItem, SystemConfig};
use sitewatch_core::types::DbId;
use sitewatch_db::repositories::metric_repo::MetricDisplayFields;
use sitewatch_db::repositories::MetricRepo;
use sitewatch_db::DbPool;

use crate::error::AppResult;

/// Counts of writes performed by one sync pass.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub created: u64,
    pub updated: u64,
}

/// Reconcile the metric rows of `system_id` against `config`.
///
/// Equipment configs have no display items, so sync is a no-op for them.
pub async fn sync_metrics(
    pool: &DbPool,
    system_id: DbId,
    config: &SystemConfig,
) -> AppResult<SyncOutcome> {
    let mut outcome = SyncOutcome::default();

    for item in config.display_items() {
        let display = display_fields(item);
        match MetricRepo::get_by_name(pool, system_id, &item.name).await? {
            None => {
                MetricRepo::create(pool, system_id, &item.name, &display).await?;
                outcome.created += 1;
            }
            Some(existing) => {
                let current = MetricDisplayFields {
                    unit: existing.unit.clone(),
                    display_min: existing.display_min,
                    display_max: existing.display_max,
                    warning_threshold: existing.warning_threshold,
                    critical_threshold: existing.critical_threshold,
                };
                if current != display {
                    MetricRepo::update_display(pool, existing.id, &display).await?;
                    outcome.updated += 1;
                }
            }
        }
    }

    Ok(outcome)
}

/// Display-cache fields derived from one display item.
fn display_fields(item: &DisplayItem) -> MetricDisplayFields {
    let derived = item.derived_thresholds();
    MetricDisplayFields {
        unit: item.unit.clone(),
        display_min: item.min,
        display_max: item.max,
        warning_threshold: derived.warning,
        critical_threshold: derived.critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewatch_core::condition::{StatusConditions, ThresholdCondition};

    #[test]
    fn display_fields_in_condition_mode_have_no_warning() {
        let item = DisplayItem {
            name: "temp".into(),
            unit: "°C".into(),
            warning: Some(1.0),
            critical: Some(2.0),
            min: Some(0.0),
            max: Some(100.0),
            conditions: Some(StatusConditions {
                critical: vec![ThresholdCondition::Gte { value: 35.0 }],
                ..Default::default()
            }),
        };
        let fields = display_fields(&item);
        assert_eq!(fields.warning_threshold, None);
        assert_eq!(fields.critical_threshold, Some(35.0));
        assert_eq!(fields.display_max, Some(100.0));
    }

    #[test]
    fn display_fields_in_legacy_mode_take_scalars() {
        let item = DisplayItem {
            name: "load".into(),
            unit: "%".into(),
            warning: Some(20.0),
            critical: Some(90.0),
            min: None,
            max: None,
            conditions: None,
        };
        let fields = display_fields(&item);
        assert_eq!(fields.warning_threshold, Some(20.0));
        assert_eq!(fields.critical_threshold, Some(90.0));
    }
}
