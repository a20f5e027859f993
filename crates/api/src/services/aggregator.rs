//! Status aggregation: derive a system's overall status from its current
//! metric values and drive the transition side effects.
//!
//! Transition ordering is fixed: the status event goes out first, then any
//! alarm event it caused. `offline` is a transport signal owned by the
//! ingestion layer and the offline detector; metric-derived recomputation
//! never overrides it.

use sitewatch_core::condition;
use sitewatch_core::config::DisplayItem;
use sitewatch_core::status::{AlarmSeverity, SystemStatus};
use sitewatch_core::types::DbId;
use sitewatch_db::models::metric::Metric;
use sitewatch_db::models::system::System;
use sitewatch_db::repositories::{AlarmRepo, MetricRepo, SystemRepo};
use sitewatch_db::DbPool;
use sitewatch_events::{EventBus, NotificationEvent};

use crate::error::AppResult;
use crate::services::alarms;

/// Recompute the overall status of a system from its stored metric values.
///
/// Returns the `(old, new)` pair when a transition happened, `None` when
/// the status is unchanged or the system is missing, soft-deleted, or
/// currently offline.
pub async fn recompute_status(
    pool: &DbPool,
    bus: &EventBus,
    system_id: DbId,
) -> AppResult<Option<(SystemStatus, SystemStatus)>> {
    let Some(system) = SystemRepo::get_by_id(pool, system_id).await? else {
        return Ok(None);
    };
    if !system.is_active || system.status() == SystemStatus::Offline {
        return Ok(None);
    }

    let config = system.parsed_config()?;
    let items = config.display_items();
    if items.is_empty() {
        return Ok(None);
    }

    // Mode is a system-level property: one item with condition rules puts
    // the whole system in condition mode and legacy-only items stop
    // contributing to the fold.
    let condition_mode = config.uses_conditions();
    let mut pairs = Vec::new();
    for item in items {
        if condition_mode && !item.uses_conditions() {
            continue;
        }
        if let Some(metric) = MetricRepo::get_by_name(pool, system.id, &item.name).await? {
            pairs.push((item, metric));
        }
    }
    let overall = overall_status(condition_mode, &pairs);

    let old = system.status();
    if overall == old {
        return Ok(None);
    }
    apply_transition(pool, bus, &system, overall).await?;
    Ok(Some((old, overall)))
}

/// Persist a status transition and publish its side effects.
///
/// The status event is always published first. Entering `normal` resolves
/// the system's open alarms; entering `warning` or `critical` raises one;
/// entering `offline` raises the deduplicated offline alarm.
pub async fn apply_transition(
    pool: &DbPool,
    bus: &EventBus,
    system: &System,
    new: SystemStatus,
) -> AppResult<()> {
    SystemRepo::update_status(pool, system.id, new).await?;
    tracing::info!(
        system_id = system.id,
        from = %system.status,
        to = new.as_str(),
        "status transition"
    );
    bus.publish(NotificationEvent::system_status_changed(
        system.id,
        &system.name,
        new,
    ));

    match new {
        SystemStatus::Normal => {
            let resolved = AlarmRepo::resolve_for_system(pool, system.id).await?;
            if resolved > 0 {
                bus.publish(NotificationEvent::alarm_resolved(system.id, &system.name));
                bus.publish(NotificationEvent::siren_resync());
            }
        }
        SystemStatus::Warning => {
            let message = transition_message(SystemStatus::Warning);
            alarms::create_alarm(pool, bus, system, AlarmSeverity::Warning, &message).await?;
        }
        SystemStatus::Critical => {
            let message = transition_message(SystemStatus::Critical);
            alarms::create_alarm(pool, bus, system, AlarmSeverity::Critical, &message).await?;
        }
        SystemStatus::Offline => {
            alarms::raise_offline_alarm(pool, bus, system).await?;
        }
    }
    Ok(())
}

fn transition_message(status: SystemStatus) -> String {
    format!("Status changed to {}", status.as_str())
}

/// Worst-of fold over the resolved `(item, metric)` pairs.
///
/// In condition mode only items carrying rules contribute; in legacy mode
/// every item thresholds on its scalars.
fn overall_status(condition_mode: bool, pairs: &[(&DisplayItem, Metric)]) -> SystemStatus {
    let mut overall = SystemStatus::Normal;
    for (item, metric) in pairs {
        if condition_mode && !item.uses_conditions() {
            continue;
        }
        overall = overall.worst(item_status(item, metric));
        if overall == SystemStatus::Critical {
            break;
        }
    }
    overall
}

/// Status contribution of a single metric under its display item's rules.
fn item_status(item: &DisplayItem, metric: &Metric) -> SystemStatus {
    match &item.conditions {
        Some(rules) if !rules.is_empty() => {
            condition::evaluate(metric.value, &metric.raw_value, rules)
        }
        _ => legacy_status(metric.value, item.warning, item.critical),
    }
}

/// Legacy scalar thresholding. Both bounds escalate straight to critical:
/// `warning` is a lower bound (battery level, fuel) and `critical` an
/// upper bound (temperature, load).
fn legacy_status(value: f64, warning: Option<f64>, critical: Option<f64>) -> SystemStatus {
    let over = critical.is_some_and(|c| value >= c);
    let under = warning.is_some_and(|w| value <= w);
    if over || under {
        SystemStatus::Critical
    } else {
        SystemStatus::Normal
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sitewatch_core::condition::{StatusConditions, ThresholdCondition};

    fn metric(value: f64, raw: &str) -> Metric {
        Metric {
            id: 1,
            system_id: 1,
            name: "m".into(),
            value,
            raw_value: raw.into(),
            unit: String::new(),
            display_min: None,
            display_max: None,
            warning_threshold: None,
            critical_threshold: None,
            trend: None,
            updated_at: Utc::now(),
        }
    }

    fn legacy_item(warning: Option<f64>, critical: Option<f64>) -> DisplayItem {
        DisplayItem {
            name: "m".into(),
            unit: String::new(),
            warning,
            critical,
            min: None,
            max: None,
            conditions: None,
        }
    }

    #[test]
    fn legacy_high_value_is_critical() {
        assert_eq!(
            legacy_status(95.0, Some(20.0), Some(90.0)),
            SystemStatus::Critical
        );
    }

    #[test]
    fn legacy_low_value_is_critical() {
        // The warning scalar acts as a lower bound, e.g. battery charge.
        assert_eq!(
            legacy_status(15.0, Some(20.0), Some(90.0)),
            SystemStatus::Critical
        );
    }

    #[test]
    fn legacy_mid_range_is_normal() {
        assert_eq!(
            legacy_status(50.0, Some(20.0), Some(90.0)),
            SystemStatus::Normal
        );
    }

    #[test]
    fn legacy_bounds_are_inclusive() {
        assert_eq!(
            legacy_status(90.0, None, Some(90.0)),
            SystemStatus::Critical
        );
        assert_eq!(
            legacy_status(20.0, Some(20.0), None),
            SystemStatus::Critical
        );
    }

    #[test]
    fn legacy_without_thresholds_is_normal() {
        assert_eq!(legacy_status(1e9, None, None), SystemStatus::Normal);
    }

    #[test]
    fn item_status_prefers_conditions_over_scalars() {
        let item = DisplayItem {
            conditions: Some(StatusConditions {
                critical: vec![ThresholdCondition::Gte { value: 40.0 }],
                ..Default::default()
            }),
            ..legacy_item(Some(20.0), Some(90.0))
        };
        // 30 would be fine under conditions even though scalars exist.
        assert_eq!(item_status(&item, &metric(30.0, "30")), SystemStatus::Normal);
        assert_eq!(
            item_status(&item, &metric(45.0, "45")),
            SystemStatus::Critical
        );
    }

    #[test]
    fn empty_condition_block_falls_back_to_scalars() {
        let item = DisplayItem {
            conditions: Some(StatusConditions::default()),
            ..legacy_item(None, Some(90.0))
        };
        assert_eq!(
            item_status(&item, &metric(95.0, "95")),
            SystemStatus::Critical
        );
    }

    #[test]
    fn condition_mode_excludes_legacy_items_from_the_fold() {
        let gauge = DisplayItem {
            name: "temperature".into(),
            conditions: Some(StatusConditions {
                critical: vec![ThresholdCondition::Gte { value: 40.0 }],
                ..Default::default()
            }),
            ..legacy_item(None, None)
        };
        // Battery at 10 with warning=20 would read critical in legacy
        // mode; with a condition item present it must not contribute.
        let battery = legacy_item(Some(20.0), None);

        let pairs = [(&gauge, metric(30.0, "30")), (&battery, metric(10.0, "10"))];
        assert_eq!(overall_status(true, &pairs), SystemStatus::Normal);

        let pairs = [(&gauge, metric(45.0, "45")), (&battery, metric(10.0, "10"))];
        assert_eq!(overall_status(true, &pairs), SystemStatus::Critical);
    }

    #[test]
    fn legacy_mode_folds_every_item() {
        let load = legacy_item(None, Some(90.0));
        let battery = legacy_item(Some(20.0), None);

        let pairs = [(&load, metric(50.0, "50")), (&battery, metric(10.0, "10"))];
        assert_eq!(overall_status(false, &pairs), SystemStatus::Critical);

        let pairs = [(&load, metric(50.0, "50")), (&battery, metric(80.0, "80"))];
        assert_eq!(overall_status(false, &pairs), SystemStatus::Normal);
    }

    #[test]
    fn string_condition_uses_raw_value() {
        let item = DisplayItem {
            conditions: Some(StatusConditions {
                critical: vec![ThresholdCondition::Eq {
                    value: sitewatch_core::condition::Operand::Text("FAIL".into()),
                }],
                ..Default::default()
            }),
            ..legacy_item(None, None)
        };
        assert_eq!(
            item_status(&item, &metric(0.0, "FAIL")),
            SystemStatus::Critical
        );
        assert_eq!(item_status(&item, &metric(0.0, "OK")), SystemStatus::Normal);
    }
}
