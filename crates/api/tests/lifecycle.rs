//! Database-backed tests for the status/alarm lifecycle.
//!
//! These run against a real PostgreSQL instance provisioned per test by
//! `#[sqlx::test]`, and exercise the service layer end to end: transition
//! event ordering, offline-alarm deduplication, synchronizer idempotence,
//! and bulk acknowledgement.

use serde_json::json;
use sqlx::PgPool;
use tokio::sync::broadcast;

use sitewatch_api::services::metric_sync::{self, SyncOutcome};
use sitewatch_api::services::{aggregator, alarms};
use sitewatch_core::status::{SystemKind, SystemStatus};
use sitewatch_core::types::DbId;
use sitewatch_db::models::system::{CreateSystem, System};
use sitewatch_db::repositories::{AlarmRepo, MetricRepo, SystemRepo};
use sitewatch_events::{EventBus, EventKind, NotificationEvent};

/// Create a UPS system with the given config blob. New systems start
/// offline until first telemetry.
async fn seed_system(pool: &PgPool, config: serde_json::Value) -> System {
    SystemRepo::create(
        pool,
        &CreateSystem {
            name: "UPS-A".into(),
            kind: SystemKind::Ups,
            config,
            port: Some(4001),
            protocol: Some("tcp".into()),
        },
    )
    .await
    .expect("create system")
}

/// Mark a freshly seeded system as reporting, returning the updated row.
async fn mark_online(pool: &PgPool, id: DbId) -> System {
    SystemRepo::update_status(pool, id, SystemStatus::Normal)
        .await
        .expect("set status");
    SystemRepo::get_by_id(pool, id)
        .await
        .expect("fetch system")
        .expect("system exists")
}

async fn set_metric_value(pool: &PgPool, system_id: DbId, name: &str, value: f64, raw: &str) {
    let metric = MetricRepo::get_by_name(pool, system_id, name)
        .await
        .expect("fetch metric")
        .expect("metric exists");
    MetricRepo::update_value(pool, metric.id, value, raw, "stable")
        .await
        .expect("update value");
}

/// Drain every event currently buffered on the receiver, in order.
fn drain_kinds(rx: &mut broadcast::Receiver<NotificationEvent>) -> Vec<EventKind> {
    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind);
    }
    kinds
}

// ---------------------------------------------------------------------------
// Test: critical transition and recovery publish events in order
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn critical_transition_and_recovery_order_events(pool: PgPool) {
    let system = seed_system(
        &pool,
        json!({ "displayItems": [{ "name": "load", "unit": "%", "critical": 90.0 }] }),
    )
    .await;
    metric_sync::sync_metrics(&pool, system.id, &system.parsed_config().unwrap())
        .await
        .expect("sync metrics");
    let system = mark_online(&pool, system.id).await;

    let bus = EventBus::default();
    let mut rx = bus.subscribe();

    // Over the critical bound: the status event must precede the alarm,
    // and the alarm must be followed by a siren resync.
    set_metric_value(&pool, system.id, "load", 95.0, "95").await;
    let transition = aggregator::recompute_status(&pool, &bus, system.id)
        .await
        .expect("recompute");
    assert_eq!(
        transition,
        Some((SystemStatus::Normal, SystemStatus::Critical))
    );
    assert_eq!(
        drain_kinds(&mut rx),
        vec![EventKind::System, EventKind::Alarm, EventKind::SirenSync]
    );

    // Back in range: the open alarm resolves, same ordering discipline.
    set_metric_value(&pool, system.id, "load", 50.0, "50").await;
    let transition = aggregator::recompute_status(&pool, &bus, system.id)
        .await
        .expect("recompute");
    assert_eq!(
        transition,
        Some((SystemStatus::Critical, SystemStatus::Normal))
    );
    assert_eq!(
        drain_kinds(&mut rx),
        vec![
            EventKind::System,
            EventKind::AlarmResolved,
            EventKind::SirenSync
        ]
    );

    let open = AlarmRepo::list(&pool, true, 10).await.expect("list alarms");
    assert!(open.is_empty(), "recovery should resolve all open alarms");
}

// ---------------------------------------------------------------------------
// Test: mixed config recomputes from condition items only
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn mixed_config_recomputes_from_condition_items_only(pool: PgPool) {
    let system = seed_system(
        &pool,
        json!({
            "displayItems": [
                {
                    "name": "state",
                    "conditions": { "critical": [{ "op": "eq", "value": "FAIL" }] }
                },
                { "name": "battery", "unit": "%", "warning": 20.0 }
            ]
        }),
    )
    .await;
    metric_sync::sync_metrics(&pool, system.id, &system.parsed_config().unwrap())
        .await
        .expect("sync metrics");
    let system = mark_online(&pool, system.id).await;

    let bus = EventBus::default();

    // Battery below its legacy warning bound: with a condition item in
    // the config, the legacy item must not drive a transition.
    set_metric_value(&pool, system.id, "battery", 10.0, "10").await;
    let transition = aggregator::recompute_status(&pool, &bus, system.id)
        .await
        .expect("recompute");
    assert_eq!(transition, None);
    let open = AlarmRepo::list(&pool, true, 10).await.expect("list alarms");
    assert!(open.is_empty());

    // The condition item still escalates.
    set_metric_value(&pool, system.id, "state", 0.0, "FAIL").await;
    let transition = aggregator::recompute_status(&pool, &bus, system.id)
        .await
        .expect("recompute");
    assert_eq!(
        transition,
        Some((SystemStatus::Normal, SystemStatus::Critical))
    );
}

// ---------------------------------------------------------------------------
// Test: repeated offline detection raises a single alarm
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn repeated_offline_detection_raises_one_alarm(pool: PgPool) {
    let system = seed_system(&pool, json!({})).await;
    let bus = EventBus::default();

    let first = alarms::raise_offline_alarm(&pool, &bus, &system)
        .await
        .expect("first sweep");
    assert!(first.is_some(), "first sweep should create the alarm");

    let second = alarms::raise_offline_alarm(&pool, &bus, &system)
        .await
        .expect("second sweep");
    assert!(second.is_none(), "second sweep must deduplicate");

    let open = AlarmRepo::list(&pool, true, 10).await.expect("list alarms");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].message, alarms::OFFLINE_MESSAGE);
    // UPS going dark is critical; other kinds degrade to warning.
    assert_eq!(open[0].severity, "critical");
}

// ---------------------------------------------------------------------------
// Test: a second sync with unchanged config performs no writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn second_sync_with_unchanged_config_writes_nothing(pool: PgPool) {
    let system = seed_system(
        &pool,
        json!({
            "displayItems": [
                { "name": "load", "unit": "%", "critical": 90.0 },
                { "name": "battery", "unit": "%", "warning": 20.0 }
            ]
        }),
    )
    .await;
    let config = system.parsed_config().unwrap();

    let first = metric_sync::sync_metrics(&pool, system.id, &config)
        .await
        .expect("first sync");
    assert_eq!(
        first,
        SyncOutcome {
            created: 2,
            updated: 0
        }
    );

    let second = metric_sync::sync_metrics(&pool, system.id, &config)
        .await
        .expect("second sync");
    assert_eq!(second, SyncOutcome::default());
}

// ---------------------------------------------------------------------------
// Test: bulk acknowledge with nothing pending publishes nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn bulk_ack_with_no_pending_publishes_nothing(pool: PgPool) {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();

    let count = alarms::acknowledge_all(&pool, &bus, "operator")
        .await
        .expect("acknowledge all");
    assert_eq!(count, 0);
    assert!(
        rx.try_recv().is_err(),
        "no alarms changed, so nothing goes on the bus"
    );
}
