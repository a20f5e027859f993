//! Alarm lifecycle: creation, acknowledgement, and the offline path.
//!
//! Every state change here publishes its increment on the bus, always
//! followed by a siren resync so the actuation path re-derives its state
//! from the database rather than from the increment itself.

use sitewatch_core::status::{AlarmSeverity, SystemKind};
use sitewatch_core::types::DbId;
use sitewatch_core::CoreError;
use sitewatch_db::models::alarm::Alarm;
use sitewatch_db::models::system::System;
use sitewatch_db::repositories::{AlarmRepo, SystemRepo};
use sitewatch_db::DbPool;
use sitewatch_events::{EventBus, NotificationEvent};

use crate::error::AppResult;

/// Message used for alarms raised by the offline detector. Deduplication
/// keys on this exact text per system.
pub const OFFLINE_MESSAGE: &str = "System offline";

/// Create an unresolved alarm for `system` and publish it.
pub async fn create_alarm(
    pool: &DbPool,
    bus: &EventBus,
    system: &System,
    severity: AlarmSeverity,
    message: &str,
) -> AppResult<Alarm> {
    let alarm = AlarmRepo::create(pool, system.id, severity, message).await?;
    tracing::info!(
        alarm_id = alarm.id,
        system_id = system.id,
        severity = severity.as_str(),
        message,
        "alarm created"
    );
    bus.publish(NotificationEvent::alarm_created(
        alarm.id,
        system.id,
        &system.name,
        severity,
        message,
    ));
    bus.publish(NotificationEvent::siren_resync());
    Ok(alarm)
}

/// Raise an offline alarm for `system` unless one is already open.
///
/// UPS backing loss is treated as critical; any other kind going dark is
/// a warning. Returns the alarm when one was actually created.
pub async fn raise_offline_alarm(
    pool: &DbPool,
    bus: &EventBus,
    system: &System,
) -> AppResult<Option<Alarm>> {
    if AlarmRepo::exists_unresolved(pool, system.id, OFFLINE_MESSAGE).await? {
        return Ok(None);
    }
    let severity = match system.kind() {
        SystemKind::Ups => AlarmSeverity::Critical,
        _ => AlarmSeverity::Warning,
    };
    let alarm = create_alarm(pool, bus, system, severity, OFFLINE_MESSAGE).await?;
    Ok(Some(alarm))
}

/// Acknowledge a single alarm on behalf of `actor`.
pub async fn acknowledge(
    pool: &DbPool,
    bus: &EventBus,
    id: DbId,
    actor: &str,
) -> AppResult<Alarm> {
    let alarm = AlarmRepo::acknowledge(pool, id, actor)
        .await?
        .ok_or(CoreError::NotFound { entity: "Alarm", id })?;

    let system_name = SystemRepo::get_by_id(pool, alarm.system_id)
        .await?
        .map(|s| s.name)
        .unwrap_or_default();

    bus.publish(NotificationEvent::alarm_acknowledged(
        alarm.id,
        alarm.system_id,
        &system_name,
    ));
    bus.publish(NotificationEvent::siren_resync());
    Ok(alarm)
}

/// Acknowledge every pending alarm in one shot. Returns how many changed.
pub async fn acknowledge_all(pool: &DbPool, bus: &EventBus, actor: &str) -> AppResult<u64> {
    let ids = AlarmRepo::acknowledge_all(pool, actor).await?;
    if ids.is_empty() {
        return Ok(0);
    }
    tracing::info!(count = ids.len(), actor, "bulk acknowledge");
    bus.publish(NotificationEvent::alarm_acknowledged_bulk(&ids));
    bus.publish(NotificationEvent::siren_resync());
    Ok(ids.len() as u64)
}
