//! The notification event wire envelope.
//!
//! Every mutating operation publishes one of these; subscribers apply the
//! payload to their local view or trigger a device side effect. Envelopes
//! carry only the minimal fields needed for that; reconnecting clients
//! re-fetch authoritative state and rely on the bus for increments only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use sitewatch_core::status::{AlarmSeverity, SystemStatus};
use sitewatch_core::types::DbId;

/// Wire event type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "metric")]
    Metric,
    #[serde(rename = "alarm")]
    Alarm,
    #[serde(rename = "alarm-resolved")]
    AlarmResolved,
    #[serde(rename = "system")]
    System,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "raw")]
    Raw,
    #[serde(rename = "siren-sync")]
    SirenSync,
    #[serde(rename = "settings")]
    Settings,
}

/// A typed, timestamped envelope broadcast to all subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// A metric received a fresh value.
    pub fn metric_update(system_id: DbId, name: &str, value: f64, trend: &str) -> Self {
        Self::new(
            EventKind::Metric,
            json!({
                "systemId": system_id,
                "name": name,
                "value": value,
                "trend": trend,
            }),
        )
    }

    /// A new, unacknowledged alarm was created.
    pub fn alarm_created(
        alarm_id: DbId,
        system_id: DbId,
        system_name: &str,
        severity: AlarmSeverity,
        message: &str,
    ) -> Self {
        Self::new(
            EventKind::Alarm,
            json!({
                "alarmId": alarm_id,
                "systemId": system_id,
                "systemName": system_name,
                "severity": severity,
                "message": message,
                "acknowledged": false,
            }),
        )
    }

    /// A single alarm was acknowledged.
    pub fn alarm_acknowledged(alarm_id: DbId, system_id: DbId, system_name: &str) -> Self {
        Self::new(
            EventKind::Alarm,
            json!({
                "alarmId": alarm_id,
                "systemId": system_id,
                "systemName": system_name,
                "acknowledged": true,
            }),
        )
    }

    /// A bulk acknowledgement; subscribers apply the full id set as one
    /// batch, superseding any in-flight single-ack for the same ids.
    pub fn alarm_acknowledged_bulk(alarm_ids: &[DbId]) -> Self {
        Self::new(
            EventKind::Alarm,
            json!({
                "alarmIds": alarm_ids,
                "acknowledged": true,
                "bulk": true,
            }),
        )
    }

    /// All of a system's open alarms were resolved.
    pub fn alarm_resolved(system_id: DbId, system_name: &str) -> Self {
        Self::new(
            EventKind::AlarmResolved,
            json!({
                "systemId": system_id,
                "systemName": system_name,
            }),
        )
    }

    /// A system's overall status changed.
    pub fn system_status_changed(
        system_id: DbId,
        system_name: &str,
        status: SystemStatus,
    ) -> Self {
        Self::new(
            EventKind::System,
            json!({
                "systemId": system_id,
                "systemName": system_name,
                "status": status,
            }),
        )
    }

    /// A system was (soft-)deleted.
    pub fn system_deleted(system_id: DbId) -> Self {
        Self::new(EventKind::Delete, json!({ "systemId": system_id }))
    }

    /// Persisted settings changed; carries the written keys.
    pub fn settings_changed(changed: serde_json::Value) -> Self {
        Self::new(EventKind::Settings, changed)
    }

    /// Ask the siren/gate actuation path to re-derive its state.
    pub fn siren_resync() -> Self {
        Self::new(EventKind::SirenSync, json!({}))
    }

    /// Raw telemetry preview for live configuration screens.
    pub fn raw_preview(system_id: DbId, raw: &str) -> Self {
        Self::new(
            EventKind::Raw,
            json!({
                "systemId": system_id,
                "raw": raw,
            }),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_to_wire_names() {
        let pairs = [
            (EventKind::Metric, "\"metric\""),
            (EventKind::Alarm, "\"alarm\""),
            (EventKind::AlarmResolved, "\"alarm-resolved\""),
            (EventKind::System, "\"system\""),
            (EventKind::Delete, "\"delete\""),
            (EventKind::Raw, "\"raw\""),
            (EventKind::SirenSync, "\"siren-sync\""),
            (EventKind::Settings, "\"settings\""),
        ];
        for (kind, expected) in pairs {
            assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        }
    }

    #[test]
    fn envelope_uses_type_field_and_iso_timestamp() {
        let event = NotificationEvent::siren_resync();
        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(wire["type"], "siren-sync");
        assert!(wire["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn single_ack_payload_shape() {
        let event = NotificationEvent::alarm_acknowledged(7, 3, "UPS-A");
        assert_eq!(
            event.data,
            json!({
                "alarmId": 7,
                "systemId": 3,
                "systemName": "UPS-A",
                "acknowledged": true,
            })
        );
    }

    #[test]
    fn bulk_ack_payload_carries_bulk_flag() {
        let event = NotificationEvent::alarm_acknowledged_bulk(&[1, 2, 3]);
        assert_eq!(event.kind, EventKind::Alarm);
        assert_eq!(event.data["bulk"], true);
        assert_eq!(event.data["alarmIds"], json!([1, 2, 3]));
    }

    #[test]
    fn new_alarm_payload_shape() {
        let event =
            NotificationEvent::alarm_created(9, 4, "Chiller", AlarmSeverity::Critical, "overtemp");
        assert_eq!(event.data["severity"], "critical");
        assert_eq!(event.data["acknowledged"], false);
        assert_eq!(event.data["message"], "overtemp");
    }

    #[test]
    fn status_change_payload_shape() {
        let event = NotificationEvent::system_status_changed(4, "Chiller", SystemStatus::Critical);
        assert_eq!(event.kind, EventKind::System);
        assert_eq!(
            event.data,
            json!({ "systemId": 4, "systemName": "Chiller", "status": "critical" })
        );
    }

    #[test]
    fn resolved_payload_shape() {
        let event = NotificationEvent::alarm_resolved(4, "Chiller");
        assert_eq!(
            event.data,
            json!({ "systemId": 4, "systemName": "Chiller" })
        );
    }
}
