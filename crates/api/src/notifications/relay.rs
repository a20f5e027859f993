//! Bus-to-viewer fan-out loop.
//!
//! [`EventRelay`] subscribes to the notification bus and re-broadcasts
//! every event to all connected WebSocket viewers. `siren-sync` events
//! additionally re-derive the desired siren state from a fresh settings
//! snapshot and the current alarm backlog, then hand it to the
//! [`SirenController`].

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use sitewatch_db::repositories::{AlarmRepo, SettingRepo};
use sitewatch_db::DbPool;
use sitewatch_events::{EventKind, NotificationEvent};

use crate::notifications::siren::SirenController;
use crate::ws::WsManager;

/// Fans notification events out to viewers and the device path.
pub struct EventRelay<S: SirenController> {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
    siren: S,
}

impl<S: SirenController> EventRelay<S> {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>, siren: S) -> Self {
        Self {
            pool,
            ws_manager,
            siren,
        }
    }

    /// Run the main relay loop.
    ///
    /// Consumes events from `receiver` until the channel closes (i.e. the
    /// [`EventBus`](sitewatch_events::EventBus) is dropped at shutdown).
    pub async fn run(self, mut receiver: broadcast::Receiver<NotificationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.relay_event(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, relay shutting down");
                    break;
                }
            }
        }
    }

    /// Broadcast one event to every viewer, then trigger device
    /// actuation for siren-sync events.
    async fn relay_event(&self, event: NotificationEvent) {
        match serde_json::to_string(&event) {
            Ok(text) => {
                self.ws_manager.broadcast(Message::Text(text.into())).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize notification event");
            }
        }

        if event.kind == EventKind::SirenSync {
            self.resync_siren().await;
        }
    }

    /// Re-derive the desired siren state.
    ///
    /// The audio settings snapshot is fetched fresh per actuation so a
    /// concurrent settings write is never observed stale. Store failures
    /// are logged and leave the device state unchanged.
    async fn resync_siren(&self) {
        let snapshot = match SettingRepo::audio_snapshot(&self.pool).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "Siren resync: failed to read settings");
                return;
            }
        };
        let pending = match AlarmRepo::any_unacknowledged(&self.pool).await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "Siren resync: failed to read alarms");
                return;
            }
        };

        let audible = pending && snapshot.audible_at(chrono::Utc::now().timestamp_millis());
        tracing::debug!(pending, audible, "Siren resync");
        self.siren.set_active(audible).await;
    }
}
