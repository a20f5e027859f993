use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Spawn the periodic viewer keepalive.
///
/// Sends a Ping frame to every connected viewer each `interval` (see
/// `ServerConfig::ws_heartbeat_interval`) so idle browsers and proxies
/// keep the socket open, and logs the viewer count for visibility. A
/// subscriber whose socket has died fails the send and gets pruned by the
/// manager. The task runs until aborted during shutdown.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;
            let viewers = ws_manager.connection_count().await;
            tracing::debug!(viewers, "heartbeat ping");
            ws_manager.ping_all().await;
        }
    })
}
