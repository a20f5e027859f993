//! WebSocket infrastructure for real-time viewer synchronization.
//!
//! Provides connection management with bounded per-subscriber queues,
//! heartbeat monitoring, and the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
