//! Notification bus for real-time viewer and device synchronization.
//!
//! - [`NotificationEvent`]: the transient wire envelope broadcast to all
//!   subscribers; never authoritative state.
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.

pub mod bus;
pub mod envelope;

pub use bus::EventBus;
pub use envelope::{EventKind, NotificationEvent};
