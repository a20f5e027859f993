//! Domain orchestration over the repositories and the notification bus.
//!
//! - [`metric_sync`] reconciles metric rows with a system's config.
//! - [`aggregator`] recomputes overall status and drives transitions.
//! - [`alarms`] covers the alarm lifecycle, including the offline path.
//! - [`ingest`] applies a raw telemetry line to a system's metrics.

pub mod aggregator;
pub mod alarms;
pub mod ingest;
pub mod metric_sync;
