//! Fan-out of notification events to viewers and alerting devices.

pub mod relay;
pub mod siren;

pub use relay::EventRelay;
pub use siren::{LogSiren, SirenController};
