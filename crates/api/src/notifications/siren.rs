//! Physical alerting device actuation seam.
//!
//! The wire transport to the siren and access gate is owned by the device
//! gateway, outside this service. The relay only decides the desired state
//! and hands it to a [`SirenController`].

/// Decides nothing; applies a desired siren/gate state.
pub trait SirenController: Send + Sync {
    /// Apply the desired audible state to the device path.
    fn set_active(&self, active: bool) -> impl std::future::Future<Output = ()> + Send;
}

/// Default controller: records the intended actuation in the log. The
/// device gateway tails these transitions in deployments without a direct
/// device link.
pub struct LogSiren;

impl SirenController for LogSiren {
    async fn set_active(&self, active: bool) {
        if active {
            tracing::info!("Siren state: active");
        } else {
            tracing::info!("Siren state: silent");
        }
    }
}
