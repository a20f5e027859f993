//! Domain logic for the sitewatch monitoring backend.
//!
//! Everything in this crate is independent of the HTTP layer and (with the
//! exception of the script subprocess in [`script`]) performs no I/O:
//!
//! - [`status`]: system status, kind, and alarm severity enums.
//! - [`condition`]: the threshold condition evaluator.
//! - [`config`]: the parsed per-system configuration blob.
//! - [`telemetry`]: the built-in delimiter parser and trend computation.
//! - [`script`]: sandboxed execution of user-supplied parsing scripts.

pub mod condition;
pub mod config;
pub mod error;
pub mod script;
pub mod status;
pub mod telemetry;
pub mod types;

pub use error::CoreError;
