//! Request handlers, grouped by resource.

pub mod alarm;
pub mod script;
pub mod settings;
pub mod system;
