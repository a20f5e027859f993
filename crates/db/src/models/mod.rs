pub mod alarm;
pub mod metric;
pub mod setting;
pub mod system;

pub use alarm::Alarm;
pub use metric::Metric;
pub use setting::{AudioSettings, Setting};
pub use system::System;
