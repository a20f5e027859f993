pub mod alarm_repo;
pub mod metric_repo;
pub mod setting_repo;
pub mod system_repo;

pub use alarm_repo::AlarmRepo;
pub use metric_repo::MetricRepo;
pub use setting_repo::SettingRepo;
pub use system_repo::SystemRepo;
