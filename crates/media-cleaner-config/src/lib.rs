pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, JellyfinConfig, LoggingConfig, ScanConfig, SchedulerConfig, default_scheduler_config};
pub use credentials::{CredentialStore, JELLYFIN_API_KEY_ENV};
pub use paths::{PathManager, container_base_path};
pub use media_cleaner_models::StalenessConfig;
