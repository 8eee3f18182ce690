use media_cleaner_models::StalenessConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub staleness: StalenessConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub jellyfin: Option<JellyfinConfig>,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// Upper bound on series evaluated at once (each one issues its own catalog queries)
    #[serde(default = "default_max_concurrent_series")]
    pub max_concurrent_series: usize,
    /// Write every completed report as JSON under the reports directory
    #[serde(default)]
    pub save_reports: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_series: default_max_concurrent_series(),
            save_reports: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JellyfinConfig {
    pub enabled: bool,
    pub server_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl JellyfinConfig {
    pub fn new(server_url: String) -> Self {
        Self {
            enabled: true,
            server_url,
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
    /// Cron expression (with seconds field); overrides `interval_hours` when set
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: Option<bool>,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_series() -> usize {
    4
}

fn default_page_size() -> u32 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_interval_hours() -> u64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        interval_hours: default_interval_hours(),
        schedule: None,
        run_on_startup: default_true(),
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scan.max_concurrent_series == 0 {
            return Err(anyhow::anyhow!("scan.max_concurrent_series must be at least 1"));
        }

        if let Some(jellyfin) = &self.jellyfin {
            if jellyfin.enabled && jellyfin.server_url.trim().is_empty() {
                return Err(anyhow::anyhow!("Jellyfin is enabled but server_url is not configured"));
            }
            if jellyfin.page_size == 0 {
                return Err(anyhow::anyhow!("jellyfin.page_size must be at least 1"));
            }
        }

        if let Some(scheduler) = &self.scheduler {
            if scheduler.schedule.is_none() && scheduler.interval_hours == 0 {
                return Err(anyhow::anyhow!("scheduler.interval_hours must be at least 1"));
            }
        }

        Ok(())
    }

    pub fn is_jellyfin_configured(&self) -> bool {
        self.jellyfin
            .as_ref()
            .map(|j| j.enabled && !j.server_url.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn scheduler_or_default(&self) -> SchedulerConfig {
        self.scheduler.clone().unwrap_or_else(default_scheduler_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            staleness: StalenessConfig::new(30),
            scan: ScanConfig {
                max_concurrent_series: 8,
                save_reports: true,
            },
            jellyfin: Some(JellyfinConfig::new("http://jellyfin.local:8096".to_string())),
            scheduler: Some(default_scheduler_config()),
            logging: None,
        };

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.staleness.cutoff_days, 30);
        assert_eq!(loaded.scan.max_concurrent_series, 8);
        assert!(loaded.scan.save_reports);
        assert_eq!(loaded.jellyfin.as_ref().unwrap().server_url, "http://jellyfin.local:8096");
        assert_eq!(loaded.scheduler.as_ref().unwrap().interval_hours, 24);
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.staleness.cutoff_days, 90);
        assert_eq!(config.scan.max_concurrent_series, 4);
        assert!(config.jellyfin.is_none());
        assert!(config.validate().is_ok());

        let scheduler = config.scheduler_or_default();
        assert_eq!(scheduler.interval_hours, 24);
        assert!(scheduler.run_on_startup);
        assert!(scheduler.schedule.is_none());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: Config = toml::from_str(
            r#"
            [staleness]

            [jellyfin]
            enabled = true
            server_url = "http://localhost:8096"
            "#,
        )
        .unwrap();
        assert_eq!(config.staleness.cutoff_days, 90);
        let jellyfin = config.jellyfin.as_ref().unwrap();
        assert_eq!(jellyfin.page_size, 500);
        assert_eq!(jellyfin.request_timeout_secs, 30);
        assert!(config.is_jellyfin_configured());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        config.scan.max_concurrent_series = 0;
        assert!(config.validate().is_err());

        config.scan.max_concurrent_series = 2;
        config.jellyfin = Some(JellyfinConfig::new(" ".to_string()));
        assert!(config.validate().is_err());
        assert!(!config.is_jellyfin_configured());

        config.jellyfin = Some(JellyfinConfig::new("http://localhost:8096".to_string()));
        assert!(config.validate().is_ok());

        config.scheduler = Some(SchedulerConfig {
            interval_hours: 0,
            schedule: None,
            run_on_startup: false,
        });
        assert!(config.validate().is_err());

        config.scheduler = Some(SchedulerConfig {
            interval_hours: 0,
            schedule: Some("0 0 3 * * *".to_string()),
            run_on_startup: false,
        });
        assert!(config.validate().is_ok());
    }
}
