use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const JELLYFIN_API_KEY_ENV: &str = "MEDIACLEANER_JELLYFIN_API_KEY";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets and small bits of run state kept out of config.toml
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_jellyfin_api_key(&self) -> Option<&String> {
        self.get("jellyfin_api_key")
    }

    pub fn set_jellyfin_api_key(&mut self, key: String) {
        self.set("jellyfin_api_key".to_string(), key);
    }

    /// API key from the environment, falling back to the stored credential
    pub fn resolve_jellyfin_api_key(&self) -> Option<String> {
        std::env::var(JELLYFIN_API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.get_jellyfin_api_key().cloned())
    }

    pub fn get_last_scan_completed(&self) -> Option<DateTime<Utc>> {
        self.get("last_scan_completed")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_last_scan_completed(&mut self, timestamp: DateTime<Utc>) {
        self.set("last_scan_completed".to_string(), timestamp.to_rfc3339());
    }
}
