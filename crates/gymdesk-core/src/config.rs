//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the backend base URL, the last e-mail used to log in, the gym a System
//! Admin last worked in, and the preferred page size.
//!
//! Configuration is stored at `~/.config/gymdesk/config.json`. The
//! `GYMDESK_API_URL` and `GYMDESK_EMAIL` environment variables override the
//! stored values for the current run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Id;
use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "gymdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

pub const ENV_API_URL: &str = "GYMDESK_API_URL";
pub const ENV_EMAIL: &str = "GYMDESK_EMAIL";
pub const ENV_PASSWORD: &str = "GYMDESK_PASSWORD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub last_email: Option<String>,
    pub selected_gym_id: Option<Id>,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            last_email: None,
            selected_gym_id: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load the stored config and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Apply overrides from `lookup` (the process environment in practice)
    /// and clamp out-of-range values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = set(ENV_API_URL) {
            debug!(url = %url, "API URL from environment");
            self.api_base_url = url;
        }
        if let Some(email) = set(ENV_EMAIL) {
            self.last_email = Some(email);
        }
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = DEFAULT_API_URL.to_string();
        }
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root of the session file, snapshots and logs
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let config: Config = serde_json::from_str(r#"{"last_email":"a@b.c"}"#).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.last_email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            (ENV_API_URL, "https://gym.example/api"),
            (ENV_EMAIL, "owner@gym.example"),
        ]));
        assert_eq!(config.api_base_url, "https://gym.example/api");
        assert_eq!(config.last_email.as_deref(), Some("owner@gym.example"));
    }

    #[test]
    fn test_blank_override_ignored_and_page_size_clamped() {
        let mut config = Config {
            api_base_url: String::new(),
            page_size: 1000,
            ..Default::default()
        };
        config.apply_overrides(env(&[(ENV_API_URL, "  ")]));
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
    }
}
