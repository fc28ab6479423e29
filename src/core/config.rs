use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::tracker::{ReportCacheSettings, TrackerSettings};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrankfurterProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub frankfurter: Option<FrankfurterProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            frankfurter: Some(FrankfurterProviderConfig {
                base_url: "https://api.frankfurter.dev".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportCacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for ReportCacheConfig {
    fn default() -> Self {
        ReportCacheConfig {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Ledger the commands operate on; lets several people share a machine.
    #[serde(default = "default_profile")]
    pub profile: u64,
    pub base_currency: String,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default = "default_rate_refresh_secs")]
    pub rate_refresh_secs: u64,
    #[serde(default)]
    pub report_cache: ReportCacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

fn default_profile() -> u64 {
    1
}

fn default_rate_refresh_secs() -> u64 {
    3600
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    64
}

fn default_cache_ttl_secs() -> u64 {
    900
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "outlay", "outlay")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "outlay", "outlay")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            base_currency: self.base_currency.clone(),
            currencies: self.currencies.clone(),
            refresh_after: Duration::seconds(self.rate_refresh_secs as i64),
            report_cache: self.report_cache.enabled.then(|| ReportCacheSettings {
                capacity: self.report_cache.capacity,
                ttl: Duration::seconds(self.report_cache.ttl_secs as i64),
            }),
        }
    }
}
