//! Configuration Management
//!
//! Handles persistent configuration storage for armnet.

use crate::arm::client::DEFAULT_BATCH_CONCURRENCY;
use crate::arm::http::DEFAULT_ENDPOINT;
use crate::model::Region;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Subscription used when none is given on the command line
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Resource group used to scope listings and lookups
    #[serde(default)]
    pub resource_group: Option<String>,
    /// Region listings are narrowed to
    #[serde(default)]
    pub region: Option<Region>,
    /// Management endpoint, for sovereign clouds or local emulators
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Calls kept in flight by batch operations
    #[serde(default)]
    pub batch_concurrency: Option<usize>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armnet").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; a missing or unreadable file gives
    /// the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;

        Ok(())
    }

    /// Get effective subscription (CLI > config > environment > Azure CLI profile)
    pub fn effective_subscription(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.subscription_id.clone())
            .or_else(crate::arm::auth::get_default_subscription)
    }

    /// Get effective resource group (CLI > config)
    pub fn effective_resource_group(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.resource_group.clone())
    }

    /// Get effective endpoint (CLI > config > public cloud)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Get effective region (CLI > config)
    pub fn effective_region(&self, cli: Option<&str>) -> Option<Region> {
        cli.map(Region::from_name).or_else(|| self.region.clone())
    }

    pub fn effective_batch_concurrency(&self) -> usize {
        self.batch_concurrency
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("armnet-config-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(&scratch_path());
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_endpoint(None), DEFAULT_ENDPOINT);
        assert_eq!(config.effective_batch_concurrency(), DEFAULT_BATCH_CONCURRENCY);
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path();
        let config = Config {
            subscription_id: Some("11111111-1111-1111-1111-111111111111".to_string()),
            resource_group: Some("rg-network".to_string()),
            region: Some(Region::from_name("West US")),
            endpoint: Some("http://localhost:8080".to_string()),
            batch_concurrency: Some(4),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.region, Some(Region::US_WEST));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_command_line_takes_precedence() {
        let config = Config {
            subscription_id: Some("from-config".to_string()),
            resource_group: Some("rg-config".to_string()),
            endpoint: Some("http://config".to_string()),
            batch_concurrency: Some(0),
            ..Config::default()
        };

        assert_eq!(
            config.effective_subscription(Some("from-cli")).as_deref(),
            Some("from-cli")
        );
        assert_eq!(config.effective_subscription(None).as_deref(), Some("from-config"));
        assert_eq!(config.effective_resource_group(None).as_deref(), Some("rg-config"));
        assert_eq!(config.effective_endpoint(Some("http://cli")), "http://cli");
        assert_eq!(config.effective_endpoint(None), "http://config");
        assert_eq!(config.effective_batch_concurrency(), 1);
    }
}
