// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for pixcull

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::files::{normalize_extensions, DEFAULT_IMAGE_EXTENSIONS};
use crate::scanner::ScanOptions;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// File name suffixes treated as images
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Scanner tuning
    #[serde(default)]
    pub scan: ScanConfig,

    /// Soft-delete staging area
    #[serde(default)]
    pub staging: StagingConfig,

    /// Tag database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Worker threads for metadata reads (0 = available parallelism)
    #[serde(default)]
    pub workers: usize,
    /// Maximum events handed to the consumer per wake-up
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Capacity of the result channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StagingConfig {
    #[serde(default = "default_staging_dir")]
    pub dir: PathBuf,
    /// File count at which a purge is suggested
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_batch_size() -> usize { 50 }
fn default_channel_capacity() -> usize { 1024 }
fn default_threshold() -> usize { 2 }

fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Per-user data directory (`~/.pixcull`)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pixcull")
}

fn default_staging_dir() -> PathBuf { data_dir().join("cache") }
fn default_journal_path() -> PathBuf { data_dir().join("relocations.jsonl") }
fn default_db_path() -> PathBuf { data_dir().join("tags.db") }

/// Default configuration file location
pub fn default_config_path() -> PathBuf {
    data_dir().join("settings.json")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
            scan: ScanConfig::default(),
            staging: StagingConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            batch_size: default_batch_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: default_staging_dir(),
            threshold: default_threshold(),
            journal_path: default_journal_path(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::PixcullError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::Result<()> {
        if normalize_extensions(self.image_extensions.as_slice()).is_empty() {
            return Err(crate::PixcullError::Config(
                "image_extensions must not be empty".to_string(),
            ));
        }
        if self.scan.batch_size == 0 || self.scan.channel_capacity == 0 {
            return Err(crate::PixcullError::Config(
                "scan.batch_size and scan.channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Scanner options derived from this configuration
    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default()
            .with_extensions(self.image_extensions.as_slice())
            .with_batch_size(self.scan.batch_size)
            .with_channel_capacity(self.scan.channel_capacity);
        if self.scan.workers > 0 {
            options = options.with_workers(self.scan.workers);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.staging.threshold, 2);
        assert_eq!(config.scan.batch_size, 50);
        assert_eq!(config.image_extensions.len(), 6);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "staging": { "threshold": 10 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.staging.threshold, 10);
        assert_eq!(config.scan.channel_capacity, 1024);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(crate::PixcullError::Config(_))
        ));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut config = AppConfig::default();
        config.scan.workers = 3;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.scan.workers, 3);
        assert_eq!(loaded.scan_options().workers(), 3);
    }
}
