// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Docket
//!
//! Every location the record store and managed storage touch lives here and is
//! handed to their constructors, so tests can point both at a temporary
//! directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Record store settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Managed storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Output formatting
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Mark the folder hidden where the OS has such an attribute
    #[serde(default = "default_true")]
    pub hidden: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// chrono format used to stamp `modification`
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Max characters of a file name shown in confirmation prompts
    #[serde(default = "default_truncate")]
    pub truncate: usize,
}

// Default value functions
fn default_db_path() -> PathBuf { PathBuf::from("documents.db") }
fn default_storage_path() -> PathBuf { PathBuf::from(".storage") }
fn default_true() -> bool { true }
fn default_timestamp_format() -> String { crate::validation::TIMESTAMP_FORMAT.to_string() }
fn default_truncate() -> usize { 25 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            hidden: default_true(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            truncate: default_truncate(),
        }
    }
}

impl AppConfig {
    /// Configuration rooted at `dir`: database and storage both live inside it.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            database: DatabaseConfig {
                path: dir.join(default_db_path()),
            },
            storage: StorageConfig {
                path: dir.join(default_storage_path()),
                hidden: true,
            },
            display: DisplayConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::DocketError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
