// SPDX-License-Identifier: Apache-2.0
//! Configuration for opening a QRNG session.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QRNG_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::product::Product;

pub const ENV_PRODUCT: &str = "QRNG_PRODUCT";
pub const ENV_DEVICE: &str = "QRNG_DEVICE";
pub const ENV_LIBRARY_PATH: &str = "QRNG_LIBRARY_PATH";

/// Which device to open, and through which vendor library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrngConfig {
    /// Product name as understood by the device table (e.g. "VERTEX_A1")
    #[serde(default = "default_product")]
    pub product: String,

    /// Device path or index (e.g. "/dev/xdma0" on Linux, "0" on Windows)
    #[serde(default = "default_device")]
    pub device: String,

    /// Explicit path to the vendor shared library
    #[serde(default)]
    pub library_path: Option<PathBuf>,
}

fn default_product() -> String {
    Product::VertexA1.name().to_string()
}

#[cfg(windows)]
fn default_device() -> String {
    "0".to_string()
}

#[cfg(not(windows))]
fn default_device() -> String {
    "/dev/xdma0".to_string()
}

impl Default for QrngConfig {
    fn default() -> Self {
        QrngConfig {
            product: default_product(),
            device: default_device(),
            library_path: None,
        }
    }
}

impl QrngConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.as_ref().display())))?;

        let config: QrngConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => QrngConfig::default(),
        };

        let config = config.merge_env_with(|key| std::env::var(key).ok());

        config.validate()?;
        Ok(config)
    }

    /// Merge overrides from a variable lookup into this configuration.
    ///
    /// Only variables the lookup returns override the file-loaded (or default)
    /// values.
    pub fn merge_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PRODUCT) {
            self.product = v;
        }
        if let Some(v) = lookup(ENV_DEVICE) {
            self.device = v;
        }
        if let Some(v) = lookup(ENV_LIBRARY_PATH) {
            self.library_path = Some(PathBuf::from(v));
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.product.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "product must not be empty".to_string(),
            ));
        }
        if self.device.is_empty() {
            return Err(ConfigError::ValidationError(
                "device must not be empty".to_string(),
            ));
        }
        for (field, value) in [("product", &self.product), ("device", &self.device)] {
            if value.contains('\0') {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must not contain NUL bytes"
                )));
            }
        }
        if let Some(path) = &self.library_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "library_path must not be empty; omit the field to use the default".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
