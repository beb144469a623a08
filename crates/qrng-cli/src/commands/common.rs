//! Shared helpers for CLI commands.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use qrng_device::{DeviceStatus, MockDevice, QrngConfig, QrngSession};

/// Device selection shared by every command that talks to a QRNG.
#[derive(Debug, Clone, Default)]
pub struct DeviceOptions {
    pub config: Option<PathBuf>,
    pub product: Option<String>,
    pub device: Option<String>,
    pub library: Option<PathBuf>,
    pub mock: bool,
}

impl DeviceOptions {
    /// Config file and `QRNG_*` variables, overridden by explicit flags.
    pub fn resolve_config(&self) -> Result<QrngConfig> {
        let mut config = QrngConfig::load(self.config.as_deref()).with_context(|| {
            match &self.config {
                Some(path) => format!("Failed to load config: {}", path.display()),
                None => "Failed to load config from environment".to_string(),
            }
        })?;

        if let Some(product) = &self.product {
            config.product.clone_from(product);
        }
        if let Some(device) = &self.device {
            config.device.clone_from(device);
        }
        if let Some(library) = &self.library {
            config.library_path = Some(library.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Open the configured session, on the in-process mock if requested.
    pub fn open_session(&self) -> Result<QrngSession> {
        let config = self.resolve_config()?;
        tracing::info!(
            "opening {} on '{}'{}",
            config.product,
            config.device,
            if self.mock { " (mock)" } else { "" }
        );

        let session = if self.mock {
            QrngSession::open_with(Arc::new(MockDevice::new()), &config.product, &config.device)
        } else {
            QrngSession::from_config(&config)
        };
        session.with_context(|| format!("Failed to open {} on '{}'", config.product, config.device))
    }
}

/// Styled one-line rendering of a native status code.
pub fn status_label(code: i32) -> String {
    let status = DeviceStatus::from_code(code);
    if status.is_ok() {
        style(status).green().to_string()
    } else {
        style(status).red().to_string()
    }
}

/// Render the first `cols * rows` values of `data` as a grid.
pub fn format_grid<T>(data: &[T], cols: usize, rows: usize, fmt: impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    for (i, value) in data.iter().take(cols * rows).enumerate() {
        if i % cols == 0 {
            out.push_str("\n\t");
        }
        let _ = write!(out, " {}", fmt(value));
    }
    out
}

pub fn hex_u8(v: &u8) -> String {
    format!("{v:02x}")
}

pub fn hex_u16(v: &u16) -> String {
    format!("{v:04x}")
}
