// SPDX-License-Identifier: Apache-2.0
//! Error types for QRNG device interaction.

use crate::config::ConfigError;
use crate::ffi;

/// Errors arising from QRNG device operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QrngError {
    #[error("failed to load QRNG library at '{path}': {cause}")]
    LoadFailed { path: String, cause: String },

    #[error("symbol '{symbol}' not found in QRNG library: {cause}")]
    SymbolNotFound { symbol: String, cause: String },

    #[error("invalid {argument}: {reason}")]
    InvalidArgumentType {
        argument: &'static str,
        reason: String,
    },

    #[error("product '{0}' does not exist")]
    UnknownProduct(String),

    #[error("invalid count {0}: certified reads need a positive multiple of 8, all reads at most i32::MAX")]
    InvalidCount(usize),

    #[error("QRNG device call failed with status {code}: {reason}")]
    DeviceError { code: i32, reason: &'static str },

    #[error("failed to open {product} on '{device}' (status {status})")]
    OpenFailed {
        product: String,
        device: String,
        status: i32,
    },

    #[error("QRNG session is closed")]
    SessionClosed,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl QrngError {
    /// Convert a raw native status code into a typed error.
    ///
    /// The code is kept verbatim; the reason is looked up from the status table.
    pub fn from_code(code: i32) -> Self {
        QrngError::DeviceError {
            code,
            reason: ffi::status_message(code),
        }
    }

    /// The native status code carried by this error, if any.
    pub fn device_code(&self) -> Option<i32> {
        match self {
            QrngError::DeviceError { code, .. } => Some(*code),
            QrngError::OpenFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QrngError>;
