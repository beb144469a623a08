// SPDX-License-Identifier: Apache-2.0
//! Supported QRNG product families.

use std::ffi::c_int;
use std::fmt;
use std::str::FromStr;

use crate::error::QrngError;
use crate::ffi;

/// A QRNG board family known to the vendor library.
///
/// The session layer never trusts this table for opening a device: the name
/// is always resolved by the library itself, so newer firmware may accept
/// products missing here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    VertexA1,
    VertexB1,
    Apextreme,
}

impl Product {
    pub const ALL: [Product; 3] = [Product::VertexA1, Product::VertexB1, Product::Apextreme];

    /// Native board code (`Qrng_board_type`).
    pub fn code(self) -> c_int {
        match self {
            Product::VertexA1 => ffi::QRNG_VERTEX_A1,
            Product::VertexB1 => ffi::QRNG_VERTEX_B1,
            Product::Apextreme => ffi::QRNG_APEXTREME,
        }
    }

    /// Name as spelled in the device table.
    pub fn name(self) -> &'static str {
        match self {
            Product::VertexA1 => "VERTEX_A1",
            Product::VertexB1 => "VERTEX_B1",
            Product::Apextreme => "APEXTREME",
        }
    }

    pub fn from_code(code: c_int) -> Option<Self> {
        Product::ALL.into_iter().find(|p| p.code() == code)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = QrngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| QrngError::UnknownProduct(s.to_string()))
    }
}
