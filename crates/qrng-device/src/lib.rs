// SPDX-License-Identifier: Apache-2.0
//! # qrng-device
//!
//! Session layer over Quantum Dice Vertex and Apextreme quantum random number
//! generators.
//!
//! The vendor library (`libqrng_vertex.so` / `qrng_vertex.dll`) is loaded at
//! runtime and its entry points resolved into a shared function table. A
//! [`QrngSession`] owns one device handle and serves three kinds of data:
//! hashed random bytes, raw entropy samples, and hashed bytes with
//! per-block certification values.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │   application    │
//!                  └────────┬─────────┘
//!                           │ QrngSession
//!                  ┌────────┴─────────┐
//!                  │   qrng-device    │
//!                  │                  │
//!                  │  QrngSession     │ ← RAII handle, lock per call
//!                  │  dyn DeviceApi   │ ← device boundary
//!                  │  QrngLibrary     │ ← dlopen + dlsym, loaded once
//!                  │  MockDevice      │ ← in-process stand-in (`mock`)
//!                  └────────┬─────────┘
//!                           │ C ABI (extern "C")
//!               ┌───────────┴───────────┐
//!               │  libqrng_vertex.so    │
//!               └───────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qrng_device::QrngSession;
//!
//! let session = QrngSession::open("VERTEX_A1", "/dev/xdma0")
//!     .expect("failed to open QRNG");
//! println!("status: {}", session.device_status().expect("status"));
//!
//! let bytes = session.get(32).expect("get");
//! let certified = session.get_with_certification(32).expect("certified read");
//! for (block, bits, cert) in certified.blocks() {
//!     println!("{block:02x?} entropy={bits} cert={cert:.4}");
//! }
//!
//! let mut deck: Vec<u32> = (1..=52).collect();
//! session.shuffle(&mut deck).expect("shuffle");
//! # let _ = bytes;
//! ```
//!
//! Without hardware, enable the `mock` feature and open a session on a
//! `MockDevice` through [`QrngSession::open_with`].

pub mod api;
pub mod config;
pub mod error;
pub mod ffi;
pub mod library;
#[cfg(feature = "mock")]
pub mod mock;
pub mod product;
pub mod session;
pub mod status;

// Re-export the most commonly used types at crate root.
pub use api::DeviceApi;
pub use config::{ConfigError, QrngConfig};
pub use error::{QrngError, Result};
pub use library::QrngLibrary;
#[cfg(feature = "mock")]
pub use mock::MockDevice;
pub use product::Product;
pub use session::{CertifiedSample, QrngSession};
pub use status::DeviceStatus;
