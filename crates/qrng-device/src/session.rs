// SPDX-License-Identifier: Apache-2.0
//! QRNG device session management.
//!
//! A session is the handle for every request to a QRNG device. Sessions are
//! created via [`QrngSession::open`] (or one of its variants), released with
//! [`QrngSession::close`], and torn down automatically when dropped.

use std::ffi::{CString, c_void};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::DeviceApi;
use crate::config::QrngConfig;
use crate::error::{QrngError, Result};
use crate::ffi::{self, QrngHandle, QrngSize};
use crate::library;
use crate::product::Product;
use crate::status::DeviceStatus;

/// A live native handle.
struct RawHandle(NonNull<c_void>);

// SAFETY: the vendor library does not tie a session to the thread that
// created it. Access is serialized by the session mutex.
unsafe impl Send for RawHandle {}

impl RawHandle {
    fn as_ptr(&self) -> QrngHandle {
        self.0.as_ptr()
    }
}

enum SessionState {
    Live(RawHandle),
    Closed,
}

/// An open session with a QRNG device.
///
/// The session exclusively owns its native handle. Every operation holds an
/// internal lock for the duration of the native call, so a session may be
/// shared between threads but only one request reaches the device at a time.
pub struct QrngSession {
    api: Arc<dyn DeviceApi>,
    product: String,
    device: String,
    state: Mutex<SessionState>,
}

impl QrngSession {
    /// Open a session through the process-wide vendor library.
    ///
    /// Both arguments must be text; anything else is rejected at compile time:
    ///
    /// ```compile_fail
    /// use qrng_device::QrngSession;
    /// let _ = QrngSession::open(0, "/dev/xdma0");
    /// ```
    pub fn open(product_name: &str, device_path: &str) -> Result<Self> {
        let (c_product, c_device) = c_arguments(product_name, device_path)?;
        let api: Arc<dyn DeviceApi> = library::global()?;
        Self::open_resolved(api, product_name, device_path, &c_product, &c_device)
    }

    /// Open a session on an explicit device layer.
    pub fn open_with(
        api: Arc<dyn DeviceApi>,
        product_name: &str,
        device_path: &str,
    ) -> Result<Self> {
        let (c_product, c_device) = c_arguments(product_name, device_path)?;
        Self::open_resolved(api, product_name, device_path, &c_product, &c_device)
    }

    /// Open a session for a known product through the process-wide library.
    pub fn open_product(product: Product, device_path: &str) -> Result<Self> {
        Self::open(product.name(), device_path)
    }

    /// Open the session a configuration describes.
    ///
    /// A configured `library_path` only takes effect if the process-wide
    /// library has not been loaded yet.
    pub fn from_config(config: &QrngConfig) -> Result<Self> {
        config.validate()?;
        let (c_product, c_device) = c_arguments(&config.product, &config.device)?;
        let api: Arc<dyn DeviceApi> = match &config.library_path {
            Some(path) => library::global_from(path)?,
            None => library::global()?,
        };
        Self::open_resolved(api, &config.product, &config.device, &c_product, &c_device)
    }

    fn open_resolved(
        api: Arc<dyn DeviceApi>,
        product_name: &str,
        device_path: &str,
        c_product: &CString,
        c_device: &CString,
    ) -> Result<Self> {
        let code = api.product_code(c_product);
        if code < 0 {
            return Err(QrngError::UnknownProduct(product_name.to_string()));
        }

        let Some(handle) = NonNull::new(api.open(code, c_device)) else {
            return Err(QrngError::OpenFailed {
                product: product_name.to_string(),
                device: device_path.to_string(),
                status: ffi::QRNG_ERROR_NULL_PTR,
            });
        };
        let handle = RawHandle(handle);

        // SAFETY: `handle` was just returned by `open` and is not shared yet.
        let status = unsafe { api.status(handle.as_ptr()) };
        if status == ffi::QRNG_SUCCESS {
            tracing::debug!(
                "opened {product_name} on '{device_path}' via {} (handle {:?})",
                api.describe(),
                handle.as_ptr()
            );
        } else {
            tracing::warn!(
                "opened {product_name} on '{device_path}' with status {}",
                DeviceStatus::from_code(status)
            );
        }

        Ok(Self {
            api,
            product: product_name.to_string(),
            device: device_path.to_string(),
            state: Mutex::new(SessionState::Live(handle)),
        })
    }

    /// Product name the session was opened with.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Device path the session was opened with.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn is_live(&self) -> bool {
        matches!(*self.lock(), SessionState::Live(_))
    }

    /// Release the native handle.
    ///
    /// The first call releases it; later calls do nothing.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.lock(), SessionState::Closed);
        if let SessionState::Live(handle) = previous {
            // SAFETY: the handle was live and is now unreachable from `state`.
            unsafe { self.api.close(handle.as_ptr()) };
            tracing::debug!("closed {} session on '{}'", self.product, self.device);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with the live handle while holding the session lock.
    fn with_handle<R>(&self, op: &str, f: impl FnOnce(QrngHandle) -> Result<R>) -> Result<R> {
        let guard = self.lock();
        match &*guard {
            SessionState::Live(handle) => {
                tracing::trace!("{op} on {} session", self.product);
                f(handle.as_ptr())
            }
            SessionState::Closed => Err(QrngError::SessionClosed),
        }
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Latest native status code of this session.
    pub fn status(&self) -> Result<i32> {
        // SAFETY (all retrieval methods): the handle is live and the session
        // lock is held for the whole call.
        self.with_handle("status", |h| Ok(unsafe { self.api.status(h) }))
    }

    pub fn device_status(&self) -> Result<DeviceStatus> {
        self.status().map(DeviceStatus::from_code)
    }

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    /// A random integer in `[0, 32767]`.
    pub fn rand(&self) -> Result<i32> {
        self.with_handle("rand", |h| Ok(unsafe { self.api.rand(h) }))
    }

    /// A uniformly distributed double in `[0.0, 1.0)`.
    pub fn urand(&self) -> Result<f64> {
        self.with_handle("urand", |h| Ok(unsafe { self.api.urand(h) }))
    }

    /// A uniformly distributed float in `[0.0, 1.0)`.
    pub fn urand_f32(&self) -> Result<f32> {
        self.with_handle("urand_f32", |h| Ok(unsafe { self.api.urand_f32(h) }))
    }

    // -----------------------------------------------------------------------
    // Buffered retrieval
    // -----------------------------------------------------------------------

    /// `count` hashed random bytes.
    ///
    /// If the device fills fewer than `count` bytes the tail stays zero; this
    /// is logged, not reported as an error.
    pub fn get(&self, count: usize) -> Result<Vec<u8>> {
        check_len(count)?;
        self.with_handle("get", |h| {
            if count == 0 {
                return Ok(Vec::new());
            }
            let mut data = vec![0u8; count];
            let mut filled: QrngSize = 0;
            check_status(unsafe { self.api.fill_bytes(h, &mut data, &mut filled) })?;
            note_short_fill("get", count, filled);
            Ok(data)
        })
    }

    /// `count` raw entropy samples, unhashed.
    pub fn get_raw_entropy(&self, count: usize) -> Result<Vec<u16>> {
        check_len(count)?;
        self.with_handle("get_raw_entropy", |h| {
            if count == 0 {
                return Ok(Vec::new());
            }
            let mut data = vec![0u16; count];
            let mut filled: QrngSize = 0;
            check_status(unsafe { self.api.fill_raw_entropy(h, &mut data, &mut filled) })?;
            note_short_fill("get_raw_entropy", count, filled);
            Ok(data)
        })
    }

    /// `count` hashed bytes with per-block entropy and certification values.
    ///
    /// `count` must be a positive multiple of 8; every 8-byte block carries one
    /// entropy count and one certification value.
    pub fn get_with_certification(&self, count: usize) -> Result<CertifiedSample> {
        if count == 0 || count % 8 != 0 {
            return Err(QrngError::InvalidCount(count));
        }
        check_len(count)?;
        self.with_handle("get_with_certification", |h| {
            let blocks = count / 8;
            let mut data = vec![0u8; count];
            let mut entropy_bits = vec![0u16; blocks];
            let mut certification = vec![0f32; blocks];
            check_status(unsafe {
                self.api
                    .fill_certified(h, &mut data, &mut entropy_bits, &mut certification)
            })?;
            Ok(CertifiedSample {
                data,
                entropy_bits,
                certification,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Shuffle
    // -----------------------------------------------------------------------

    /// Shuffle `items` in place with Fisher-Yates, drawing from [`urand`].
    ///
    /// The session lock is held for the whole shuffle.
    ///
    /// [`urand`]: QrngSession::urand
    pub fn shuffle<T>(&self, items: &mut [T]) -> Result<()> {
        self.with_handle("shuffle", |h| {
            for i in (1..items.len()).rev() {
                let r = unsafe { self.api.urand(h) };
                // A device returning exactly 1.0 would otherwise index past `i`.
                let j = ((r * (i + 1) as f64) as usize).min(i);
                items.swap(i, j);
            }
            Ok(())
        })
    }
}

impl Drop for QrngSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for QrngSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrngSession")
            .field("product", &self.product)
            .field("device", &self.device)
            .field("device_layer", &self.api.describe())
            .field("live", &self.is_live())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Certified sample
// ---------------------------------------------------------------------------

/// Hashed data with its certification metadata.
///
/// `entropy_bits` and `certification` hold one entry per 8-byte block of
/// `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct CertifiedSample {
    pub data: Vec<u8>,
    pub entropy_bits: Vec<u16>,
    pub certification: Vec<f32>,
}

impl CertifiedSample {
    pub fn block_count(&self) -> usize {
        self.data.len() / 8
    }

    /// Iterate `(block, entropy_bits, certification)` per 8-byte block.
    pub fn blocks(&self) -> impl Iterator<Item = (&[u8], u16, f32)> + '_ {
        self.data
            .chunks_exact(8)
            .zip(self.entropy_bits.iter().copied())
            .zip(self.certification.iter().copied())
            .map(|((block, bits), cert)| (block, bits, cert))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn c_argument(argument: &'static str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| QrngError::InvalidArgumentType {
        argument,
        reason: format!("contains a NUL byte at position {}", e.nul_position()),
    })
}

fn c_arguments(product_name: &str, device_path: &str) -> Result<(CString, CString)> {
    Ok((
        c_argument("product_name", product_name)?,
        c_argument("device_path", device_path)?,
    ))
}

/// Element counts cross the boundary as the native `s32` (`long`). That is
/// only 32 bits wide on Windows, so counts are held to `i32::MAX` everywhere.
fn check_len(count: usize) -> Result<()> {
    if i32::try_from(count).is_err() {
        return Err(QrngError::InvalidCount(count));
    }
    Ok(())
}

fn check_status(code: i32) -> Result<()> {
    if ffi::is_error(code) {
        Err(QrngError::from_code(code))
    } else {
        Ok(())
    }
}

fn note_short_fill(op: &str, requested: usize, filled: QrngSize) {
    if usize::try_from(filled).map_or(true, |n| n < requested) {
        tracing::warn!("{op}: device filled {filled} of {requested} elements; remainder is zero");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(check_len(0).is_ok());
        assert!(check_len(i32::MAX as usize).is_ok());
        assert!(matches!(
            check_len(i32::MAX as usize + 1),
            Err(QrngError::InvalidCount(_))
        ));
    }

    #[test]
    fn test_c_argument_rejects_nul() {
        let err = c_argument("device_path", "/dev/x\0dma0").unwrap_err();
        match err {
            QrngError::InvalidArgumentType { argument, reason } => {
                assert_eq!(argument, "device_path");
                assert!(reason.contains("position 6"));
            }
            other => panic!("expected InvalidArgumentType, got {other:?}"),
        }
    }

    #[test]
    fn test_blocks() {
        let sample = CertifiedSample {
            data: (0u8..16).collect(),
            entropy_bits: vec![60, 61],
            certification: vec![0.5, 0.75],
        };
        let blocks: Vec<_> = sample.blocks().collect();
        assert_eq!(sample.block_count(), 2);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].0, &[8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(blocks[1].1, 61);
        assert_eq!(blocks[1].2, 0.75);
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(0).is_ok());
        assert!(matches!(
            check_status(-10),
            Err(QrngError::DeviceError { code: -10, .. })
        ));
    }
}
