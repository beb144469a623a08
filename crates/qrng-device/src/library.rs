// SPDX-License-Identifier: Apache-2.0
//! Load the vendor QRNG shared library and resolve its entry points.
//!
//! The vendor ships one library per platform:
//!
//! ```text
//! libqrng_vertex.so     (Linux)
//! qrng_vertex.dll       (Windows)
//! ```
//!
//! Symbols are resolved once into a read-only function table. Sessions share
//! that table; nothing in it is ever rebound.

use std::ffi::{CStr, c_int};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use libloading::{Library, Symbol};

use crate::api::DeviceApi;
use crate::config::ENV_LIBRARY_PATH;
use crate::error::{QrngError, Result};
use crate::ffi::{self, QrngHandle, QrngSize};

/// Largest `f32` strictly below 1.0.
const F32_BELOW_ONE: f32 = 0.999_999_94;

// ---------------------------------------------------------------------------
// QRNG function table
// ---------------------------------------------------------------------------

/// A loaded vendor library with all function pointers resolved.
///
/// The library handle is kept alive for the lifetime of this struct so the
/// loaded `.so` is not unloaded while we still hold function pointers into it.
pub struct QrngLibrary {
    _library: Library,

    /// Path the library was loaded from (for diagnostics).
    library_path: String,

    // -- Bridge --------------------------------------------------------------
    fn_product_name_to_enum: ffi::FnProductNameToEnum,
    fn_init_param: ffi::FnInitParam,

    // -- Lifecycle & status --------------------------------------------------
    fn_deinit: ffi::FnDeinit,
    fn_get_status: ffi::FnGetStatus,

    // -- Scalars -------------------------------------------------------------
    fn_rand: ffi::FnRand,
    fn_urand: ffi::FnUrand,
    fn_urand2: Option<ffi::FnUrand2>,

    // -- Buffered fills ------------------------------------------------------
    fn_get: ffi::FnGet,
    fn_get_raw_ent: ffi::FnGetRawEnt,
    fn_get_with_ec: ffi::FnGetWithEc,
}

impl QrngLibrary {
    /// Load the vendor library and resolve all function pointers.
    ///
    /// # Errors
    ///
    /// Returns [`QrngError::LoadFailed`] if the library cannot be opened, or
    /// [`QrngError::SymbolNotFound`] if a required symbol cannot be resolved.
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();

        // SAFETY: we are loading an external shared library. The caller is
        // responsible for ensuring the library is trustworthy.
        let library = unsafe { Library::new(path) }.map_err(|e| QrngError::LoadFailed {
            path: path_str.clone(),
            cause: e.to_string(),
        })?;

        tracing::info!("loaded QRNG library '{path_str}'");

        let fn_product_name_to_enum = resolve_required(&library, ffi::SYM_PRODUCT_NAME_TO_ENUM)?;
        let fn_init_param = resolve_required(&library, ffi::SYM_INIT_PARAM)?;
        let fn_deinit = resolve_required(&library, ffi::SYM_DEINIT)?;
        let fn_get_status = resolve_required(&library, ffi::SYM_GET_STATUS)?;
        let fn_rand = resolve_required(&library, ffi::SYM_RAND)?;
        let fn_urand = resolve_required(&library, ffi::SYM_URAND)?;
        let fn_get = resolve_required(&library, ffi::SYM_GET)?;
        let fn_get_raw_ent = resolve_required(&library, ffi::SYM_GET_RAW_ENT)?;
        let fn_get_with_ec = resolve_required(&library, ffi::SYM_GET_WITH_EC)?;

        let fn_urand2 = resolve_optional::<ffi::FnUrand2>(&library, ffi::SYM_URAND2);
        if fn_urand2.is_none() {
            tracing::warn!(
                "'{path_str}' does not export {}; single precision values are narrowed from {}",
                ffi::SYM_URAND2,
                ffi::SYM_URAND
            );
        }

        Ok(Self {
            _library: library,
            library_path: path_str,
            fn_product_name_to_enum,
            fn_init_param,
            fn_deinit,
            fn_get_status,
            fn_rand,
            fn_urand,
            fn_urand2,
            fn_get,
            fn_get_raw_ent,
            fn_get_with_ec,
        })
    }

    /// Where to look for the library when no path is configured.
    ///
    /// `QRNG_LIBRARY_PATH` wins; otherwise the platform file name of
    /// `qrng_vertex` is handed to the system loader's search path.
    pub fn default_path() -> PathBuf {
        match std::env::var_os(ENV_LIBRARY_PATH) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(libloading::library_filename("qrng_vertex")),
        }
    }

    /// Filesystem path the library was loaded from.
    pub fn library_path(&self) -> &str {
        &self.library_path
    }

    /// Whether the library exports the native single precision generator.
    pub fn has_native_urand_f32(&self) -> bool {
        self.fn_urand2.is_some()
    }
}

/// Buffer length as the native `s32`. Sessions bound counts well below
/// `QrngSize::MAX`, so saturation never shortens a real request.
fn native_len(len: usize) -> QrngSize {
    QrngSize::try_from(len).unwrap_or(QrngSize::MAX)
}

impl DeviceApi for QrngLibrary {
    fn describe(&self) -> String {
        self.library_path.clone()
    }

    fn product_code(&self, product_name: &CStr) -> c_int {
        unsafe { (self.fn_product_name_to_enum)(product_name.as_ptr()) }
    }

    fn open(&self, product_code: c_int, device_path: &CStr) -> QrngHandle {
        unsafe { (self.fn_init_param)(product_code, device_path.as_ptr()) }
    }

    unsafe fn close(&self, handle: QrngHandle) {
        unsafe { (self.fn_deinit)(handle) }
    }

    unsafe fn status(&self, handle: QrngHandle) -> c_int {
        unsafe { (self.fn_get_status)(handle) }
    }

    unsafe fn rand(&self, handle: QrngHandle) -> c_int {
        unsafe { (self.fn_rand)(handle) }
    }

    unsafe fn urand(&self, handle: QrngHandle) -> f64 {
        unsafe { (self.fn_urand)(handle) }
    }

    unsafe fn urand_f32(&self, handle: QrngHandle) -> f32 {
        match self.fn_urand2 {
            Some(f) => unsafe { f(handle) },
            // Narrowing can round up to 1.0.
            None => (unsafe { (self.fn_urand)(handle) } as f32).min(F32_BELOW_ONE),
        }
    }

    unsafe fn fill_bytes(
        &self,
        handle: QrngHandle,
        data: &mut [u8],
        filled: &mut QrngSize,
    ) -> c_int {
        unsafe { (self.fn_get)(handle, data.as_mut_ptr(), native_len(data.len()), filled) }
    }

    unsafe fn fill_raw_entropy(
        &self,
        handle: QrngHandle,
        data: &mut [u16],
        filled: &mut QrngSize,
    ) -> c_int {
        unsafe { (self.fn_get_raw_ent)(handle, data.as_mut_ptr(), native_len(data.len()), filled) }
    }

    unsafe fn fill_certified(
        &self,
        handle: QrngHandle,
        data: &mut [u8],
        entropy_bits: &mut [u16],
        certification: &mut [f32],
    ) -> c_int {
        unsafe {
            (self.fn_get_with_ec)(
                handle,
                data.as_mut_ptr(),
                native_len(data.len()),
                entropy_bits.as_mut_ptr(),
                native_len(entropy_bits.len()),
                certification.as_mut_ptr(),
                native_len(certification.len()),
            )
        }
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for QrngLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrngLibrary")
            .field("library_path", &self.library_path)
            .field("native_urand_f32", &self.has_native_urand_f32())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Symbol resolution helpers
// ---------------------------------------------------------------------------

/// Resolve a required symbol. Returns an error if the symbol is missing.
fn resolve_required<T: Copy>(library: &Library, name: &str) -> Result<T> {
    tracing::trace!("resolving required symbol '{name}'");

    // SAFETY: The caller guarantees the type `T` matches the actual function
    // signature exported by the library. This is the core FFI contract.
    unsafe {
        let sym: Symbol<T> = library
            .get(name.as_bytes())
            .map_err(|e| QrngError::SymbolNotFound {
                symbol: name.to_string(),
                cause: e.to_string(),
            })?;
        Ok(*sym)
    }
}

/// Resolve an optional symbol. Returns `None` if the symbol is missing.
fn resolve_optional<T: Copy>(library: &Library, name: &str) -> Option<T> {
    tracing::trace!("resolving optional symbol '{name}'");

    unsafe { library.get::<T>(name.as_bytes()).ok().map(|s| *s) }
}

// ---------------------------------------------------------------------------
// Process-wide registry
// ---------------------------------------------------------------------------

struct Registered {
    path: PathBuf,
    library: Result<Arc<QrngLibrary>>,
}

static GLOBAL: OnceLock<Registered> = OnceLock::new();

/// The process-wide library, loaded from [`QrngLibrary::default_path`] on
/// first use.
pub fn global() -> Result<Arc<QrngLibrary>> {
    global_from(&QrngLibrary::default_path())
}

/// The process-wide library, loaded from `path` if this is the first call.
///
/// The registry is initialized exactly once. Later calls get the same
/// library (or the same load error) regardless of `path`.
pub fn global_from(path: &Path) -> Result<Arc<QrngLibrary>> {
    let registered = GLOBAL.get_or_init(|| Registered {
        path: path.to_path_buf(),
        library: QrngLibrary::load(path).map(Arc::new),
    });

    if registered.path != path {
        tracing::debug!(
            "QRNG library already registered from '{}'; ignoring '{}'",
            registered.path.display(),
            path.display()
        );
    }

    registered.library.clone()
}
