// SPDX-License-Identifier: Apache-2.0
//! The boundary between the session layer and a device implementation.
//!
//! [`QrngLibrary`](crate::library::QrngLibrary) forwards every call to the
//! vendor shared library; `MockDevice` (feature `mock`) answers in
//! process. Sessions only ever talk to a `dyn DeviceApi`.

use std::ffi::{CStr, c_int};

use crate::ffi::{QrngHandle, QrngSize};

/// Operations a QRNG device layer must provide.
///
/// Methods taking a [`QrngHandle`] are `unsafe`: the caller guarantees the
/// handle was returned by [`DeviceApi::open`] on the same implementation,
/// has not been passed to [`DeviceApi::close`], and is not used concurrently
/// from another thread.
///
/// Fill methods report the number of elements actually written through
/// `filled` and return a native status code (negative on failure).
pub trait DeviceApi: Send + Sync {
    /// Short description for logs (library path, "mock", ...).
    fn describe(&self) -> String;

    /// Resolve a product name to its board code. Negative means unknown.
    fn product_code(&self, product_name: &CStr) -> c_int;

    /// Create a session object. Returns null if none could be allocated.
    fn open(&self, product_code: c_int, device_path: &CStr) -> QrngHandle;

    unsafe fn close(&self, handle: QrngHandle);

    unsafe fn status(&self, handle: QrngHandle) -> c_int;

    unsafe fn rand(&self, handle: QrngHandle) -> c_int;

    unsafe fn urand(&self, handle: QrngHandle) -> f64;

    unsafe fn urand_f32(&self, handle: QrngHandle) -> f32;

    unsafe fn fill_bytes(
        &self,
        handle: QrngHandle,
        data: &mut [u8],
        filled: &mut QrngSize,
    ) -> c_int;

    unsafe fn fill_raw_entropy(
        &self,
        handle: QrngHandle,
        data: &mut [u16],
        filled: &mut QrngSize,
    ) -> c_int;

    /// One combined call: `data.len()` bytes plus one entropy count and one
    /// certification value per 8-byte block.
    unsafe fn fill_certified(
        &self,
        handle: QrngHandle,
        data: &mut [u8],
        entropy_bits: &mut [u16],
        certification: &mut [f32],
    ) -> c_int;
}
