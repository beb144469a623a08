// SPDX-License-Identifier: Apache-2.0
//! In-process QRNG device for tests and demos.
//!
//! [`MockDevice`] implements [`DeviceApi`] with a seeded [`StdRng`] standing in
//! for the hardware. It knows the same product names as the vendor table,
//! validates certified sizes like the firmware does, and counts calls so tests
//! can assert what actually reached the device.
//!
//! Only compiled with the `mock` feature.
//!
//! ```rust
//! use std::sync::Arc;
//! use qrng_device::{MockDevice, QrngSession};
//!
//! let session = QrngSession::open_with(Arc::new(MockDevice::new()), "VERTEX_A1", "/dev/xdma0")
//!     .unwrap();
//! assert_eq!(session.status().unwrap(), 0);
//! assert_eq!(session.get(15).unwrap().len(), 15);
//! ```

use std::collections::{HashMap, VecDeque};
use std::ffi::{CStr, c_int};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::DeviceApi;
use crate::ffi::{self, QrngHandle, QrngSize};
use crate::product::Product;

const DEFAULT_SEED: u64 = 0x5EED_0DCE;

/// Full-scale value of the raw entropy samples (12-bit ADC).
const RAW_ENTROPY_MAX: u16 = 0x0FFF;

#[derive(Debug)]
struct MockState {
    rng: StdRng,
    next_id: usize,
    /// Live handles and their status codes.
    live: HashMap<usize, c_int>,
    init_status: c_int,
    refuse_open: bool,
    fail_next: Option<c_int>,
    short_fill: Option<usize>,
    scripted_urand: VecDeque<f64>,
}

/// A fake QRNG device.
#[derive(Debug)]
pub struct MockDevice {
    state: Mutex<MockState>,
    opened: AtomicUsize,
    close_calls: AtomicUsize,
    device_calls: AtomicUsize,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(MockState {
                rng: StdRng::seed_from_u64(seed),
                next_id: 1,
                live: HashMap::new(),
                init_status: ffi::QRNG_SUCCESS,
                refuse_open: false,
                fail_next: None,
                short_fill: None,
                scripted_urand: VecDeque::new(),
            }),
            opened: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            device_calls: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Fault injection
    // -----------------------------------------------------------------------

    /// Status given to sessions opened from now on.
    pub fn set_init_status(&self, code: c_int) {
        self.state().init_status = code;
    }

    /// Make `open` return a null handle.
    pub fn refuse_open(&self, refuse: bool) {
        self.state().refuse_open = refuse;
    }

    /// The next fill call returns `code` without writing anything.
    pub fn fail_next(&self, code: c_int) {
        self.state().fail_next = Some(code);
    }

    /// The next successful fill call writes at most `n` elements.
    pub fn short_fill(&self, n: usize) {
        self.state().short_fill = Some(n);
    }

    /// Queue values for upcoming `urand` calls before falling back to the RNG.
    pub fn push_urand(&self, values: impl IntoIterator<Item = f64>) {
        self.state().scripted_urand.extend(values);
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Handles currently open.
    pub fn open_sessions(&self) -> usize {
        self.state().live.len()
    }

    /// Handles ever opened.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Handle-taking calls other than `close`.
    pub fn device_calls(&self) -> usize {
        self.device_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, handle: QrngHandle) -> std::sync::MutexGuard<'_, MockState> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        assert!(
            state.live.contains_key(&handle.addr()),
            "mock device used with a handle that is not open: {handle:?}"
        );
        state
    }

    /// Shared prologue of the fill calls: injected failure or element budget.
    fn begin_fill(state: &mut MockState, len: usize) -> Result<usize, c_int> {
        if let Some(code) = state.fail_next.take() {
            return Err(code);
        }
        Ok(state.short_fill.take().map_or(len, |n| n.min(len)))
    }
}

fn filled_count(n: usize) -> QrngSize {
    QrngSize::try_from(n).unwrap_or(QrngSize::MAX)
}

impl DeviceApi for MockDevice {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn product_code(&self, product_name: &CStr) -> c_int {
        product_name
            .to_str()
            .ok()
            .and_then(|name| name.parse::<Product>().ok())
            .map_or(-1, Product::code)
    }

    fn open(&self, product_code: c_int, device_path: &CStr) -> QrngHandle {
        let mut state = self.state();
        if state.refuse_open || Product::from_code(product_code).is_none() {
            return std::ptr::null_mut();
        }

        let status = if device_path.is_empty() {
            ffi::QRNG_NO_DEVICE_FOUND
        } else {
            state.init_status
        };

        let id = state.next_id;
        state.next_id += 1;
        state.live.insert(id, status);
        self.opened.fetch_add(1, Ordering::SeqCst);

        std::ptr::without_provenance_mut(id)
    }

    unsafe fn close(&self, handle: QrngHandle) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let removed = self.state().live.remove(&handle.addr());
        assert!(removed.is_some(), "mock device closed twice: {handle:?}");
    }

    unsafe fn status(&self, handle: QrngHandle) -> c_int {
        let state = self.enter(handle);
        state.live.get(&handle.addr()).copied().unwrap_or(ffi::QRNG_ERROR_NULL_PTR)
    }

    unsafe fn rand(&self, handle: QrngHandle) -> c_int {
        self.enter(handle).rng.gen_range(0..=32767)
    }

    unsafe fn urand(&self, handle: QrngHandle) -> f64 {
        let mut state = self.enter(handle);
        match state.scripted_urand.pop_front() {
            Some(v) => v,
            None => state.rng.r#gen::<f64>(),
        }
    }

    unsafe fn urand_f32(&self, handle: QrngHandle) -> f32 {
        self.enter(handle).rng.r#gen::<f32>()
    }

    unsafe fn fill_bytes(
        &self,
        handle: QrngHandle,
        data: &mut [u8],
        filled: &mut QrngSize,
    ) -> c_int {
        let mut state = self.enter(handle);
        let n = match Self::begin_fill(&mut state, data.len()) {
            Ok(n) => n,
            Err(code) => return code,
        };
        state.rng.fill(&mut data[..n]);
        *filled = filled_count(n);
        ffi::QRNG_SUCCESS
    }

    unsafe fn fill_raw_entropy(
        &self,
        handle: QrngHandle,
        data: &mut [u16],
        filled: &mut QrngSize,
    ) -> c_int {
        let mut state = self.enter(handle);
        let n = match Self::begin_fill(&mut state, data.len()) {
            Ok(n) => n,
            Err(code) => return code,
        };
        for sample in &mut data[..n] {
            *sample = state.rng.gen_range(0..=RAW_ENTROPY_MAX);
        }
        *filled = filled_count(n);
        ffi::QRNG_SUCCESS
    }

    unsafe fn fill_certified(
        &self,
        handle: QrngHandle,
        data: &mut [u8],
        entropy_bits: &mut [u16],
        certification: &mut [f32],
    ) -> c_int {
        let mut state = self.enter(handle);
        if data.len() % 8 != 0 {
            return ffi::QRNG_ERROR_MULTIPLE_OF_8_REQUIRED;
        }
        if entropy_bits.len() < data.len() / 8 || certification.len() < data.len() / 8 {
            return ffi::QRNG_ERROR_INTERNAL_MEMORY;
        }
        if let Some(code) = state.fail_next.take() {
            return code;
        }

        state.rng.fill(data);
        for bits in entropy_bits.iter_mut() {
            *bits = state.rng.gen_range(48..=64);
        }
        for value in certification.iter_mut() {
            *value = state.rng.gen_range(0.9f32..1.0);
        }
        ffi::QRNG_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(mock: &MockDevice) -> QrngHandle {
        mock.open(Product::VertexA1.code(), c"/dev/xdma0")
    }

    #[test]
    fn test_product_table() {
        let mock = MockDevice::new();
        assert_eq!(mock.product_code(c"VERTEX_A1"), 0);
        assert_eq!(mock.product_code(c"APEXTREME"), 2);
        assert!(mock.product_code(c"non-existent-product") < 0);
    }

    #[test]
    fn test_open_close_counters() {
        let mock = MockDevice::new();
        let handle = open(&mock);
        assert!(!handle.is_null());
        assert_eq!(mock.open_sessions(), 1);

        unsafe { mock.close(handle) };
        assert_eq!(mock.open_sessions(), 0);
        assert_eq!(mock.close_calls(), 1);
        assert_eq!(mock.opened(), 1);
    }

    #[test]
    fn test_empty_device_path_reports_no_device() {
        let mock = MockDevice::new();
        let handle = mock.open(Product::VertexB1.code(), c"");
        assert_eq!(unsafe { mock.status(handle) }, ffi::QRNG_NO_DEVICE_FOUND);
    }

    #[test]
    fn test_certified_requires_multiple_of_8() {
        let mock = MockDevice::new();
        let handle = open(&mock);
        let mut data = [0u8; 12];
        let mut bits = [0u16; 1];
        let mut cert = [0f32; 1];
        let code = unsafe { mock.fill_certified(handle, &mut data, &mut bits, &mut cert) };
        assert_eq!(code, ffi::QRNG_ERROR_MULTIPLE_OF_8_REQUIRED);
    }

    #[test]
    fn test_short_fill_applies_once() {
        let mock = MockDevice::new();
        let handle = open(&mock);
        mock.short_fill(3);

        let mut buf = [0u16; 10];
        let mut filled = 0;
        assert_eq!(unsafe { mock.fill_raw_entropy(handle, &mut buf, &mut filled) }, 0);
        assert_eq!(filled, 3);
        assert!(buf[3..].iter().all(|&v| v == 0));
        assert!(buf.iter().all(|&v| v <= RAW_ENTROPY_MAX));

        assert_eq!(unsafe { mock.fill_raw_entropy(handle, &mut buf, &mut filled) }, 0);
        assert_eq!(filled, 10);
    }

    #[test]
    fn test_seeded_streams_repeat() {
        let a = MockDevice::with_seed(7);
        let b = MockDevice::with_seed(7);
        let (ha, hb) = (open(&a), open(&b));
        let xs: Vec<c_int> = (0..8).map(|_| unsafe { a.rand(ha) }).collect();
        let ys: Vec<c_int> = (0..8).map(|_| unsafe { b.rand(hb) }).collect();
        assert_eq!(xs, ys);
    }
}
