// SPDX-License-Identifier: Apache-2.0
//! Raw FFI constants and type definitions for the Quantum Dice QRNG C API.
//!
//! These values must match `qrng_api.h` shipped with the vendor library
//! (`libqrng_vertex.so` / `qrng_vertex.dll`).
//!
//! We bind the *bridge* entry points (`qrng_bridge_*`) for product lookup and
//! session creation, because `qrng_init_param` takes its parameters as a
//! by-value struct. Every other function is the plain C API. All pointers are
//! resolved at runtime from the shared library, not linked statically.
//!
//! The header spells sizes and filled counts `s32`, which it defines as
//! `signed long`. That is 8 bytes on LP64 Linux and 4 bytes on Windows, so
//! every size and `bytes_read` parameter is declared [`c_long`] here.

use std::ffi::{c_char, c_double, c_float, c_int, c_long, c_void};

// ===========================================================================
// Opaque handle type
// ===========================================================================

/// Opaque device handle (`QRNG*`, itself `typedef void QRNG`).
pub type QrngHandle = *mut c_void;

// ===========================================================================
// Status codes (Qrng_status)
// ===========================================================================

pub const QRNG_SUCCESS: c_int = 0;
pub const QRNG_NO_DEVICE_FOUND: c_int = -1;
pub const QRNG_ERROR_NULL_PTR: c_int = -2;
pub const QRNG_ERROR_OPENING_DEVICE: c_int = -5;
pub const QRNG_ERROR_INCOMPLETE_DATA: c_int = -6;
pub const QRNG_ERROR_READING_DEVICE: c_int = -7;
pub const QRNG_ERROR_INTERNAL_MEMORY: c_int = -9;
pub const QRNG_ERROR_INSUFFICIENT_ENTHROPY: c_int = -10;
pub const QRNG_ERROR_MULTIPLE_OF_8_REQUIRED: c_int = -11;
pub const QRNG_ERROR_NET_TIMEOUT: c_int = -13;
pub const QRNG_ERROR_NET_RETRIES_EXCEEDED: c_int = -14;
pub const QRNG_ERROR_INTERNAL_CH_ERROR: c_int = -15;
pub const QRNG_ERROR_WRONG_DATA_FORMAT: c_int = -16;

// Not part of `Qrng_status` in the header, but reported by the library's
// initialization path.
pub const QRNG_ERROR_ALREADY_INITIALIZED: c_int = -3;
pub const QRNG_ERROR_NOT_INITIALIZED: c_int = -4;
pub const QRNG_ERROR_INIT_MEMORY: c_int = -8;

/// `s32` in the vendor header.
pub type QrngSize = c_long;

/// Returns `true` if a retrieval call's return code indicates failure.
///
/// Only negative codes are errors; the fill functions never return positive
/// values in practice but the API contract treats them as success.
#[inline]
pub fn is_error(code: c_int) -> bool {
    code < QRNG_SUCCESS
}

/// Human-readable description for a native status code.
pub fn status_message(code: c_int) -> &'static str {
    match code {
        QRNG_SUCCESS => "no error",
        QRNG_NO_DEVICE_FOUND => "no device found (driver missing or hardware disconnected)",
        QRNG_ERROR_NULL_PTR => "null pointer",
        QRNG_ERROR_ALREADY_INITIALIZED => "QRNG is already initialized",
        QRNG_ERROR_NOT_INITIALIZED => "QRNG is not initialized",
        QRNG_ERROR_OPENING_DEVICE => {
            "unable to open device (driver issue or insufficient privileges)"
        }
        QRNG_ERROR_INCOMPLETE_DATA => "incomplete data was received",
        QRNG_ERROR_READING_DEVICE => "internal error reading device",
        QRNG_ERROR_INIT_MEMORY => "internal initialization error: insufficient memory",
        QRNG_ERROR_INTERNAL_MEMORY => "internal buffer error",
        QRNG_ERROR_INSUFFICIENT_ENTHROPY => "insufficient entropy",
        QRNG_ERROR_MULTIPLE_OF_8_REQUIRED => "size must be a multiple of 8",
        QRNG_ERROR_NET_TIMEOUT => "network timeout",
        QRNG_ERROR_NET_RETRIES_EXCEEDED => "network retries exceeded",
        QRNG_ERROR_INTERNAL_CH_ERROR => "internal channel error",
        QRNG_ERROR_WRONG_DATA_FORMAT => "wrong data format",
        _ => "unknown status",
    }
}

// ===========================================================================
// Board types (Qrng_board_type)
// ===========================================================================

pub type QrngBoardType = c_int;

pub const QRNG_VERTEX_A1: QrngBoardType = 0;
pub const QRNG_VERTEX_B1: QrngBoardType = 1;
pub const QRNG_APEXTREME: QrngBoardType = 2;

// ===========================================================================
// Exported symbol names
// ===========================================================================

pub const SYM_PRODUCT_NAME_TO_ENUM: &str = "qrng_bridge_product_name_to_enum";
pub const SYM_INIT_PARAM: &str = "qrng_bridge_init_param";
pub const SYM_DEINIT: &str = "qrng_deinit";
pub const SYM_GET_STATUS: &str = "qrng_get_status";
pub const SYM_RAND: &str = "qrng_rand";
pub const SYM_URAND: &str = "qrng_urand";
pub const SYM_URAND2: &str = "qrng_urand2";
pub const SYM_GET: &str = "qrng_get";
pub const SYM_GET_RAW_ENT: &str = "qrng_get_raw_ent";
pub const SYM_GET_WITH_EC: &str = "qrng_get_with_ec";

// ===========================================================================
// Function pointer types
// ===========================================================================

// -- Bridge (2) -------------------------------------------------------------

/// `int qrng_bridge_product_name_to_enum(const char* product_name)`
///
/// Returns the board type, or a negative value for an unknown name.
pub type FnProductNameToEnum = unsafe extern "C" fn(product_name: *const c_char) -> c_int;

/// `QRNG* qrng_bridge_init_param(int board_type, const char* dev_name)`
pub type FnInitParam =
    unsafe extern "C" fn(board_type: QrngBoardType, dev_name: *const c_char) -> QrngHandle;

// -- Lifecycle & status (2) -------------------------------------------------

/// `void qrng_deinit(QRNG* qrng)`
pub type FnDeinit = unsafe extern "C" fn(qrng: QrngHandle);

/// `int qrng_get_status(QRNG* qrng)`
pub type FnGetStatus = unsafe extern "C" fn(qrng: QrngHandle) -> c_int;

// -- Scalars (3) ------------------------------------------------------------

/// `int qrng_rand(QRNG* qrng)`: value in `[0, 32767]`.
pub type FnRand = unsafe extern "C" fn(qrng: QrngHandle) -> c_int;

/// `double qrng_urand(QRNG* qrng)`: value in `[0, 1)`.
pub type FnUrand = unsafe extern "C" fn(qrng: QrngHandle) -> c_double;

/// `float qrng_urand2(QRNG* qrng)`: value in `[0, 1)`.
pub type FnUrand2 = unsafe extern "C" fn(qrng: QrngHandle) -> c_float;

// -- Buffered fills (3) -----------------------------------------------------

/// `int qrng_get(QRNG* qrng, u8* data, s32 size, s32* bytes_read)`
pub type FnGet = unsafe extern "C" fn(
    qrng: QrngHandle,
    data: *mut u8,
    size: QrngSize,
    bytes_read: *mut QrngSize,
) -> c_int;

/// `int qrng_get_raw_ent(QRNG* qrng, u16* data, s32 data_size, s32* bytes_read)`
pub type FnGetRawEnt = unsafe extern "C" fn(
    qrng: QrngHandle,
    data: *mut u16,
    data_size: QrngSize,
    bytes_read: *mut QrngSize,
) -> c_int;

/// `int qrng_get_with_ec(QRNG* qrng, u8* data, s32 size, u16* ent_bits,
///                       s32 eb_size, float* cert_val, s32 cv_size)`
pub type FnGetWithEc = unsafe extern "C" fn(
    qrng: QrngHandle,
    data: *mut u8,
    size: QrngSize,
    ent_bits: *mut u16,
    eb_size: QrngSize,
    cert_val: *mut c_float,
    cv_size: QrngSize,
) -> c_int;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_error() {
        assert!(!is_error(QRNG_SUCCESS));
        assert!(!is_error(1));
        assert!(is_error(QRNG_NO_DEVICE_FOUND));
        assert!(is_error(QRNG_ERROR_WRONG_DATA_FORMAT));
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(status_message(QRNG_SUCCESS), "no error");
        assert_eq!(
            status_message(QRNG_ERROR_MULTIPLE_OF_8_REQUIRED),
            "size must be a multiple of 8"
        );
        assert_eq!(status_message(-999), "unknown status");
        assert_eq!(
            status_message(QRNG_ERROR_NOT_INITIALIZED),
            "QRNG is not initialized"
        );
    }

    #[test]
    fn test_size_is_platform_long() {
        #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
        assert_eq!(std::mem::size_of::<QrngSize>(), 8);
        #[cfg(windows)]
        assert_eq!(std::mem::size_of::<QrngSize>(), 4);
    }
}
