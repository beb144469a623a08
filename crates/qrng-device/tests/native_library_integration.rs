// SPDX-License-Identifier: Apache-2.0
//! Integration tests through the real loader, against the compiled mock
//! vendor library.
//!
//! The build.rs compiles `mock_device/mock_qrng_vertex.c` into
//! `libmock_qrng_vertex.so` and exports its path via the
//! `MOCK_QRNG_LIBRARY_PATH` env var. Without a C compiler the variable is
//! unset and these tests return early.

use std::path::Path;
use std::sync::Arc;

use qrng_device::ffi::QrngSize;
use qrng_device::{DeviceApi, DeviceStatus, QrngError, QrngLibrary, QrngSession, ffi};

/// Path to the compiled mock library (set by build.rs).
fn mock_library_path() -> Option<&'static str> {
    let path = option_env!("MOCK_QRNG_LIBRARY_PATH");
    if path.is_none() {
        eprintln!("mock QRNG library was not built; skipping");
    }
    path
}

fn load_mock() -> Option<Arc<QrngLibrary>> {
    let path = mock_library_path()?;
    Some(Arc::new(
        QrngLibrary::load(Path::new(path)).expect("failed to load mock QRNG library"),
    ))
}

fn open(library: &Arc<QrngLibrary>, device: &str) -> QrngSession {
    QrngSession::open_with(library.clone(), "VERTEX_A1", device)
        .expect("failed to open session on mock library")
}

// ---------------------------------------------------------------------------
// Loading & symbol resolution
// ---------------------------------------------------------------------------

#[test]
fn test_load_mock_library() {
    let Some(library) = load_mock() else { return };
    assert!(library.has_native_urand_f32());
    assert_eq!(library.library_path(), mock_library_path().unwrap());
    assert!(format!("{library:?}").contains("native_urand_f32: true"));
}

#[test]
fn test_product_codes() {
    let Some(library) = load_mock() else { return };
    assert_eq!(library.product_code(c"VERTEX_A1"), ffi::QRNG_VERTEX_A1);
    assert_eq!(library.product_code(c"VERTEX_B1"), ffi::QRNG_VERTEX_B1);
    assert_eq!(library.product_code(c"APEXTREME"), ffi::QRNG_APEXTREME);
    assert!(library.product_code(c"non-existent-product") < 0);
}

// ---------------------------------------------------------------------------
// Argument widths
// ---------------------------------------------------------------------------

/// `bytes_read` followed directly by a marker the library must not touch.
#[repr(C)]
struct Guarded {
    filled: QrngSize,
    marker: u64,
}

#[test]
fn test_filled_count_stays_in_bounds() {
    let Some(library) = load_mock() else { return };
    let handle = library.open(ffi::QRNG_VERTEX_A1, c"/dev/xdma0");
    assert!(!handle.is_null());

    let mut data = [0u8; 15];
    let mut guarded = Guarded {
        filled: -1,
        marker: 0x7777,
    };
    let code = unsafe { library.fill_bytes(handle, &mut data, &mut guarded.filled) };
    assert_eq!(code, ffi::QRNG_SUCCESS);
    assert_eq!(guarded.filled, 15);
    assert_eq!(guarded.marker, 0x7777);

    let mut samples = [0u16; 3];
    let mut guarded = Guarded {
        filled: -1,
        marker: 0x7777,
    };
    let code = unsafe { library.fill_raw_entropy(handle, &mut samples, &mut guarded.filled) };
    assert_eq!(code, ffi::QRNG_SUCCESS);
    assert_eq!(guarded.filled, 3);
    assert_eq!(guarded.marker, 0x7777);

    unsafe { library.close(handle) };
}

// ---------------------------------------------------------------------------
// Sessions on the native library
// ---------------------------------------------------------------------------

#[test]
fn test_get_15() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/xdma0");
    assert_eq!(session.device_status().unwrap(), DeviceStatus::Success);

    let data = session.get(15).unwrap();
    assert_eq!(data.len(), 15);
    assert!(data.iter().any(|&b| b != 0));
}

#[test]
fn test_get_raw_entropy_1() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/xdma0");
    let samples = session.get_raw_entropy(1).unwrap();
    assert_eq!(samples.len(), 1);
    assert!(samples[0] <= 0x0FFF);
}

#[test]
fn test_get_with_certification_32() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/xdma0");

    // The library rejects the call unless both metadata sizes arrive as 4.
    let sample = session.get_with_certification(32).unwrap();
    assert_eq!(sample.data.len(), 32);
    assert_eq!(sample.block_count(), 4);
    for (_, bits, cert) in sample.blocks() {
        assert!((48..=64).contains(&bits));
        assert!((0.9..=1.0).contains(&cert));
    }
    assert_eq!(session.status().unwrap(), ffi::QRNG_SUCCESS);
}

#[test]
fn test_scalars() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/xdma0");
    for _ in 0..64 {
        assert!((0..=32767).contains(&session.rand().unwrap()));
        assert!((0.0..1.0).contains(&session.urand().unwrap()));
        assert!((0.0..1.0).contains(&session.urand_f32().unwrap()));
    }
}

#[test]
fn test_shuffle() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/xdma0");
    let mut deck: Vec<u32> = (0..52).collect();
    session.shuffle(&mut deck).unwrap();
    deck.sort_unstable();
    assert_eq!(deck, (0..52).collect::<Vec<_>>());
}

#[test]
fn test_short_read_leaves_zero_tail() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/mock-short");

    let data = session.get(64).unwrap();
    assert_eq!(data.len(), 64);
    assert!(data[32..].iter().all(|&b| b == 0));

    let samples = session.get_raw_entropy(10).unwrap();
    assert_eq!(samples.len(), 10);
    assert!(samples[5..].iter().all(|&s| s == 0));
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn test_read_error_is_reported() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/mock-read-error");

    let err = session.get(15).unwrap_err();
    assert!(matches!(
        err,
        QrngError::DeviceError {
            code: ffi::QRNG_ERROR_READING_DEVICE,
            ..
        }
    ));
    assert_eq!(
        session.device_status().unwrap(),
        DeviceStatus::ReadingDevice
    );

    let err = session.get_with_certification(16).unwrap_err();
    assert_eq!(err.device_code(), Some(ffi::QRNG_ERROR_READING_DEVICE));
    let err = session.get_raw_entropy(4).unwrap_err();
    assert_eq!(err.device_code(), Some(ffi::QRNG_ERROR_READING_DEVICE));
}

#[test]
fn test_empty_device_path_reports_no_device() {
    let Some(library) = load_mock() else { return };
    let session = QrngSession::open_with(library, "VERTEX_B1", "").unwrap();
    assert_eq!(session.status().unwrap(), ffi::QRNG_NO_DEVICE_FOUND);
}

#[test]
fn test_unknown_product() {
    let Some(library) = load_mock() else { return };
    let err = QrngSession::open_with(library, "non-existent-product", "/dev/xdma0").unwrap_err();
    assert!(matches!(err, QrngError::UnknownProduct(_)));
}

#[test]
fn test_closed_session() {
    let Some(library) = load_mock() else { return };
    let session = open(&library, "/dev/xdma0");
    session.close();
    session.close();
    assert!(matches!(session.get(8), Err(QrngError::SessionClosed)));
}
