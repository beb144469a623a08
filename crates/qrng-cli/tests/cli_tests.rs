//! End-to-end tests of the `qrng` binary against the mock device.

use std::process::{Command, Output};

fn qrng(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qrng"))
        .args(args)
        .env_remove("QRNG_CONFIG")
        .env_remove("QRNG_PRODUCT")
        .env_remove("QRNG_DEVICE")
        .env_remove("QRNG_LIBRARY_PATH")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run qrng")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================================
// Commands on the mock device
// ============================================================================

#[test]
fn test_sample() {
    let output = qrng(&["--mock", "sample", "--bytes", "32"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("VERTEX_A1"));
    assert!(out.contains("rand:"));
    assert!(out.contains("urand:"));
}

#[test]
fn test_certified() {
    let output = qrng(&["--mock", "--product", "APEXTREME", "certified", "--bytes", "16"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("hashed data (16 bytes)"));
    assert!(out.contains("raw entropy (16 samples)"));
}

#[test]
fn test_shuffle_is_permutation() {
    let output = qrng(&["--mock", "shuffle", "a", "b", "c", "d", "e"]);
    assert!(output.status.success());
    let mut items: Vec<String> = stdout(&output)
        .split_whitespace()
        .map(String::from)
        .collect();
    items.sort();
    assert_eq!(items, ["a", "b", "c", "d", "e"]);
}

#[test]
fn test_dump_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("d");
    let output = qrng(&[
        "--mock",
        "dump",
        prefix.to_str().unwrap(),
        "64",
        "3",
        "qrng_raw",
    ]);
    assert!(output.status.success());
    for i in 1..=3 {
        let path = dir.path().join(format!("d_qrng_raw_{i}"));
        assert_eq!(std::fs::metadata(path).unwrap().len(), 64);
    }
}

#[test]
fn test_status_table_only() {
    let output = qrng(&["status", "--table-only"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("QRNG_SUCCESS"));
    assert!(out.contains("QRNG_ERROR_WRONG_DATA_FORMAT"));
}

#[test]
fn test_version() {
    let output = qrng(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Error paths
// ============================================================================

#[test]
fn test_unknown_product_exits_with_error() {
    let output = qrng(&["--mock", "--product", "non-existent-product", "sample"]);
    assert_eq!(output.status.code(), Some(1));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("Error:"));
    assert!(err.contains("does not exist"));
}

#[test]
fn test_missing_library_exits_with_error() {
    let output = qrng(&["--library", "/nonexistent/libqrng_vertex.so", "sample"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load QRNG library"));
}

#[test]
fn test_missing_config_file_exits_with_error() {
    let output = qrng(&["--mock", "--config", "/nonexistent/qrng.yaml", "sample"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_config_file_selects_product() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("qrng.yaml");
    std::fs::write(&config, "product: VERTEX_B1\ndevice: /dev/xdma4\n").unwrap();

    let output = qrng(&["--mock", "--config", config.to_str().unwrap(), "sample"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("VERTEX_B1"));
    assert!(out.contains("/dev/xdma4"));
}
