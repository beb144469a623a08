// SPDX-License-Identifier: Apache-2.0
//! Build script: compile the mock QRNG vendor library for integration tests.

use std::env;
use std::path::PathBuf;
use std::process::Command;

fn main() {
    let mock_src = "mock_device/mock_qrng_vertex.c";
    println!("cargo:rerun-if-changed={mock_src}");

    if !std::path::Path::new(mock_src).exists() {
        return;
    }

    let lib_name = match env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("linux") => "libmock_qrng_vertex.so",
        Ok("macos") => "libmock_qrng_vertex.dylib",
        // No `cc -shared` toolchain to rely on elsewhere.
        _ => return,
    };
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let so_path = out_dir.join(lib_name);

    let status = match Command::new("cc")
        .args([
            "-shared",
            "-fPIC",
            "-o",
            so_path.to_str().unwrap(),
            mock_src,
            "-Wall",
            "-Wextra",
            "-O2",
        ])
        .status()
    {
        Ok(status) => status,
        Err(e) => {
            println!("cargo:warning=no C compiler, native library tests will be skipped: {e}");
            return;
        }
    };

    assert!(
        status.success(),
        "failed to compile mock QRNG library: {status}"
    );

    // Tell cargo where to find the compiled mock library.
    println!(
        "cargo:rustc-env=MOCK_QRNG_LIBRARY_PATH={}",
        so_path.display()
    );
}
