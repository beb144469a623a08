//! Version command implementation.

use console::style;

use qrng_device::{Product, QrngLibrary};

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - Quantum Dice QRNG command-line tool",
        style("qrng").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qrng-device  Session layer over the vendor QRNG library");
    println!("  qrng-cli     Command-line interface");
    println!();
    let products: Vec<&str> = Product::ALL.iter().map(|p| p.name()).collect();
    println!("Products:   {}", products.join(", "));
    println!(
        "Library:    {}",
        style(QrngLibrary::default_path().display()).dim()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
