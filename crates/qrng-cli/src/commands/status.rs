//! Status command implementation.
//!
//! Print the native status table and, unless asked not to, the status of a
//! freshly opened session.

use anyhow::Result;
use console::style;

use qrng_device::DeviceStatus;

use super::common::{DeviceOptions, status_label};

/// Execute the status command.
pub fn execute(options: &DeviceOptions, table_only: bool) -> Result<()> {
    println!(
        "  {:>5}  {:<36}  {}",
        style("CODE").bold(),
        style("NAME").bold(),
        style("MEANING").bold()
    );
    println!("  {}", "-".repeat(96));
    for status in DeviceStatus::DOCUMENTED {
        println!(
            "  {:>5}  {:<36}  {}",
            status.code(),
            status.symbol().unwrap_or("-"),
            status.message()
        );
    }

    if table_only {
        return Ok(());
    }

    let session = options.open_session()?;
    println!(
        "\n{} {} on {}: {}",
        style("→").cyan().bold(),
        style(session.product()).green(),
        style(session.device()).yellow(),
        status_label(session.status()?)
    );
    Ok(())
}
