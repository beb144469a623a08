//! Certified command implementation.
//!
//! Fetch hashed data together with its entropy and certification values, then
//! the same amount of raw entropy.

use anyhow::{Result, bail};
use console::style;

use super::common::{DeviceOptions, format_grid, hex_u8, hex_u16, status_label};

/// Execute the certified command.
pub fn execute(options: &DeviceOptions, bytes: usize) -> Result<()> {
    if bytes == 0 || bytes % 8 != 0 {
        bail!("--bytes must be a positive multiple of 8 (got {bytes})");
    }

    let session = options.open_session()?;
    println!(
        "{} {} init status: {}",
        style("→").cyan().bold(),
        style(session.product()).green(),
        status_label(session.status()?)
    );

    let sample = session.get_with_certification(bytes)?;
    println!("\n- hashed data ({} bytes):", sample.data.len());
    println!("{}", format_grid(&sample.data, 32, 1, hex_u8));
    println!("\n- certification values:");
    println!("{}", format_grid(&sample.certification, 32, 1, |v| format!("{v:4.2}")));
    println!("\n- entropy bits:");
    println!("{}", format_grid(&sample.entropy_bits, 32, 1, hex_u16));

    let raw = session.get_raw_entropy(bytes)?;
    println!(
        "\n- raw entropy ({} samples), status {}:",
        raw.len(),
        status_label(session.status()?)
    );
    println!("{}", format_grid(&raw, 32, 1, hex_u16));

    Ok(())
}
