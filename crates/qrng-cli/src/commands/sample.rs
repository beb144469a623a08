//! Sample command implementation.
//!
//! One of each basic request: an integer, a byte stream and a uniform double.

use anyhow::Result;
use console::style;

use super::common::{DeviceOptions, format_grid, hex_u8, status_label};

/// Execute the sample command.
pub fn execute(options: &DeviceOptions, bytes: usize) -> Result<()> {
    let session = options.open_session()?;
    println!(
        "{} {} on {}: {}",
        style("→").cyan().bold(),
        style(session.product()).green(),
        style(session.device()).yellow(),
        status_label(session.status()?)
    );

    let value = session.rand()?;
    println!("  rand:  {value:>8}  status {}", status_label(session.status()?));

    let data = session.get(bytes)?;
    println!(
        "  get:   {:>8} bytes  status {}",
        data.len(),
        status_label(session.status()?)
    );
    println!("{}", format_grid(&data, 16, 10, hex_u8));

    let value = session.urand()?;
    println!(
        "  urand: {value:>8.6}  status {}",
        status_label(session.status()?)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_on_mock() {
        let options = DeviceOptions {
            mock: true,
            device: Some("/dev/xdma0".into()),
            ..DeviceOptions::default()
        };
        execute(&options, 64).unwrap();
    }
}
