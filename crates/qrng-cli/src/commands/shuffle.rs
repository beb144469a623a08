//! Shuffle command implementation.

use anyhow::Result;

use super::common::DeviceOptions;

/// Execute the shuffle command.
pub fn execute(options: &DeviceOptions, mut items: Vec<String>) -> Result<()> {
    let session = options.open_session()?;
    session.shuffle(&mut items)?;
    println!("{}", items.join(" "));
    Ok(())
}
