//! Dump command implementation.
//!
//! Write random data to a series of files, either from the QRNG or from a
//! software PRNG for comparison.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use qrng_device::QrngSession;

use super::common::{DeviceOptions, status_label};

/// Raw reads are fetched in chunks of this many bytes.
pub const CHUNK_BYTES: usize = 8 << 20;

pub const MAX_FILES: u32 = 100;

/// What to write into the files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpKind {
    /// Hashed QRNG bytes
    #[value(name = "qrng_raw")]
    QrngRaw,
    /// QRNG doubles in [0, 1), one per line
    #[value(name = "qrng_udist")]
    QrngUdist,
    /// PRNG bytes
    #[value(name = "prng_raw")]
    PrngRaw,
    /// PRNG doubles in [0, 1), one per line
    #[value(name = "prng_udist")]
    PrngUdist,
}

impl DumpKind {
    pub fn name(self) -> &'static str {
        match self {
            DumpKind::QrngRaw => "qrng_raw",
            DumpKind::QrngUdist => "qrng_udist",
            DumpKind::PrngRaw => "prng_raw",
            DumpKind::PrngUdist => "prng_udist",
        }
    }

    fn uses_device(self) -> bool {
        matches!(self, DumpKind::QrngRaw | DumpKind::QrngUdist)
    }

    /// Raw kinds count bytes, udist kinds count values.
    fn is_raw(self) -> bool {
        matches!(self, DumpKind::QrngRaw | DumpKind::PrngRaw)
    }
}

/// Where the numbers come from.
enum Source {
    Device(QrngSession),
    Prng(StdRng),
}

impl Source {
    fn bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        match self {
            Source::Device(session) => Ok(session.get(count)?),
            Source::Prng(rng) => {
                let mut buf = vec![0u8; count];
                rng.fill(buf.as_mut_slice());
                Ok(buf)
            }
        }
    }

    fn unit(&mut self) -> Result<f64> {
        match self {
            Source::Device(session) => Ok(session.urand()?),
            Source::Prng(rng) => Ok(rng.r#gen::<f64>()),
        }
    }

    /// Report a non-zero device status after a fetch.
    fn check(&self) -> Result<()> {
        if let Source::Device(session) = self {
            let code = session.status()?;
            if code != 0 {
                tracing::warn!("device status after read: {code}");
            }
        }
        Ok(())
    }
}

pub fn file_path(prefix: &str, kind: DumpKind, index: u32) -> PathBuf {
    PathBuf::from(format!("{prefix}_{}_{index}", kind.name()))
}

/// Execute the dump command.
pub fn execute(
    options: &DeviceOptions,
    prefix: &str,
    size: u64,
    count: u32,
    kind: DumpKind,
) -> Result<Vec<PathBuf>> {
    let count = if count > MAX_FILES {
        tracing::warn!("file count {count} capped at {MAX_FILES}");
        MAX_FILES
    } else {
        count
    };

    let mut source = if kind.uses_device() {
        let session = options.open_session()?;
        println!(
            "{} {} init status: {}",
            style("→").cyan().bold(),
            style(session.product()).green(),
            status_label(session.status()?)
        );
        Source::Device(session)
    } else {
        Source::Prng(StdRng::from_entropy())
    };

    println!(
        "{} Writing {} data to {} file(s) with prefix {}, size {} {}",
        style("→").cyan().bold(),
        style(kind.name()).yellow(),
        count,
        style(prefix).green(),
        size,
        if kind.is_raw() { "bytes" } else { "values" }
    );

    let mut written = Vec::with_capacity(count as usize);
    for index in 1..=count {
        let path = file_path(prefix, kind, index);

        let progress = ProgressBar::new(size);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {percent:>3}% {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_prefix(format!("{index}/{count}"));

        write_file(&path, &mut source, kind, size, &progress)?;
        progress.finish();

        println!("  {} {}", style("✓").green(), path.display());
        written.push(path);
    }

    Ok(written)
}

fn write_file(
    path: &Path,
    source: &mut Source,
    kind: DumpKind,
    size: u64,
    progress: &ProgressBar,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let mut done: u64 = 0;
    while done < size {
        if kind.is_raw() {
            let chunk = usize::try_from(size - done).map_or(CHUNK_BYTES, |n| n.min(CHUNK_BYTES));
            let data = source.bytes(chunk)?;
            source.check()?;
            out.write_all(&data)?;
            done += data.len() as u64;
            progress.inc(data.len() as u64);
        } else {
            let value = source.unit()?;
            source.check()?;
            writeln!(out, "{value:.12}")?;
            done += 1;
            progress.inc(1);
        }
    }

    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
