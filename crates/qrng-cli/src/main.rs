//! QRNG Command-Line Interface
//!
//! The main entry point for the `qrng` tool: sample, certify, dump and
//! benchmark a Quantum Dice random number generator.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::DeviceOptions;
use commands::dump::DumpKind;
use commands::{certified, dump, sample, shuffle, speedtest, status, version};

/// qrng - talk to a Quantum Dice QRNG
#[derive(Parser)]
#[command(name = "qrng")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "QRNG_CONFIG")]
    config: Option<PathBuf>,

    /// Product name (VERTEX_A1, VERTEX_B1, APEXTREME) [env: QRNG_PRODUCT]
    #[arg(short, long, global = true)]
    product: Option<String>,

    /// Device path or index [env: QRNG_DEVICE]
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Path to the vendor library [env: QRNG_LIBRARY_PATH]
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Use the in-process mock device instead of hardware
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read an integer, a byte stream and a uniform double
    Sample {
        /// Number of bytes to read
        #[arg(short, long, default_value = "160")]
        bytes: usize,
    },

    /// Read hashed data with entropy and certification values
    Certified {
        /// Number of bytes to read (multiple of 8)
        #[arg(short, long, default_value = "32")]
        bytes: usize,
    },

    /// Write random data to a series of files
    Dump {
        /// Output file prefix
        prefix: String,

        /// Bytes (raw kinds) or values (udist kinds) per file
        size: u64,

        /// Number of files (at most 100)
        count: u32,

        /// Data kind
        #[arg(value_enum)]
        kind: DumpKind,
    },

    /// Measure read throughput
    Speedtest {
        /// Number of reads per thread (0 runs until interrupted)
        #[arg(short, long, default_value = "0")]
        reps: u64,

        /// Buffer size in MiB
        #[arg(long, default_value = "80")]
        buffer_mb: usize,

        /// Pause between reads in seconds
        #[arg(long, default_value = "2")]
        interval: f64,

        /// Threads sharing the session
        #[arg(short, long, default_value = "1")]
        threads: usize,
    },

    /// Shuffle the given items with device randomness
    Shuffle {
        /// Items to shuffle
        items: Vec<String>,
    },

    /// Show the status code table and the current device status
    Status {
        /// Only print the table, do not open the device
        #[arg(long)]
        table_only: bool,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            config: self.config.clone(),
            product: self.product.clone(),
            device: self.device.clone(),
            library: self.library.clone(),
            mock: self.mock,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = cli.device_options();

    // Execute command
    let result = match cli.command {
        Commands::Sample { bytes } => sample::execute(&options, bytes),

        Commands::Certified { bytes } => certified::execute(&options, bytes),

        Commands::Dump {
            prefix,
            size,
            count,
            kind,
        } => dump::execute(&options, &prefix, size, count, kind).map(|_| ()),

        Commands::Speedtest {
            reps,
            buffer_mb,
            interval,
            threads,
        } => speedtest::execute(&options, reps, buffer_mb, interval, threads).map(|_| ()),

        Commands::Shuffle { items } => shuffle::execute(&options, items),

        Commands::Status { table_only } => status::execute(&options, table_only),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_defaults() {
        let cli = Cli::try_parse_from(["qrng", "sample"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.mock);
        assert!(matches!(cli.command, Commands::Sample { bytes: 160 }));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "qrng",
            "certified",
            "--bytes",
            "64",
            "-vv",
            "--product",
            "APEXTREME",
            "--device",
            "/dev/xdma1",
            "--mock",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let options = cli.device_options();
        assert_eq!(options.product.as_deref(), Some("APEXTREME"));
        assert_eq!(options.device.as_deref(), Some("/dev/xdma1"));
        assert!(options.mock);
        assert!(matches!(cli.command, Commands::Certified { bytes: 64 }));
    }

    #[test]
    fn test_parse_dump() {
        let cli =
            Cli::try_parse_from(["qrng", "dump", "test_data", "1024", "5", "qrng_raw"]).unwrap();
        match cli.command {
            Commands::Dump {
                prefix,
                size,
                count,
                kind,
            } => {
                assert_eq!(prefix, "test_data");
                assert_eq!(size, 1024);
                assert_eq!(count, 5);
                assert_eq!(kind, DumpKind::QrngRaw);
            }
            _ => panic!("expected Dump"),
        }
    }

    #[test]
    fn test_parse_dump_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["qrng", "dump", "x", "10", "1", "prng"]).is_err());
    }

    #[test]
    fn test_parse_speedtest_defaults() {
        let cli = Cli::try_parse_from(["qrng", "speedtest"]).unwrap();
        match cli.command {
            Commands::Speedtest {
                reps,
                buffer_mb,
                interval,
                threads,
            } => {
                assert_eq!(reps, 0);
                assert_eq!(buffer_mb, 80);
                assert_eq!(interval, 2.0);
                assert_eq!(threads, 1);
            }
            _ => panic!("expected Speedtest"),
        }
    }

    #[test]
    fn test_parse_shuffle_items() {
        let cli = Cli::try_parse_from(["qrng", "shuffle", "a", "b", "c"]).unwrap();
        assert!(matches!(cli.command, Commands::Shuffle { ref items } if items.len() == 3));
    }

    #[test]
    fn test_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["qrng"]).is_err());
    }
}
