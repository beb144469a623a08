//! Speedtest command implementation.
//!
//! Repeatedly fills a large buffer and reports the throughput of each read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use console::style;

use qrng_device::{DeviceStatus, QrngSession};

use super::common::{DeviceOptions, status_label};

/// Largest buffer a single read can request (counts are capped at `i32::MAX`).
pub const MAX_BUFFER_MB: usize = (i32::MAX as usize) >> 20;

/// One measured read.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub rep: u64,
    pub status: i32,
    pub gbps: f64,
}

/// Gigabits per second for `bytes` read in `elapsed`.
pub fn gbps(bytes: usize, elapsed: Duration) -> f64 {
    let nanos = elapsed.as_nanos().max(1) as f64;
    bytes as f64 * 8.0 / nanos
}

/// Execute the speedtest command.
///
/// Measurements are only collected for a finite run; with `reps == 0` each
/// read is printed and dropped.
pub fn execute(
    options: &DeviceOptions,
    reps: u64,
    buffer_mb: usize,
    interval: f64,
    threads: usize,
) -> Result<Vec<Measurement>> {
    if buffer_mb == 0 || buffer_mb > MAX_BUFFER_MB {
        bail!("--buffer-mb must be between 1 and {MAX_BUFFER_MB}");
    }
    if !interval.is_finite() || interval < 0.0 {
        bail!("--interval must be a non-negative number of seconds");
    }
    let buffer_bytes = buffer_mb << 20;
    let interval = Duration::from_secs_f64(interval);

    print_status_table();

    let session = options.open_session()?;
    let init = session.status()?;
    println!(
        "{} {} init status: {}",
        style("→").cyan().bold(),
        style(session.product()).green(),
        status_label(init)
    );
    if init != 0 {
        bail!("device initialization failed: {}", DeviceStatus::from_code(init));
    }

    println!(
        "\n Running speed test, reps: {reps}{}, buffer: {buffer_mb} MiB, threads: {threads}",
        if reps == 0 { " (infinite loop)" } else { "" }
    );

    let session = Arc::new(session);
    let workers: Vec<_> = (0..threads.max(1))
        .map(|t| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || run_worker(&session, t, reps, buffer_bytes, interval))
        })
        .collect();

    let mut measurements = Vec::new();
    for worker in workers {
        match worker.join() {
            Ok(m) => measurements.extend(m),
            Err(_) => bail!("speedtest worker panicked"),
        }
    }
    Ok(measurements)
}

fn run_worker(
    session: &QrngSession,
    thread: usize,
    reps: u64,
    buffer_bytes: usize,
    interval: Duration,
) -> Vec<Measurement> {
    let mut measurements = Vec::new();
    let mut rep = 0;
    while reps == 0 || rep < reps {
        let start = Instant::now();
        let result = session.get(buffer_bytes);
        let elapsed = start.elapsed();

        let status = match &result {
            Ok(_) => 0,
            Err(e) => e.device_code().unwrap_or(-1),
        };
        if let Err(e) = &result {
            tracing::warn!("thread {thread} rep {rep}: {e}");
        }

        let m = Measurement {
            rep,
            status,
            gbps: gbps(buffer_bytes, elapsed),
        };
        println!("[{:>6}]\tThread{thread}, st: {}, {:.3}gbps", m.rep, m.status, m.gbps);
        if reps > 0 {
            measurements.push(m);
        }

        rep += 1;
        if reps == 0 || rep < reps {
            std::thread::sleep(interval);
        }
    }
    measurements
}

/// Print the status codes a read may report.
fn print_status_table() {
    println!("\nStatus description:");
    for status in DeviceStatus::DOCUMENTED.iter().rev() {
        println!("{:>4} {}", status.code(), status.message());
    }
}
