#![doc = include_str!("../README.md")]

#[cfg(not(unix))]
compile_error!("keysweep forks worker processes and only supports unix targets.");

mod config;
mod results;
mod telemetry;

use clap::Parser;
use config::{CliArgs, DigestKind, RunConfig};
use keysweep::{Blake3, Keyspace, Md5, Sha256, Termination, WorkerResult, sweep};
use results::ResultsTable;
use std::time::{Duration, Instant};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    for length in config.min_length..=config.max_length {
        let keyspace = Keyspace::new(length, config.alphabet.clone())?;
        tracing::info!(
            "### Length: {} Total number of keys: {}",
            length,
            keyspace.total()
        );

        let mut table = ResultsTable::new();
        for workers in 1..=config.max_workers {
            match timed_sweep(&keyspace, workers, config.digest) {
                Ok(elapsed) => {
                    let millis = elapsed.as_secs_f64() * 1_000.0;
                    tracing::info!(workers, "All workers have completed in {millis:.3} ms");
                    table.insert(workers, millis);
                }
                Err(e) => {
                    tracing::error!(workers, "Sweep failed: {e:#}");
                }
            }
        }

        if let Err(e) = results::write_csv(&table, &config.output_dir, length) {
            tracing::error!("Error: {e:#}");
        }
    }

    Ok(())
}

/// Runs one full sweep and returns the wall-clock time from the first spawn to
/// the last join.
fn timed_sweep(keyspace: &Keyspace, workers: usize, digest: DigestKind) -> anyhow::Result<Duration> {
    let start = Instant::now();
    // SAFETY: the binary never starts a thread, and the subscriber writes
    // from the calling thread.
    let results = unsafe {
        match digest {
            DigestKind::None => sweep(keyspace, workers, &enumerate_only)?,
            DigestKind::Md5 => sweep(keyspace, workers, &Md5)?,
            DigestKind::Sha256 => sweep(keyspace, workers, &Sha256)?,
            DigestKind::Blake3 => sweep(keyspace, workers, &Blake3)?,
        }
    };
    let elapsed = start.elapsed();

    report(&results);
    Ok(elapsed)
}

fn enumerate_only(_: &[u8]) -> [u8; 0] {
    []
}

fn report(results: &[WorkerResult]) {
    for result in results {
        match &result.outcome {
            Ok(Termination::Exited(0)) => {
                tracing::debug!(worker = result.index, "Worker {} exited with status 0", result.pid);
            }
            Ok(termination) => {
                tracing::warn!(worker = result.index, "Worker {} {termination}", result.pid);
            }
            Err(e) => {
                tracing::error!(worker = result.index, "Error waiting for worker {}: {e}", result.pid);
            }
        }
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        tracing::warn!("{failed} of {} workers did not exit cleanly", results.len());
    }
}

fn log_startup_info(config: &RunConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting keysweep with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting keysweep over lengths {}..={} with up to {} workers",
            config.min_length,
            config.max_length,
            config.max_workers
        );
    }
}
