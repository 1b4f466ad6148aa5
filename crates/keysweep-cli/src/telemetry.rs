//! # Logging
//!
//! Logs are emitted through `tracing` and rendered by a
//! `tracing_subscriber::fmt` layer. Verbosity is controlled with `RUST_LOG`
//! and defaults to `info`.
//!
//! Worker processes inherit the subscriber across `fork`, so their start and
//! finish events are printed by the same layer as the parent's, tagged with
//! the worker index and pid.
//!
//! ```bash
//! RUST_LOG=keysweep=debug,info cargo run --release
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;
    Ok(())
}
