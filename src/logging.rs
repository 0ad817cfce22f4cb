// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The scheduler itself only emits `tracing` events; installing a subscriber
//! is opt-in for the embedding application. Level priority:
//! 1. `JOBQ_LOG` environment variable (e.g. "info", "debug", or any
//!    `EnvFilter` directive)
//! 2. default to `info`

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise a global fmt subscriber.
///
/// Safe to call once at startup; calling it a second time panics, as the
/// global subscriber can only be set once per process.
pub fn init_logging() -> Result<()> {
    let filter = match std::env::var("JOBQ_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new("info"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
