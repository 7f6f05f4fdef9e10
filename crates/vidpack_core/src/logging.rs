//! Tracing setup.
//!
//! The pipeline logs through the `tracing` ecosystem; the embedding
//! application decides where that output goes. This module only offers the
//! default subscriber used by standalone tooling.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize a global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to the supplied filter (e.g. `"info"`).
/// Call once at startup.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
