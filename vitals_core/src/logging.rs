//! Logging infrastructure for Vitals.
//!
//! Report output goes to stdout, so all tracing output is sent to stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at WARN; RUST_LOG overrides it
pub fn init() {
    init_with_level(level_for_verbosity(0))
}

/// Map a repeated `-v` count to a default filter level
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize logging with a specific default level
///
/// RUST_LOG still wins when set. Safe to call more than once; only the
/// first subscriber is installed.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
