//! Tracing setup for the `cre` binary.
//!
//! Logs go to stderr so tables and exports on stdout stay clean. The level is
//! taken from `RUST_LOG` (e.g. `RUST_LOG=cre_recovery=debug`), defaulting to `warn`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
