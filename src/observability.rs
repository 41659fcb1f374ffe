//! Tracing subscriber setup.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber described by `config`. Call once, from the binary.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{}': {}; using defaults", config.filter, e);
        EnvFilter::new(crate::config::DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
