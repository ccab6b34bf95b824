//! Logging initialization for the SDK.
//!
//! Library crates only emit `tracing` events; the embedding application
//! decides whether to install a subscriber. `init_logging` is a convenience
//! for hosts that do not bring their own.

use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// Installs a `tracing-subscriber` fmt subscriber with a level filter read
/// from the `ORBIT_LOG` env var, falling back to the provided default.
/// Calling this more than once is a no-op.
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("SDK initialized");
/// ```
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("ORBIT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
