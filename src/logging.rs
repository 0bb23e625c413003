//! Logging setup.
//!
//! Everything goes to stderr: stdout carries the MCP wire protocol, so a
//! single stray log line there would corrupt the transport.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. Log level comes from `RUST_LOG`,
/// defaulting to `info`.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();

    tracing::info!("logging initialized");
}

/// Log session end.
pub fn log_session_end() {
    tracing::info!("session ended");
}
