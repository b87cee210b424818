//! Tracing setup shared by planner binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "planner=info,planner_server=info";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to info for the planner crates.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=planner=debug cargo run -p planner-server
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
