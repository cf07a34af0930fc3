//! Tracing setup for the CLI.
//!
//! The library only emits events; installing a subscriber is up to the binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Reads `RUST_LOG`, defaults to `warn`. Writes compact lines to stderr so
/// stdout stays valid JSON.
///
/// # Example
/// ```bash
/// RUST_LOG=contentpatch_core=debug contentpatch-cli resolve --pack packs/example --tokens tokens.json
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
