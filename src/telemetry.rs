//! Tracing subscriber setup shared by the server and the admin CLI.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. `format` is `json` for
/// one JSON object per line, anything else for human-readable text.
///
/// # Errors
///
/// Returns an error if the filter is malformed or a subscriber is already set.
pub fn init(default_level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if format == "json" {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to init subscriber: {}", e))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to init subscriber: {}", e))
    }
}
