//! Miscellaneous helper utilities.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Parse a decimal-places count, rejecting values no token uses.
pub fn parse_decimals(raw: &str) -> anyhow::Result<u8> {
    let decimals: u8 = raw
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid decimals {raw:?}: {e}"))?;
    anyhow::ensure!(decimals <= 38, "decimals {decimals} exceed 38");
    Ok(decimals)
}
