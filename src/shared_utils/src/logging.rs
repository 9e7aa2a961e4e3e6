//! Process-wide `tracing` subscriber setup.
//!
//! Library crates in this workspace only emit events through the `tracing`
//! macros; binaries and tests call [`init_tracing`] once to get console output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"gm_ingestor=debug"`).
///
/// Returns `false` when a global subscriber was already installed, which makes
/// the call safe to repeat from several tests.
pub fn init_tracing(default_directive: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
