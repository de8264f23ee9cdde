//! Tracing subscriber setup
//!
//! JSON output filtered by `LOG_LEVEL`, then `RUST_LOG`, then the given
//! default. Library crates only emit events; hosts call `init` once.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter from `LOG_LEVEL` / `RUST_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _first = init("debug");
        assert!(!init("debug"), "a subscriber is already installed");
        tracing::info!(component = "telemetry", "subscriber installed");
    }
}
