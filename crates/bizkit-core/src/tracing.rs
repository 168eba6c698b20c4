//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.log_level`. Returns `false` when a subscriber
/// was already installed, so calling this more than once is harmless.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
