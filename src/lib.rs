pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod league;
pub mod lineup;
pub mod matchup;
pub mod model;
pub mod output;
pub mod period;
pub mod processor;
pub mod provider;
pub mod sample;
pub mod start;
pub mod store;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for the binaries. `RUST_LOG` wins over the
/// default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cat5=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
