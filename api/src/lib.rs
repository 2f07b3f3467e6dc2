mod client;
mod config;
mod error;

pub use client::ApiClient;
pub use config::{CONFIG_FILE, Config, ENV_PREFIX};
pub use error::ApiError;
pub use reqwest::StatusCode;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Honors `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
