pub mod config;
pub mod gateway;
pub mod legacy;

use tracing_subscriber::EnvFilter;

/// Initialize a simple stdout tracing subscriber
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,trellis_http=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
