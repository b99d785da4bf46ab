pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod explore;
pub mod plots;
pub mod power;
pub mod source;
pub mod tabular;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the fmt subscriber used by every binary. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
