use crate::error::StaticApiResult;
pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log level used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

pub fn init_tracing() -> StaticApiResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .map_err(|e| crate::err!("Invalid log filter: {}", e))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| crate::err!("Failed to install tracing subscriber: {}", e))?;
    Ok(())
}
