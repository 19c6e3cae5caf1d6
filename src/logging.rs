//! Logging setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{Error, Result};

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
/// Output goes to stderr so stdout stays clean for JSON.
pub fn init_logging(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{level},reply_guard={level}")))
        .map_err(|e| Error::Logging(e.to_string()))?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::debug!("Logging initialized with level: {}", level);
    Ok(())
}
