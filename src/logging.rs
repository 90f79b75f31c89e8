use std::io::stderr;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let layer = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(stderr)
            .with_filter(filter)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .with_writer(stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
        other => bail!("Unknown log format '{other}'"),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}
