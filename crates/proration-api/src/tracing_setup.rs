//! Structured logging setup
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a JSON or
//! human-readable `fmt` layer. Output goes to stderr so the `prorate` command
//! can keep stdout for its result.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Directives used when neither `RUST_LOG` nor `logging.filter` is set
pub const DEFAULT_FILTER: &str =
    "proration_api=debug,proration_engine=debug,tower_http=debug,info";

/// Resolve the filter: `RUST_LOG` first, then the configured directives.
pub fn build_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    let directives = select_directives(std::env::var(EnvFilter::DEFAULT_ENV).ok(), config);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{directives}'"))
}

fn select_directives(from_env: Option<String>, config: &LoggingConfig) -> String {
    from_env
        .filter(|directives| !directives.trim().is_empty())
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initialize the global subscriber
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config)?);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
