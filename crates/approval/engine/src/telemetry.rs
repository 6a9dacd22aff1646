//! Tracing subscriber setup for processes embedding the gate

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::error::{GateError, GateResult};

/// Install the global subscriber. `RUST_LOG` wins over `config.level`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> GateResult<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    result.map_err(|e| GateError::Telemetry(e.to_string()))
}
