//! Configuration for the approval gate

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::GateResult;

/// Approval gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Upper bound for the privilege probe, in milliseconds. `None` leaves the
    /// deadline to the caller.
    #[serde(default)]
    pub probe_timeout_ms: Option<u64>,

    /// Skip the eligible-approver membership check when the resource is created
    #[serde(default = "default_true")]
    pub waive_membership_on_create: bool,

    /// Accept a missing approval spec on create, checking only list structure
    #[serde(default = "default_true")]
    pub allow_missing_spec_on_create: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: None,
            waive_membership_on_create: true,
            allow_missing_spec_on_create: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GateConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `APPROVAL_GATE_*` environment variables (`__` separates nested keys).
    pub fn load(path: Option<&str>) -> GateResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&GateConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("APPROVAL_GATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }
}
