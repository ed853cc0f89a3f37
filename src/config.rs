//! # Configuration Management
//!
//! Component configuration for the dispatch core: admission thresholds and
//! the policy execution window. Values come from an optional TOML file
//! (`config/dispatch.toml`) layered under `DISPATCH__`-prefixed environment
//! variables, with sensible defaults when neither is present.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::config::DispatchConfig;
//!
//! let config = DispatchConfig::default();
//! assert!(config.validate().is_ok());
//! let breaker = config.admission.circuit_breaker_config();
//! assert_eq!(breaker.failure_threshold, 5);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DispatchError, Result};
use crate::resilience::CircuitBreakerConfig;

/// Top-level configuration for the dispatch core.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    pub admission: AdmissionConfig,
    pub policy: PolicyConfig,
}

/// Admission-control settings: circuit breaker thresholds plus the static
/// message-type deny list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdmissionConfig {
    pub circuit_breaker_enabled: bool,
    pub failure_threshold: u32,
    pub open_timeout_secs: u64,
    pub success_threshold: u32,
    pub blocked_message_types: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_enabled: true,
            failure_threshold: 5,
            open_timeout_secs: 30,
            success_threshold: 2,
            blocked_message_types: Vec::new(),
        }
    }
}

impl AdmissionConfig {
    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            timeout: Duration::from_secs(self.open_timeout_secs),
            success_threshold: self.success_threshold,
        }
    }
}

/// Policy executor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Window after the voting period end in which a passed proposal may
    /// still execute. Default is 14 days.
    pub max_execution_period_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_execution_period_secs: 14 * 24 * 60 * 60,
        }
    }
}

impl PolicyConfig {
    pub fn max_execution_period(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_execution_period_secs as i64)
    }
}

impl DispatchConfig {
    /// Load from `config/dispatch.toml` (optional) plus `DISPATCH__`
    /// environment overrides, e.g. `DISPATCH__ADMISSION__FAILURE_THRESHOLD=3`.
    pub fn load() -> Result<Self> {
        Self::load_from("config/dispatch")
    }

    /// Load from a specific config file base path (extension inferred).
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("DISPATCH").separator("__"))
            .build()
            .map_err(|e| DispatchError::Configuration {
                reason: format!("failed to read configuration: {e}"),
            })?;

        let loaded: DispatchConfig =
            settings
                .try_deserialize()
                .map_err(|e| DispatchError::Configuration {
                    reason: format!("failed to deserialize configuration: {e}"),
                })?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values that would misconfigure admission or policy execution.
    pub fn validate(&self) -> Result<()> {
        if self.admission.failure_threshold == 0 {
            return Err(DispatchError::Configuration {
                reason: "admission.failure_threshold must be at least 1".to_string(),
            });
        }
        if self.admission.success_threshold == 0 {
            return Err(DispatchError::Configuration {
                reason: "admission.success_threshold must be at least 1".to_string(),
            });
        }
        if self.policy.max_execution_period_secs == 0 {
            return Err(DispatchError::Configuration {
                reason: "policy.max_execution_period_secs must be positive".to_string(),
            });
        }
        Ok(())
    }
}
