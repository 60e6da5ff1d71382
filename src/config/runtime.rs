//! Runtime configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Executor and preflight tunables
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Per-action tool invocation timeout in seconds
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,

    /// Preflight probe timeout in seconds
    #[serde(default = "default_preflight_timeout")]
    pub preflight_timeout_secs: u64,

    /// Maximum automations a single user may deploy
    #[serde(default = "default_max_automations")]
    pub max_user_automations: u32,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl RuntimeConfig {
    /// Per-action timeout as a Duration
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    /// Preflight timeout as a Duration
    pub fn preflight_timeout(&self) -> Duration {
        Duration::from_secs(self.preflight_timeout_secs)
    }

    /// Validate runtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.action_timeout_secs == 0 || self.action_timeout_secs > 300 {
            return Err(ValidationError::InvalidActionTimeout);
        }
        if self.preflight_timeout_secs == 0 || self.preflight_timeout_secs > 300 {
            return Err(ValidationError::InvalidPreflightTimeout);
        }
        if self.max_user_automations == 0 {
            return Err(ValidationError::InvalidAutomationLimit);
        }
        if self.log_level.trim().is_empty() {
            return Err(ValidationError::InvalidLogFilter);
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            action_timeout_secs: default_action_timeout(),
            preflight_timeout_secs: default_preflight_timeout(),
            max_user_automations: default_max_automations(),
            log_level: default_log_level(),
        }
    }
}

fn default_action_timeout() -> u64 {
    30
}

fn default_preflight_timeout() -> u64 {
    30
}

fn default_max_automations() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}
