//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Action timeout must be between 1 and 300 seconds")]
    InvalidActionTimeout,

    #[error("Preflight timeout must be between 1 and 300 seconds")]
    InvalidPreflightTimeout,

    #[error("Automation limit must be greater than zero")]
    InvalidAutomationLimit,

    #[error("Invalid log filter directive")]
    InvalidLogFilter,
}
