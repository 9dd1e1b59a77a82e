//! Error types for configuration resolution.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while resolving a component configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration schema violation in '{component}' at {path}: {message}")]
    Schema {
        component: String,
        path: String,
        message: String,
    },

    #[error("Governance violation in '{component}': {path} cannot be disabled in environment '{environment}'")]
    GovernanceViolation {
        component: String,
        path: String,
        environment: String,
    },

    #[error("Governance violation in '{component}': {path} must be at least {minimum} in environment '{environment}'")]
    BelowGovernanceFloor {
        component: String,
        path: String,
        minimum: u64,
        environment: String,
    },

    #[error("Invalid configuration schema for '{component}': {message}")]
    InvalidSchema { component: String, message: String },

    #[error("Invalid configuration layer '{layer}': {message}")]
    InvalidLayer { layer: String, message: String },

    #[error("Unknown compliance framework: {0}")]
    UnknownFramework(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// JSON pointer of the offending value, when the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::Schema { path, .. }
            | ConfigError::GovernanceViolation { path, .. }
            | ConfigError::BelowGovernanceFloor { path, .. } => Some(path),
            _ => None,
        }
    }
}
