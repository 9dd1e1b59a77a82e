//! Error types for the component model.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while creating, synthesizing or binding components.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid component spec '{component}': {message}")]
    SpecValidation { component: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] kiln_config::ConfigError),

    #[error("Unknown component type '{component_type}'. Known types: {}", .known.join(", "))]
    UnknownComponentType {
        component_type: String,
        known: Vec<String>,
    },

    #[error("Component type already registered: {0}")]
    DuplicateComponentType(String),

    #[error("Capability '{capability}' is not available on '{target}'")]
    CapabilityMissing { target: String, capability: String },

    #[error("Capability '{capability}' violates its contract: {message}")]
    CapabilityContract { capability: String, message: String },

    #[error("Unsupported access level '{0}'. Expected one of: read, write, readwrite, admin")]
    UnsupportedAccessLevel(String),

    #[error("Component '{component}' is not synthesized; cannot {operation}")]
    NotSynthesized { component: String, operation: String },

    #[error("Construct '{construct}' is not registered on '{component}'")]
    ConstructNotFound { component: String, construct: String },

    #[error("Invalid state transition for '{component}' from {from} to {to}")]
    InvalidStateTransition {
        component: String,
        from: String,
        to: String,
    },

    #[error("Environment variable '{name}' on '{component}' is already bound to a different value")]
    EnvironmentVariableConflict { component: String, name: String },

    #[error("Provisioning failed for '{component}': {message}")]
    Provisioning { component: String, message: String },
}
