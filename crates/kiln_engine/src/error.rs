//! Error types for manifest resolution.

use thiserror::Error;

use kiln_binder::BinderError;
use kiln_config::ConfigError;
use kiln_core::CoreError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while resolving a manifest.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Cyclic bind dependency: {}", cycle_path(.members))]
    CyclicDependency { members: Vec<String> },

    #[error("Duplicate component name: {0}")]
    DuplicateComponent(String),

    #[error("Selector '{selector}' on '{component}' matches more than one component: {}", .matches.join(", "))]
    AmbiguousTarget {
        component: String,
        selector: String,
        matches: Vec<String>,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Binder(#[from] BinderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn cycle_path(members: &[String]) -> String {
    match members.first() {
        Some(first) => format!("{} -> {}", members.join(" -> "), first),
        None => String::new(),
    }
}

/// Taxonomy class of an error, stable enough to surface to users verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SpecValidation,
    ConfigSchema,
    UnknownComponentType,
    CapabilityMissing,
    UnsupportedAccessLevel,
    NoBinderStrategy,
    NotSynthesized,
    CyclicDependency,
    Provisioning,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SpecValidation => "SpecValidationError",
            ErrorKind::ConfigSchema => "ConfigSchemaError",
            ErrorKind::UnknownComponentType => "UnknownComponentTypeError",
            ErrorKind::CapabilityMissing => "CapabilityMissingError",
            ErrorKind::UnsupportedAccessLevel => "UnsupportedAccessLevelError",
            ErrorKind::NoBinderStrategy => "NoBinderStrategyError",
            ErrorKind::NotSynthesized => "NotSynthesizedError",
            ErrorKind::CyclicDependency => "CyclicDependencyError",
            ErrorKind::Provisioning => "ProvisioningError",
            ErrorKind::Other => "Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn core_kind(error: &CoreError) -> ErrorKind {
    match error {
        CoreError::SpecValidation { .. } => ErrorKind::SpecValidation,
        CoreError::Config(_) => ErrorKind::ConfigSchema,
        CoreError::UnknownComponentType { .. } => ErrorKind::UnknownComponentType,
        // An incomplete capability is as unusable as an absent one.
        CoreError::CapabilityMissing { .. } | CoreError::CapabilityContract { .. } => {
            ErrorKind::CapabilityMissing
        }
        CoreError::UnsupportedAccessLevel(_) => ErrorKind::UnsupportedAccessLevel,
        CoreError::NotSynthesized { .. } => ErrorKind::NotSynthesized,
        CoreError::Provisioning { .. } => ErrorKind::Provisioning,
        CoreError::DuplicateComponentType(_)
        | CoreError::ConstructNotFound { .. }
        | CoreError::InvalidStateTransition { .. }
        | CoreError::EnvironmentVariableConflict { .. } => ErrorKind::Other,
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            EngineError::DuplicateComponent(_)
            | EngineError::AmbiguousTarget { .. }
            | EngineError::InvalidManifest(_)
            | EngineError::Yaml(_) => ErrorKind::SpecValidation,
            EngineError::Core(e) => core_kind(e),
            EngineError::Binder(BinderError::NoBinderStrategy { .. }) => ErrorKind::NoBinderStrategy,
            // The manifest asked for the high tier without declaring a network.
            EngineError::Binder(BinderError::NetworkRequired { .. }) => ErrorKind::SpecValidation,
            EngineError::Binder(BinderError::Core(e)) => core_kind(e),
            EngineError::Config(_) => ErrorKind::ConfigSchema,
            EngineError::Io(_) | EngineError::Json(_) => ErrorKind::Other,
        }
    }
}
