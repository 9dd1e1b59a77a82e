//! Error types for the binder engine.

use thiserror::Error;

use kiln_core::CoreError;

/// Result type alias for binder operations.
pub type BinderResult<T> = Result<T, BinderError>;

/// Errors that can occur while binding a source to a target capability.
#[derive(Error, Debug)]
pub enum BinderError {
    #[error(
        "No binder strategy for source type '{source_type}' and capability '{capability}'. Registered: {}",
        format_pairs(.registered)
    )]
    NoBinderStrategy {
        source_type: String,
        capability: String,
        registered: Vec<(String, String)>,
    },

    #[error("'{component}' binds {capability} at the high tier but the context has no shared network")]
    NetworkRequired {
        component: String,
        capability: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn format_pairs(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return "none".to_string();
    }
    pairs
        .iter()
        .map(|(source, capability)| format!("{} -> {}", source, capability))
        .collect::<Vec<_>>()
        .join(", ")
}
