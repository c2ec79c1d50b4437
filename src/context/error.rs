//! Error types for configuration and lookup plumbing.

use thiserror::Error;

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),
}

/// Errors from external metadata resolvers. A missing entry is not an
/// error; resolvers omit unknown IDs instead.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("metadata request failed: {0}")]
    Request(String),

    #[error("metadata response malformed")]
    Malformed(#[from] serde_json::Error),
}
