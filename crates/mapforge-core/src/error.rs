//! Error types for mapforge-core

use thiserror::Error;

/// Result type alias for mapforge-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mapforge-core
#[derive(Error, Debug)]
pub enum Error {
    /// Definition file could not be found
    #[error("definition file not found: {path}")]
    DefinitionNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML
    #[error("failed to parse definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Invalid definition value
    #[error("invalid definition: {message}")]
    Invalid {
        /// Description of what's invalid
        message: String,
    },

    /// A required key was absent from a document
    #[error("missing key '{key}'")]
    MissingKey {
        /// The key that was looked up
        key: String,
    },

    /// A tagged block named a type with no registered variant
    #[error("no {capability} type registered for '{tag}'")]
    UnknownExtensionType {
        /// Capability category that was searched
        capability: &'static str,
        /// The `type` value from the block
        tag: String,
    },

    /// Option structure cannot be flattened into arguments
    #[error("invalid options: {message}")]
    InvalidOptions {
        /// Description of the offending structure
        message: String,
    },

    /// An extension operation failed
    #[error("{name} extension error: {message}")]
    Extension {
        /// Extension tag (e.g. "gsheet", "rsync")
        name: &'static str,
        /// Description of the failure
        message: String,
    },

    /// An extension was used without a bound definition or explicit context
    #[error("extension is not bound to a definition and no context was given")]
    UnboundExtension,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
