use thiserror::Error;

use crate::hooks::HookKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("There is no search mapping for class \"{0}\"")]
    MetadataNotFound(String),

    #[error("Malformed mapping for \"{field}\": {reason}")]
    MalformedMapping { field: String, reason: String },

    #[error("Cannot resolve path \"{path}\": {reason}")]
    PathNotFound { path: String, reason: String },

    #[error("Unsupported value for \"{field}\": {reason}")]
    UnsupportedValue { field: String, reason: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Adapter failure: {0}")]
    Adapter(#[source] anyhow::Error),

    #[error("{hook} listener failed: {source}")]
    Listener {
        hook: HookKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a backend-native error. The original error stays reachable
    /// through `downcast_ref` on the inner `anyhow::Error`.
    pub fn adapter<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Adapter(anyhow::Error::new(err))
    }

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMapping { field: field.into(), reason: reason.into() }
    }

    pub fn path_not_found(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into(), reason: reason.into() }
    }

    pub fn unsupported_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedValue { field: field.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
