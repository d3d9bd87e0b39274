use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for collection store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User ID must not be empty")]
    EmptyUserId,

    #[error("Blueprint name must not be empty")]
    EmptyBlueprint,

    #[error("Failed to access collection file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Collection file {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize collection: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("Store rejected update for '{blueprint}': {description}")]
    Rejected {
        blueprint: String,
        description: String,
    },
}
