use crate::config::ConfigError;
use crate::store::StoreError;
use crate::validation::ValidationError;
use murmur_common::CollectionError;
use thiserror::Error;

/// Errors surfaced by the uploader and file service
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("could not connect to object store: {0}")]
    Connect(String),

    #[error("could not check if bucket {bucket} exists: {source}")]
    BucketCheck {
        bucket: String,
        #[source]
        source: StoreError,
    },

    #[error("could not create bucket {bucket}: {source}")]
    BucketCreate {
        bucket: String,
        #[source]
        source: StoreError,
    },

    #[error("could not upload file {name}: {source}")]
    Upload {
        name: String,
        #[source]
        source: StoreError,
    },

    /// The batch result slot for a file was missing; the collection was sized wrong
    #[error("could not record url for file {name}: {source}")]
    Index {
        name: String,
        #[source]
        source: CollectionError,
    },

    #[error("could not delete file {name}: {source}")]
    Delete {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("upload batch was cancelled")]
    Cancelled,

    #[error("upload task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StorageError {
    /// Whether this error only reports that the batch scope was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StorageError::Cancelled)
    }
}
