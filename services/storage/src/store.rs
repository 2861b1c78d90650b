//! Object store abstraction.
//!
//! The uploader only needs four primitive calls from a bucket-based store.
//! Every backend maps its own failures into [`StoreError`], which the
//! uploader treats as opaque.

use crate::models::FileBody;
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by an object store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("bucket {0} does not exist")]
    NoSuchBucket(String),

    #[error("object {key} does not exist in bucket {bucket}")]
    NoSuchObject { bucket: String, key: String },

    #[error("failed to read upload body: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

/// Bucket-based binary storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether `bucket` exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    /// Create `bucket`
    async fn make_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Store `size` bytes read from `body` under `bucket/key`
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: FileBody,
        size: u64,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Delete `bucket/key`
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}
