use crate::models::FileBody;
use crate::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use murmur_common::ConcurrentMap;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::debug;

type Bucket = ConcurrentMap<String, StoredObject>;

/// An object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-process object store
///
/// Buckets and objects live in [`ConcurrentMap`]s, so the store can be shared
/// across upload tasks like a remote one. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: ConcurrentMap<String, Arc<Bucket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a stored object
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.bucket(bucket)?.get(&key.to_string())
    }

    /// Number of objects in `bucket`, or zero if it does not exist
    pub fn object_count(&self, bucket: &str) -> usize {
        self.bucket(bucket).map(|b| b.len()).unwrap_or(0)
    }

    /// Keys stored in `bucket`, in unspecified order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.bucket(bucket).map(|b| b.keys()).unwrap_or_default()
    }

    fn bucket(&self, bucket: &str) -> Option<Arc<Bucket>> {
        self.buckets.get(&bucket.to_string())
    }

    fn existing_bucket(&self, bucket: &str) -> Result<Arc<Bucket>, StoreError> {
        self.bucket(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        Ok(self.buckets.has_key(&bucket.to_string()))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        if self
            .buckets
            .set_if_absent(bucket.to_string(), Arc::new(Bucket::new()))
        {
            debug!(bucket = %bucket, "Bucket created");
        }
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: FileBody,
        size: u64,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let objects = self.existing_bucket(bucket)?;

        let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
        body.read_to_end(&mut data).await?;

        objects.set(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.existing_bucket(bucket)?
            .delete(&key.to_string())
            .map(|_| ())
            .ok_or_else(|| StoreError::NoSuchObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
