use crate::config::{ObjectStoreConfig, StoreBackend};
use crate::error::StorageError;
use crate::memory_store::MemoryStore;
use crate::models::File;
use crate::s3_store::S3Store;
use crate::store::ObjectStore;
use murmur_common::ConcurrentVec;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Which configured bucket an upload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Content,
    Attachments,
    Profile,
}

/// Uploads files to the object store and resolves their public URLs
///
/// Cheap to clone; clones share the same store handle.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    content_bucket: Arc<str>,
    attachments_bucket: Arc<str>,
    profile_bucket: Arc<str>,
    public_url_root: Arc<str>,
    upload_concurrency: usize,
    compensate_failed_batches: bool,
}

impl Uploader {
    /// Build the configured store backend and set up the uploader on top of it
    pub async fn connect(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        config.validate()?;

        let store: Arc<dyn ObjectStore> = match config.backend {
            StoreBackend::S3 => Arc::new(S3Store::connect(config).await?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };

        Self::new(store, config).await
    }

    /// Create an uploader over `store`, creating any missing bucket
    ///
    /// Fails without producing an instance if a bucket cannot be checked or
    /// created.
    pub async fn new(
        store: Arc<dyn ObjectStore>,
        config: &ObjectStoreConfig,
    ) -> Result<Self, StorageError> {
        for bucket in config.bucket_names() {
            ensure_bucket(store.as_ref(), bucket).await?;
        }

        let fallback = |name: &str| -> Arc<str> {
            if name.is_empty() {
                Arc::from(config.content_bucket.as_str())
            } else {
                Arc::from(name)
            }
        };

        info!(
            bucket = %config.content_bucket,
            public_url_root = %config.public_url_root(),
            upload_concurrency = config.upload_concurrency,
            "Uploader initialized"
        );

        Ok(Self {
            content_bucket: Arc::from(config.content_bucket.as_str()),
            attachments_bucket: fallback(&config.attachments_bucket),
            profile_bucket: fallback(&config.profile_bucket),
            public_url_root: Arc::from(config.public_url_root()),
            upload_concurrency: config.upload_concurrency,
            compensate_failed_batches: config.compensate_failed_batches,
            store,
        })
    }

    /// Name of the bucket behind `kind`
    pub fn bucket(&self, kind: BucketKind) -> &str {
        match kind {
            BucketKind::Content => &self.content_bucket,
            BucketKind::Attachments => &self.attachments_bucket,
            BucketKind::Profile => &self.profile_bucket,
        }
    }

    /// `scheme://public-endpoint`
    pub fn public_url_root(&self) -> &str {
        &self.public_url_root
    }

    /// Upload one file to the content bucket and return its public URL
    pub async fn upload_one(&self, file: File) -> Result<String, StorageError> {
        self.upload_one_to(BucketKind::Content, file).await
    }

    /// Upload one file to the bucket behind `kind`
    #[instrument(skip(self, file), fields(name = %file.name, size_bytes = file.size))]
    pub async fn upload_one_to(&self, kind: BucketKind, file: File) -> Result<String, StorageError> {
        let bucket = self.bucket(kind);
        let url = put_file(self.store.as_ref(), bucket, &self.public_url_root, file).await?;

        info!(url = %url, "File uploaded");
        Ok(url)
    }

    /// Upload every file concurrently into the content bucket
    ///
    /// Returns one URL per input file, in input order. The first failure
    /// cancels the remaining uploads and is returned alone; objects already
    /// written by sibling uploads stay in the store unless compensation is
    /// enabled. Cancelling `cancel` aborts the batch the same way.
    #[instrument(skip(self, files, cancel), fields(bucket = %self.content_bucket, files = files.len()))]
    pub async fn upload_many(
        &self,
        files: Vec<File>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, StorageError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let urls = Arc::new(ConcurrentVec::<String>::with_len(files.len()));
        let scope = cancel.child_token();
        let permits = Arc::new(Semaphore::new(self.worker_limit(files.len())));

        let mut tasks = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let task = UploadTask {
                index,
                store: Arc::clone(&self.store),
                bucket: Arc::clone(&self.content_bucket),
                public_url_root: Arc::clone(&self.public_url_root),
                urls: Arc::clone(&urls),
                scope: scope.clone(),
                permits: Arc::clone(&permits),
            };
            tasks.spawn(task.run(file));
        }

        let mut failure: Option<StorageError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(StorageError::from).and_then(|result| result);
            let Err(err) = outcome else {
                continue;
            };

            scope.cancel();

            // Keep the first real failure; sibling cancellations only echo it
            let replace = match &failure {
                None => true,
                Some(first) => first.is_cancelled() && !err.is_cancelled(),
            };
            if replace {
                failure = Some(err);
            } else {
                debug!(error = %err, "Batch already failed, dropping later error");
            }
        }

        metrics::histogram!("storage.batch.duration_seconds")
            .record(started.elapsed().as_secs_f64());

        if let Some(err) = failure {
            metrics::counter!("storage.batches.failed").increment(1);
            error!(error = %err, "Batch upload failed");

            if self.compensate_failed_batches {
                self.remove_uploaded(&urls).await;
            }
            return Err(err);
        }

        let urls = urls.snapshot();
        info!(
            files = urls.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Batch uploaded"
        );
        Ok(urls)
    }

    /// Public URL of an object in the content bucket
    pub fn get_file_url(&self, name: &str) -> String {
        object_url(&self.public_url_root, &self.content_bucket, name)
    }

    /// Delete an object from the content bucket
    #[instrument(skip(self))]
    pub async fn delete_file(&self, name: &str) -> Result<(), StorageError> {
        self.store
            .remove_object(&self.content_bucket, name)
            .await
            .map_err(|source| StorageError::Delete {
                name: name.to_string(),
                source,
            })?;

        metrics::counter!("storage.deletes").increment(1);
        debug!(name = %name, "File deleted");
        Ok(())
    }

    fn worker_limit(&self, files: usize) -> usize {
        if self.upload_concurrency == 0 {
            files
        } else {
            self.upload_concurrency.min(files)
        }
    }

    /// Best-effort removal of the objects a failed batch managed to write
    async fn remove_uploaded(&self, urls: &ConcurrentVec<String>) {
        let written = urls.filter_up_to(|url| !url.is_empty(), 0);

        for url in written {
            let Some(key) = url.rsplit('/').next() else {
                continue;
            };
            match self.store.remove_object(&self.content_bucket, key).await {
                Ok(()) => debug!(key = %key, "Removed object from failed batch"),
                Err(e) => warn!(key = %key, error = %e, "Could not remove object from failed batch"),
            }
        }
    }
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("content_bucket", &self.content_bucket)
            .field("public_url_root", &self.public_url_root)
            .field("upload_concurrency", &self.upload_concurrency)
            .finish_non_exhaustive()
    }
}

/// One file's share of a batch
struct UploadTask {
    index: usize,
    store: Arc<dyn ObjectStore>,
    bucket: Arc<str>,
    public_url_root: Arc<str>,
    urls: Arc<ConcurrentVec<String>>,
    scope: CancellationToken,
    permits: Arc<Semaphore>,
}

impl UploadTask {
    async fn run(self, file: File) -> Result<(), StorageError> {
        // Cancels the batch unless disarmed, including when this task panics or is aborted
        let guard = self.scope.clone().drop_guard();

        let _permit = tokio::select! {
            biased;
            _ = self.scope.cancelled() => return Err(StorageError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| StorageError::Cancelled)?,
        };

        // Last check before the write; an in-flight write is never interrupted
        if self.scope.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        let name = file.name.clone();
        let result = put_file(self.store.as_ref(), &self.bucket, &self.public_url_root, file)
            .await
            .and_then(|url| {
                self.urls
                    .set_at(self.index, url)
                    .map_err(|source| StorageError::Index {
                        name: name.clone(),
                        source,
                    })
            });

        match result {
            Ok(()) => {
                guard.disarm();
                Ok(())
            }
            Err(e) => {
                warn!(index = self.index, name = %name, error = %e, "Upload task failed");
                Err(e)
            }
        }
    }
}

/// Store `file` under a fresh random key and return its public URL
async fn put_file(
    store: &dyn ObjectStore,
    bucket: &str,
    public_url_root: &str,
    file: File,
) -> Result<String, StorageError> {
    let File {
        reader,
        name,
        size,
        ext,
        mime_type,
        ..
    } = file;

    let key = object_key(&ext);

    debug!(
        bucket = %bucket,
        key = %key,
        name = %name,
        size_bytes = size,
        "Uploading file"
    );

    if let Err(source) = store
        .put_object(bucket, &key, reader, size, &mime_type)
        .await
    {
        metrics::counter!("storage.uploads.failed").increment(1);
        return Err(StorageError::Upload { name, source });
    }

    metrics::counter!("storage.uploads.succeeded").increment(1);
    metrics::counter!("storage.bytes.uploaded").increment(size);

    Ok(object_url(public_url_root, bucket, &key))
}

/// Random object key that keeps the original extension
fn object_key(ext: &str) -> String {
    format!("{}{}", Uuid::new_v4(), ext)
}

fn object_url(public_url_root: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", public_url_root, bucket, key)
}

async fn ensure_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<(), StorageError> {
    let exists = store
        .bucket_exists(bucket)
        .await
        .map_err(|source| StorageError::BucketCheck {
            bucket: bucket.to_string(),
            source,
        })?;

    if !exists {
        store
            .make_bucket(bucket)
            .await
            .map_err(|source| StorageError::BucketCreate {
                bucket: bucket.to_string(),
                source,
            })?;
        info!(bucket = %bucket, "Created missing bucket");
    }

    Ok(())
}
