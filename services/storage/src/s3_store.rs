use crate::config::ObjectStoreConfig;
use crate::error::StorageError;
use crate::models::FileBody;
use crate::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument};

const DEFAULT_REGION: &str = "us-east-1";

/// Object store backed by an S3-compatible service (AWS S3, MinIO, LocalStack)
pub struct S3Store {
    client: S3Client,
    region: String,
}

impl S3Store {
    /// Build an S3 client for the configured endpoint
    ///
    /// No request is sent here; reachability is established by the first
    /// bucket check the uploader performs.
    pub async fn connect(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        if config.internal_endpoint.is_empty() {
            return Err(StorageError::Connect(
                "internal endpoint is not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "murmur-static",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = S3ConfigBuilder::from(&aws_config)
            .endpoint_url(config.endpoint_url())
            .force_path_style(config.force_path_style)
            .build();

        let client = S3Client::from_conf(s3_config);

        info!(
            endpoint = %config.endpoint_url(),
            region = %config.region,
            "S3 object store client initialized"
        );

        Ok(Self {
            client,
            region: config.region.clone(),
        })
    }

    /// Wrap an already configured client
    pub fn from_client(client: S3Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Get the S3 client
    pub fn client(&self) -> &S3Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(backend_error(e))
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn make_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(backend_error)?;

        info!(bucket = %bucket, "Bucket created");
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
        let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
        body.read_to_end(&mut data).await?;

        debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = data.len(),
            "Putting object"
        );

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_error)?;

        debug!(bucket = %bucket, key = %key, "Object deleted");
        Ok(())
    }
}

/// Flatten an SDK error chain into a single message
fn backend_error(err: impl std::error::Error) -> StoreError {
    StoreError::Backend(DisplayErrorContext(err).to_string())
}
