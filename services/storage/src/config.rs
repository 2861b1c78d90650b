use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to load configuration: {0}")]
    LoadError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// Main configuration for the storage service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Object store connection and bucket layout
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
    /// Upload validation limits
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Which object store implementation backs the uploader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// S3-compatible service (AWS S3, MinIO, LocalStack)
    #[default]
    S3,
    /// In-process store, for local development
    Memory,
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Store implementation
    #[serde(default)]
    pub backend: StoreBackend,
    /// Endpoint the service talks to (host:port, no scheme)
    #[serde(default = "default_internal_endpoint")]
    pub internal_endpoint: String,
    /// Endpoint clients download from (host[:port][/path], no scheme)
    #[serde(default = "default_public_endpoint")]
    pub public_endpoint: String,
    /// Scheme used when composing public URLs
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Use TLS for the internal endpoint
    #[serde(default)]
    pub use_ssl: bool,
    /// Region used for request signing
    #[serde(default = "default_region")]
    pub region: String,
    /// Force path-style access (required for MinIO)
    #[serde(default = "default_true")]
    pub force_path_style: bool,
    /// Access key ID
    #[serde(default = "default_access_key")]
    pub access_key: String,
    /// Secret access key
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Bucket for post content; batch uploads always land here
    #[serde(default = "default_content_bucket")]
    pub content_bucket: String,
    /// Bucket for message attachments
    #[serde(default = "default_attachments_bucket")]
    pub attachments_bucket: String,
    /// Bucket for profile pictures
    #[serde(default = "default_profile_bucket")]
    pub profile_bucket: String,
    /// Maximum uploads in flight per batch (0 = one per file)
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    /// Delete already-uploaded objects when a sibling upload fails
    #[serde(default)]
    pub compensate_failed_batches: bool,
}

/// Limits applied to incoming files before anything is uploaded
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Maximum number of files in a single batch
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,
    /// Maximum size of an image, e.g. "10MB"
    #[serde(default = "default_max_picture_size", deserialize_with = "deserialize_size")]
    pub max_picture_size: u64,
    /// Maximum size of a video
    #[serde(default = "default_max_video_size", deserialize_with = "deserialize_size")]
    pub max_video_size: u64,
    /// Maximum size of an audio track
    #[serde(default = "default_max_audio_size", deserialize_with = "deserialize_size")]
    pub max_audio_size: u64,
    /// Maximum size of any other file
    #[serde(default = "default_max_file_size", deserialize_with = "deserialize_size")]
    pub max_file_size: u64,
    /// Allowed image extensions (empty = any)
    #[serde(default = "default_picture_exts")]
    pub allowed_picture_ext: Vec<String>,
    /// Allowed video extensions (empty = any)
    #[serde(default = "default_video_exts")]
    pub allowed_video_ext: Vec<String>,
    /// Allowed audio extensions (empty = any)
    #[serde(default = "default_audio_exts")]
    pub allowed_audio_ext: Vec<String>,
    /// Allowed extensions for other files (empty = any)
    #[serde(default)]
    pub allowed_file_ext: Vec<String>,
}

// Default value functions
fn default_service_name() -> String {
    "murmur-storage".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_internal_endpoint() -> String {
    "minio:9000".to_string()
}

fn default_public_endpoint() -> String {
    "localhost:9000".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_access_key() -> String {
    "admin".to_string()
}

fn default_secret_key() -> String {
    "adminpassword".to_string()
}

fn default_content_bucket() -> String {
    "posts".to_string()
}

fn default_attachments_bucket() -> String {
    "attachments".to_string()
}

fn default_profile_bucket() -> String {
    "profiles".to_string()
}

fn default_upload_concurrency() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_max_file_count() -> usize {
    10
}

fn default_max_picture_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_video_size() -> u64 {
    100 * 1024 * 1024 // 100MB
}

fn default_max_audio_size() -> u64 {
    20 * 1024 * 1024 // 20MB
}

fn default_max_file_size() -> u64 {
    25 * 1024 * 1024 // 25MB
}

fn default_picture_exts() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_video_exts() -> Vec<String> {
    [".mp4", ".webm", ".mov"].into_iter().map(String::from).collect()
}

fn default_audio_exts() -> Vec<String> {
    [".mp3", ".wav", ".ogg", ".m4a"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Parse a human-readable size such as "512KB", "1.5MB" or "2048"
///
/// Units are 1024-based; a bare number is a byte count.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let normalized = input.trim().to_uppercase();

    let (number, multiplier) = if let Some(n) = normalized.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = normalized.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = normalized.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = normalized.strip_suffix('B') {
        (n, 1)
    } else {
        (normalized.as_str(), 1)
    };

    let value: f64 = number.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: "size".to_string(),
        message: format!("{input:?}: {e}"),
    })?;

    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            key: "size".to_string(),
            message: format!("{input:?} is not a non-negative size"),
        });
    }

    Ok((value * multiplier as f64) as u64)
}

/// Accept either a byte count or a size string in config files
fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSize {
        Bytes(u64),
        Text(String),
    }

    match RawSize::deserialize(deserializer)? {
        RawSize::Bytes(bytes) => Ok(bytes),
        RawSize::Text(text) => parse_size(&text).map_err(serde::de::Error::custom),
    }
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            // Add config file if present
            .add_source(config::File::with_name("config/storage").required(false))
            .add_source(config::File::with_name("/etc/murmur/storage").required(false))
            // Override with environment variables
            // MURMUR__OBJECT_STORE__CONTENT_BUCKET -> object_store.content_bucket
            .add_source(
                config::Environment::with_prefix("MURMUR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.object_store.validate()?;

        if self.validation.max_file_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "validation.max_file_count".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

impl ObjectStoreConfig {
    /// Validate the object store section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content_bucket.is_empty() {
            return Err(ConfigError::MissingRequired(
                "object_store.content_bucket".to_string(),
            ));
        }

        if self.public_endpoint.is_empty() {
            return Err(ConfigError::MissingRequired(
                "object_store.public_endpoint".to_string(),
            ));
        }

        if self.backend == StoreBackend::S3 && self.internal_endpoint.is_empty() {
            return Err(ConfigError::MissingRequired(
                "object_store.internal_endpoint (required for s3 backend)".to_string(),
            ));
        }

        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "object_store.scheme".to_string(),
                message: format!("expected http or https, got {:?}", self.scheme),
            });
        }

        Ok(())
    }

    /// Root of every public URL: `scheme://public-endpoint`
    pub fn public_url_root(&self) -> String {
        format!(
            "{}://{}",
            self.scheme,
            self.public_endpoint.trim_end_matches('/')
        )
    }

    /// URL of the internal endpoint, as handed to the S3 client
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.internal_endpoint)
    }

    /// Distinct non-empty bucket names, content bucket first
    pub fn bucket_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(3);
        for name in [
            self.content_bucket.as_str(),
            self.attachments_bucket.as_str(),
            self.profile_bucket.as_str(),
        ] {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            internal_endpoint: default_internal_endpoint(),
            public_endpoint: default_public_endpoint(),
            scheme: default_scheme(),
            use_ssl: false,
            region: default_region(),
            force_path_style: default_true(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            content_bucket: default_content_bucket(),
            attachments_bucket: default_attachments_bucket(),
            profile_bucket: default_profile_bucket(),
            upload_concurrency: default_upload_concurrency(),
            compensate_failed_batches: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_count: default_max_file_count(),
            max_picture_size: default_max_picture_size(),
            max_video_size: default_max_video_size(),
            max_audio_size: default_max_audio_size(),
            max_file_size: default_max_file_size(),
            allowed_picture_ext: default_picture_exts(),
            allowed_video_ext: default_video_exts(),
            allowed_audio_ext: default_audio_exts(),
            allowed_file_ext: Vec::new(),
        }
    }
}
