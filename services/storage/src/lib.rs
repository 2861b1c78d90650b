//! Murmur Storage Service
//!
//! Media upload service for the Murmur social platform. Posts, attachments
//! and profile pictures are validated, stored in an S3-compatible object
//! store (MinIO in development) under random keys, and handed back to the
//! caller as public URLs.
//!
//! ## Features
//!
//! - **Concurrent Batch Uploads**: One task per file, URLs returned in input
//!   order, the whole batch fails on the first error
//! - **Cancellation**: Callers can abort a batch through a cancellation token;
//!   queued uploads are skipped, in-flight writes finish
//! - **Pluggable Backends**: S3/MinIO for real deployments, an in-process
//!   store for tests and local runs
//! - **Upfront Validation**: Size and extension limits per media class, checked
//!   before anything is written
//!
//! ## Architecture
//!
//! ```text
//!  Caller                                        Object Store
//! ┌──────────────┐    ┌──────────────┐          ┌──────────────┐
//! │ File         │───▶│ File         │          │ posts/       │
//! │ Service      │    │ Validator    │          │ attachments/ │
//! └──────────────┘    └──────────────┘          │ profiles/    │
//!        │                                      └──────────────┘
//!        ▼                                             ▲
//! ┌──────────────┐    ┌──────────────┐                 │
//! │ Uploader     │───▶│ Upload Tasks │─────────────────┘
//! │              │    │ (JoinSet)    │
//! └──────────────┘    └──────────────┘
//!        ▲                   │
//!        │                   ▼
//!        │            ┌──────────────┐
//!        └────────────│ URL slots    │
//!                     │ (ConcurrentVec)
//!                     └──────────────┘
//! ```

pub mod config;
pub mod error;
pub mod file_service;
pub mod memory_store;
pub mod models;
pub mod s3_store;
pub mod store;
pub mod uploader;
pub mod validation;

pub use config::Config;
pub use error::StorageError;
pub use file_service::FileService;
pub use memory_store::MemoryStore;
pub use models::{AccessMode, File};
pub use s3_store::S3Store;
pub use store::{ObjectStore, StoreError};
pub use uploader::{BucketKind, Uploader};
pub use validation::{FileValidator, ValidationError};
