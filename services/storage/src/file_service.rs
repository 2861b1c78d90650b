use crate::error::StorageError;
use crate::models::File;
use crate::uploader::{BucketKind, Uploader};
use crate::validation::FileValidator;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Caller-facing file operations: validate, then hand off to the uploader
#[derive(Debug, Clone)]
pub struct FileService {
    uploader: Uploader,
    validator: FileValidator,
}

impl FileService {
    pub fn new(uploader: Uploader, validator: FileValidator) -> Self {
        Self {
            uploader,
            validator,
        }
    }

    /// Upload one file to the content bucket
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn upload_file(&self, file: File) -> Result<String, StorageError> {
        self.validator.validate_file(&file)?;
        self.uploader.upload_one(file).await
    }

    /// Upload one file to a specific bucket, e.g. a profile picture
    pub async fn upload_file_to(&self, kind: BucketKind, file: File) -> Result<String, StorageError> {
        self.validator.validate_file(&file)?;
        self.uploader.upload_one_to(kind, file).await
    }

    /// Upload a batch; nothing is sent if any file fails validation
    #[instrument(skip(self, files, cancel), fields(files = files.len()))]
    pub async fn upload_many_files(
        &self,
        files: Vec<File>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, StorageError> {
        self.validator.validate_files(&files)?;
        self.uploader.upload_many(files, cancel).await
    }

    pub fn get_file_url(&self, name: &str) -> Result<String, StorageError> {
        self.validator.validate_file_name(name)?;
        Ok(self.uploader.get_file_url(name))
    }

    pub async fn delete_file(&self, name: &str) -> Result<(), StorageError> {
        self.validator.validate_file_name(name)?;
        self.uploader.delete_file(name).await
    }

    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ObjectStoreConfig, ValidationConfig};
    use crate::memory_store::MemoryStore;
    use crate::validation::ValidationError;
    use std::sync::Arc;

    async fn service() -> (FileService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = ObjectStoreConfig {
            public_endpoint: "media.example.com".to_string(),
            ..Default::default()
        };
        let uploader = Uploader::new(store.clone(), &config).await.unwrap();
        let validator = FileValidator::new(ValidationConfig {
            max_file_count: 3,
            ..Default::default()
        });
        (FileService::new(uploader, validator), store)
    }

    #[tokio::test]
    async fn test_upload_many_files_rejects_before_any_write() {
        let (service, store) = service().await;
        let files = vec![
            File::from_bytes("a.png", b"a".to_vec()),
            File::from_bytes("b.exe", Vec::new()),
        ];

        let err = service
            .upload_many_files(files, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::InvalidFileSize { .. })
        ));
        assert_eq!(store.object_count("posts"), 0);
    }

    #[tokio::test]
    async fn test_upload_many_files_too_many() {
        let (service, _store) = service().await;
        let files = (0..4)
            .map(|i| File::from_bytes(format!("{i}.png"), b"x".to_vec()))
            .collect();

        let err = service
            .upload_many_files(files, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::TooManyFiles { count: 4, limit: 3 })
        ));
    }

    #[tokio::test]
    async fn test_upload_file_to_profile_bucket() {
        let (service, store) = service().await;

        let url = service
            .upload_file_to(BucketKind::Profile, File::from_bytes("me.jpg", b"me".to_vec()))
            .await
            .unwrap();

        assert!(url.starts_with("https://media.example.com/profiles/"));
        assert_eq!(store.object_count("profiles"), 1);
        assert_eq!(store.object_count("posts"), 0);
    }

    #[tokio::test]
    async fn test_name_validation_guards_url_and_delete() {
        let (service, _store) = service().await;

        assert!(matches!(
            service.get_file_url(""),
            Err(StorageError::Validation(ValidationError::InvalidFileName))
        ));
        assert!(matches!(
            service.delete_file("").await,
            Err(StorageError::Validation(ValidationError::InvalidFileName))
        ));
        assert_eq!(
            service.get_file_url("k.png").unwrap(),
            "https://media.example.com/posts/k.png"
        );
    }

    #[tokio::test]
    async fn test_upload_then_delete_round_trip() {
        let (service, store) = service().await;

        let url = service
            .upload_file(File::from_bytes("doc.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        let key = url.rsplit('/').next().unwrap();
        assert!(store.object("posts", key).is_some());

        service.delete_file(key).await.unwrap();
        assert!(store.object("posts", key).is_none());
    }
}
