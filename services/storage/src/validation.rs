use crate::config::ValidationConfig;
use crate::models::File;
use thiserror::Error;

/// Reasons a file or batch is rejected before upload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid file name")]
    InvalidFileName,

    #[error("invalid size {size} for file {name} (limit {limit} bytes)")]
    InvalidFileSize { name: String, size: u64, limit: u64 },

    #[error("unsupported file type {ext:?} for file {name}")]
    UnsupportedFileType { name: String, ext: String },

    #[error("too many files: {count} (limit {limit})")]
    TooManyFiles { count: usize, limit: usize },
}

/// Broad media class, decided from the MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Video,
    Audio,
    Image,
    Other,
}

impl MediaClass {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            MediaClass::Video
        } else if mime_type.starts_with("audio/") {
            MediaClass::Audio
        } else if mime_type.starts_with("image/") {
            MediaClass::Image
        } else {
            MediaClass::Other
        }
    }
}

/// Checks files against the configured size and type limits
#[derive(Debug, Clone)]
pub struct FileValidator {
    config: ValidationConfig,
}

impl FileValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate_file_name(&self, name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidFileName);
        }
        Ok(())
    }

    /// Validate a single file's name, size and extension
    pub fn validate_file(&self, file: &File) -> Result<(), ValidationError> {
        self.validate_file_name(&file.name)?;

        let (limit, allowed) = self.limits_for(MediaClass::from_mime(&file.mime_type));

        if file.size == 0 || file.size > limit {
            return Err(ValidationError::InvalidFileSize {
                name: file.name.clone(),
                size: file.size,
                limit,
            });
        }

        if !allowed.is_empty() && !allowed.iter().any(|a| a.eq_ignore_ascii_case(&file.ext)) {
            return Err(ValidationError::UnsupportedFileType {
                name: file.name.clone(),
                ext: file.ext.clone(),
            });
        }

        Ok(())
    }

    /// Validate a batch: count first, then every file
    pub fn validate_files(&self, files: &[File]) -> Result<(), ValidationError> {
        if files.len() > self.config.max_file_count {
            return Err(ValidationError::TooManyFiles {
                count: files.len(),
                limit: self.config.max_file_count,
            });
        }

        files.iter().try_for_each(|file| self.validate_file(file))
    }

    fn limits_for(&self, class: MediaClass) -> (u64, &[String]) {
        let config = &self.config;
        match class {
            MediaClass::Video => (config.max_video_size, config.allowed_video_ext.as_slice()),
            MediaClass::Audio => (config.max_audio_size, config.allowed_audio_ext.as_slice()),
            MediaClass::Image => (
                config.max_picture_size,
                config.allowed_picture_ext.as_slice(),
            ),
            MediaClass::Other => (config.max_file_size, config.allowed_file_ext.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> FileValidator {
        FileValidator::new(ValidationConfig {
            max_file_count: 2,
            max_picture_size: 10,
            max_video_size: 100,
            max_audio_size: 50,
            max_file_size: 20,
            allowed_picture_ext: vec![".png".to_string(), ".jpg".to_string()],
            allowed_video_ext: vec![".mp4".to_string()],
            allowed_audio_ext: vec![],
            allowed_file_ext: vec![],
        })
    }

    fn file(name: &str, size: usize) -> File {
        File::from_bytes(name, vec![0u8; size])
    }

    #[test]
    fn test_media_class_from_mime() {
        assert_eq!(MediaClass::from_mime("video/mp4"), MediaClass::Video);
        assert_eq!(MediaClass::from_mime("audio/ogg"), MediaClass::Audio);
        assert_eq!(MediaClass::from_mime("image/png"), MediaClass::Image);
        assert_eq!(MediaClass::from_mime("application/pdf"), MediaClass::Other);
    }

    #[test]
    fn test_valid_files_pass() {
        let v = validator();
        assert!(v.validate_file(&file("cat.png", 10)).is_ok());
        assert!(v.validate_file(&file("clip.mp4", 100)).is_ok());
        assert!(v.validate_file(&file("song.mp3", 1)).is_ok());
        assert!(v.validate_file(&file("doc.pdf", 20)).is_ok());
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let v = validator();
        assert!(v.validate_file(&file("CAT.PNG", 5)).is_ok());
    }

    #[test]
    fn test_size_limits_per_class() {
        let v = validator();

        assert_eq!(
            v.validate_file(&file("cat.png", 11)),
            Err(ValidationError::InvalidFileSize {
                name: "cat.png".to_string(),
                size: 11,
                limit: 10,
            })
        );
        assert!(matches!(
            v.validate_file(&file("empty.pdf", 0)),
            Err(ValidationError::InvalidFileSize { size: 0, .. })
        ));
        assert!(v.validate_file(&file("big.pdf", 21)).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let v = validator();
        let gif = file("anim.gif", 5);

        assert_eq!(
            v.validate_file(&gif),
            Err(ValidationError::UnsupportedFileType {
                name: "anim.gif".to_string(),
                ext: ".gif".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let v = validator();
        assert_eq!(
            v.validate_file_name("  "),
            Err(ValidationError::InvalidFileName)
        );
        assert_eq!(
            v.validate_file(&file("", 1)),
            Err(ValidationError::InvalidFileName)
        );
    }

    #[test]
    fn test_batch_limits() {
        let v = validator();

        let too_many = vec![file("a.png", 1), file("b.png", 1), file("c.png", 1)];
        assert_eq!(
            v.validate_files(&too_many),
            Err(ValidationError::TooManyFiles { count: 3, limit: 2 })
        );

        let one_bad = vec![file("a.png", 1), file("b.gif", 1)];
        assert!(matches!(
            v.validate_files(&one_bad),
            Err(ValidationError::UnsupportedFileType { .. })
        ));

        assert!(v.validate_files(&[]).is_ok());
    }
}
