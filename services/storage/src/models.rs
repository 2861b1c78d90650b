use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tokio::io::AsyncRead;

/// Byte stream handed to the object store; readable exactly once
pub type FileBody = Box<dyn AsyncRead + Send + Unpin>;

/// Who may read an uploaded object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    #[default]
    Public,
    Private,
}

/// A unit of upload work
///
/// The caller builds and owns the file; uploading consumes it, since the
/// reader cannot be rewound.
pub struct File {
    /// Payload stream
    pub reader: FileBody,
    /// Display name, used for diagnostics only
    pub name: String,
    /// Payload length in bytes
    pub size: u64,
    /// Extension including the leading dot (".png"), may be empty
    pub ext: String,
    /// MIME type stored alongside the object
    pub mime_type: String,
    pub access_mode: AccessMode,
    /// Public URL of an already-stored object being referenced, not uploaded
    pub url: Option<String>,
}

impl File {
    /// Create a file from a reader; extension and MIME type derive from `name`
    pub fn new(name: impl Into<String>, reader: FileBody, size: u64) -> Self {
        let name = name.into();
        let ext = extension_of(&name);
        let mime_type = content_type_for_ext(&ext).to_string();

        Self {
            reader,
            name,
            size,
            ext,
            mime_type,
            access_mode: AccessMode::default(),
            url: None,
        }
    }

    /// Create a file from an in-memory payload
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self::new(name, Box::new(Cursor::new(data)), size)
    }

    /// Open a file on disk for streaming upload
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let handle = tokio::fs::File::open(path).await?;
        let size = handle.metadata().await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, Box::new(handle), size))
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_access_mode(mut self, access_mode: AccessMode) -> Self {
        self.access_mode = access_mode;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("ext", &self.ext)
            .field("mime_type", &self.mime_type)
            .field("access_mode", &self.access_mode)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Suffix of the last path element starting at its final dot, case kept
///
/// `"photo.PNG"` gives `".PNG"`, `".hidden"` gives `".hidden"` and a name
/// without a dot gives an empty string.
pub fn extension_of(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rfind('.')
        .map(|dot| base[dot..].to_string())
        .unwrap_or_default()
}

/// Content type for a file extension
pub fn content_type_for_ext(ext: &str) -> &'static str {
    match ext.trim_start_matches('.').to_lowercase().as_str() {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
