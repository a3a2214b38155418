use std::fs;
use std::path::Path;
use std::sync::Arc;

use url::Url;

use super::error::UploadError;
use super::validation::MAX_FILE_BYTES;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file the user picked or dropped, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: content_type.filter(|c| !c.trim().is_empty()),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its content type from the extension.
    ///
    /// Files over the size limit are rejected from their metadata, before any byte is read.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let unreadable = |e: std::io::Error| UploadError::UnreadableFile {
            name: name.clone(),
            reason: e.to_string(),
        };

        let size = fs::metadata(path).map_err(unreadable)?.len();
        if size > MAX_FILE_BYTES {
            return Err(UploadError::FileTooLarge { size });
        }

        let bytes = fs::read(path).map_err(unreadable)?;

        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());

        Ok(Self::new(name, content_type, bytes))
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

/// Everything a worker needs to run one upload, detached from UI state.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub client: String,
    pub destination: Url,
    pub file: SelectedFile,
}

/// Metadata posted to the ingest endpoint after the file is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub client: String,
    pub url: Url,
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub source: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub client: String,
    pub key: String,
    pub public_url: Url,
}

/// Progress reported from the worker thread back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Progress(u8),
    Stored { key: String },
    Notifying,
    Finished(Result<UploadReceipt, UploadError>),
}
