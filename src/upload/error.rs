use thiserror::Error;

use super::validation::MAX_FILE_MIB;

pub const DUPLICATE_NAME_MESSAGE: &str =
    "A file with this name already exists in storage. Please retry the upload.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Network/DNS failure reaching the notification endpoint. Check the webhook address and your connection.";
pub const GENERIC_STORAGE_MESSAGE: &str = "Storage upload failed";
pub const GENERIC_FAILURE_MESSAGE: &str = "Upload failed";

/// Everything that can end an upload attempt. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File is larger than the {} MB limit", MAX_FILE_MIB)]
    FileTooLarge { size: u64 },

    #[error("Unsupported file type: use .xlsx or .csv")]
    UnsupportedType { name: String },

    #[error("Could not read {name}: {reason}")]
    UnreadableFile { name: String, reason: String },

    #[error("Invalid destination for client {client}: {reason}")]
    InvalidDestination { client: String, reason: String },

    #[error("{}", DUPLICATE_NAME_MESSAGE)]
    DuplicateName,

    #[error("{}", .0.as_deref().unwrap_or(GENERIC_STORAGE_MESSAGE))]
    StorageUploadFailed(Option<String>),

    #[error("Could not resolve a public URL for the stored file")]
    StorageUrlResolutionFailed,

    #[error("Notification endpoint responded with HTTP {0}")]
    NotificationHttpError(u16),

    #[error("{}", NETWORK_FAILURE_MESSAGE)]
    NotificationNetworkFailure,

    #[error("{}", .0.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    NotificationUnknownFailure(Option<String>),
}

/// Failure reported by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StorageError {
    pub status: Option<u16>,
    pub message: String,
}

impl StorageError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        if self.status == Some(409) {
            return true;
        }
        let text = self.message.to_lowercase();
        text.contains("duplicate") || text.contains("already exists")
    }
}

/// Failure reported by the ingest endpoint client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("HTTP {0}")]
    Http(u16),
    #[error("connection failure: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        if err.is_duplicate() {
            return UploadError::DuplicateName;
        }
        let message = err.message.trim();
        if message.is_empty() {
            UploadError::StorageUploadFailed(None)
        } else {
            UploadError::StorageUploadFailed(Some(message.to_string()))
        }
    }
}

impl From<NotifyError> for UploadError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::Http(status) => UploadError::NotificationHttpError(status),
            NotifyError::Network(_) => UploadError::NotificationNetworkFailure,
            NotifyError::Other(message) if message.trim().is_empty() => {
                UploadError::NotificationUnknownFailure(None)
            }
            NotifyError::Other(message) => UploadError::NotificationUnknownFailure(Some(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_text_maps_to_fixed_message() {
        let err = StorageError::new(Some(400), "Duplicate: The resource already exists");
        let mapped = UploadError::from(err);
        assert_eq!(mapped, UploadError::DuplicateName);
        assert_eq!(mapped.to_string(), DUPLICATE_NAME_MESSAGE);
        assert!(!mapped.to_string().contains("resource"));
    }

    #[test]
    fn conflict_status_counts_as_duplicate() {
        assert!(StorageError::new(Some(409), "conflict").is_duplicate());
        assert!(!StorageError::new(Some(403), "row-level security").is_duplicate());
    }

    #[test]
    fn storage_message_is_surfaced_or_defaulted() {
        let mapped = UploadError::from(StorageError::new(Some(403), "Invalid JWT"));
        assert_eq!(mapped.to_string(), "Invalid JWT");

        let mapped = UploadError::from(StorageError::new(None, "  "));
        assert_eq!(mapped.to_string(), GENERIC_STORAGE_MESSAGE);
    }

    #[test]
    fn notification_errors_are_classified() {
        let http = UploadError::from(NotifyError::Http(500));
        assert!(http.to_string().contains("500"));

        let network = UploadError::from(NotifyError::Network("tcp connect error: refused".into()));
        assert_eq!(network.to_string(), NETWORK_FAILURE_MESSAGE);
        assert!(!network.to_string().contains("refused"));

        let other = UploadError::from(NotifyError::Other(String::new()));
        assert_eq!(other.to_string(), GENERIC_FAILURE_MESSAGE);

        let other = UploadError::from(NotifyError::Other("body write aborted".into()));
        assert_eq!(other.to_string(), "body write aborted");
    }

    #[test]
    fn size_limit_is_in_message() {
        let err = UploadError::FileTooLarge { size: 60 * 1024 * 1024 };
        assert!(err.to_string().contains("50 MB"));
    }
}
