use crate::upload::{SelectedFile, UploadError, UploadReceipt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Notifying,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { message: String, receipt: UploadReceipt },
    Failure(UploadError),
}

/// The single mutable record behind the window. Only the controller writes it.
#[derive(Debug, Default)]
pub struct UploadState {
    pub status: UploadStatus,
    pub progress: u8,
    pub outcome: Option<Outcome>,
    pub selected_file: Option<SelectedFile>,
}

impl UploadState {
    pub fn is_busy(&self) -> bool {
        matches!(self.status, UploadStatus::Uploading | UploadStatus::Notifying)
    }

    pub fn fail(&mut self, error: UploadError) {
        self.status = UploadStatus::Error;
        self.outcome = Some(Outcome::Failure(error));
    }

    pub fn error(&self) -> Option<&UploadError> {
        match &self.outcome {
            Some(Outcome::Failure(error)) => Some(error),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.outcome {
            Some(Outcome::Success { message, .. }) => Some(message.clone()),
            Some(Outcome::Failure(error)) => Some(error.to_string()),
            None => None,
        }
    }

    pub fn get_progress_fraction(&self) -> f32 {
        f32::from(self.progress.min(100)) / 100.0
    }

    pub fn button_label(&self) -> &'static str {
        match self.status {
            UploadStatus::Uploading => "Uploading...",
            UploadStatus::Notifying => "Notifying...",
            _ => "📤 Upload",
        }
    }
}
