mod destination;
mod error;
mod notify;
mod progress;
mod storage;
mod types;
mod validation;
mod workflow;

pub use destination::{parse_endpoint, resolve_destination, ClientProfile};
pub use error::UploadError;
pub use notify::{IngestEndpoint, WebhookClient};
pub use progress::{INITIAL_PROGRESS, STORED_CHECKPOINT, TICK_CAP};
pub use storage::{BlobStore, SupabaseStorage};
pub use types::{SelectedFile, UploadJob, UploadReceipt, WorkflowEvent};
pub use validation::validate_file;
pub use workflow::execute;

#[cfg(test)]
pub(crate) use workflow::fakes;
#[cfg(test)]
pub(crate) use error::{NotifyError, StorageError, DUPLICATE_NAME_MESSAGE, NETWORK_FAILURE_MESSAGE};
