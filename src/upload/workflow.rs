use std::sync::mpsc::Sender;

use super::error::UploadError;
use super::notify::{IngestEndpoint, SOURCE_TAG};
use super::progress::{ProgressTicker, INITIAL_PROGRESS};
use super::storage::{storage_key, BlobStore};
use super::types::{Notification, UploadJob, UploadReceipt, WorkflowEvent};

/// Stores the file, resolves its public URL, then notifies the destination.
///
/// The notification is only sent once storage succeeded and a URL exists.
pub async fn execute(
    job: &UploadJob,
    store: &dyn BlobStore,
    ingest: &dyn IngestEndpoint,
    events: &Sender<WorkflowEvent>,
) -> Result<UploadReceipt, UploadError> {
    let key = storage_key(&job.client, &job.file.name);
    let content_type = job.file.content_type_or_default();
    tracing::info!(client = %job.client, %key, size = job.file.size, "storing file");

    let stored = {
        let _ticker = ProgressTicker::start(INITIAL_PROGRESS, events.clone());
        store.put(&key, &job.file.bytes, content_type, false).await
    };
    if let Err(e) = stored {
        tracing::warn!(%key, status = ?e.status, error = %e, "storage upload failed");
        return Err(e.into());
    }
    let _ = events.send(WorkflowEvent::Stored { key: key.clone() });

    let public_url = store.public_url_for(&key).map_err(|e| {
        tracing::warn!(%key, error = %e, "public URL resolution failed");
        UploadError::StorageUrlResolutionFailed
    })?;

    let _ = events.send(WorkflowEvent::Notifying);
    let notification = Notification {
        client: job.client.clone(),
        url: public_url.clone(),
        filename: job.file.name.clone(),
        mimetype: content_type.to_string(),
        size: job.file.size,
        source: SOURCE_TAG,
    };

    if let Err(e) = ingest.notify(&job.destination, &notification).await {
        // The object stays in the bucket; nothing reconciles it.
        tracing::warn!(
            %key,
            destination = %job.destination,
            error = %e,
            "notification failed, stored object left in place"
        );
        return Err(e.into());
    }

    tracing::info!(client = %job.client, %key, "upload notified");
    Ok(UploadReceipt {
        client: job.client.clone(),
        key,
        public_url,
    })
}
