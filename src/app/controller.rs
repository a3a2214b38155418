use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use url::Url;

use super::state::{Outcome, UploadState, UploadStatus};
use crate::config::UploaderConfig;
use crate::upload::{
    self, resolve_destination, validate_file, BlobStore, ClientProfile, IngestEndpoint,
    SelectedFile, UploadError, UploadJob, WorkflowEvent, INITIAL_PROGRESS, STORED_CHECKPOINT,
    TICK_CAP,
};

/// Drives one upload at a time and owns everything the window displays.
pub struct UploadController {
    clients: Vec<ClientProfile>,
    default_webhook: Url,
    store: Arc<dyn BlobStore>,
    ingest: Arc<dyn IngestEndpoint>,
    state: UploadState,
    active_client: usize,
    destination: Result<Url, UploadError>,
    events: Option<Receiver<WorkflowEvent>>,
}

impl UploadController {
    pub fn new(
        config: &UploaderConfig,
        store: Arc<dyn BlobStore>,
        ingest: Arc<dyn IngestEndpoint>,
    ) -> Self {
        let clients = if config.clients.is_empty() {
            vec![ClientProfile::new("default", "Default")]
        } else {
            config.clients.clone()
        };
        let destination = resolve_destination(&clients[0], &config.default_webhook);

        let mut controller = Self {
            clients,
            default_webhook: config.default_webhook.clone(),
            store,
            ingest,
            state: UploadState::default(),
            active_client: 0,
            destination,
            events: None,
        };
        if let Err(e) = &controller.destination {
            controller.state.fail(e.clone());
        }
        controller
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn clients(&self) -> &[ClientProfile] {
        &self.clients
    }

    pub fn active_client(&self) -> &ClientProfile {
        &self.clients[self.active_client]
    }

    pub fn destination(&self) -> &Result<Url, UploadError> {
        &self.destination
    }

    pub fn can_upload(&self) -> bool {
        self.state.selected_file.is_some() && self.destination.is_ok() && !self.state.is_busy()
    }

    /// Validates a picked or dropped file. A rejected file leaves any earlier selection in place.
    pub fn select_file(&mut self, file: SelectedFile) {
        if self.state.is_busy() {
            tracing::warn!(file = %file.name, "ignoring file selection while an upload is running");
            return;
        }

        match validate_file(&file) {
            Ok(()) => {
                tracing::info!(file = %file.name, size = file.size, "file selected");
                self.state.selected_file = Some(file);
                self.state.status = UploadStatus::Idle;
                self.state.progress = 0;
                self.state.outcome = None;
            }
            Err(e) => self.reject_file(e),
        }
    }

    /// Surfaces a file that never made it to validation (e.g. unreadable from disk).
    pub fn reject_file(&mut self, error: UploadError) {
        if self.state.is_busy() {
            return;
        }
        tracing::info!(error = %error, "file rejected");
        self.state.fail(error);
    }

    pub fn select_destination(&mut self, client_id: &str) {
        if self.state.is_busy() {
            tracing::warn!(client = client_id, "ignoring client change while an upload is running");
            return;
        }
        let Some(index) = self.clients.iter().position(|c| c.id == client_id) else {
            tracing::warn!(client = client_id, "unknown client");
            return;
        };

        self.active_client = index;
        self.destination = resolve_destination(&self.clients[index], &self.default_webhook);

        match &self.destination {
            Ok(url) => {
                tracing::info!(client = client_id, destination = %url, "destination selected");
                if matches!(self.state.error(), Some(UploadError::InvalidDestination { .. })) {
                    self.state.status = UploadStatus::Idle;
                    self.state.outcome = None;
                }
            }
            Err(e) => {
                tracing::warn!(client = client_id, error = %e, "destination invalid");
                self.state.fail(e.clone());
            }
        }
    }

    /// Starts the store-then-notify workflow on a worker thread.
    pub fn upload(&mut self) {
        if self.state.is_busy() {
            tracing::warn!("upload already in progress");
            return;
        }
        let Some(file) = self.state.selected_file.clone() else {
            tracing::warn!("upload requested without a selected file");
            return;
        };
        let destination = match &self.destination {
            Ok(url) => url.clone(),
            Err(e) => {
                self.state.fail(e.clone());
                return;
            }
        };

        let job = UploadJob {
            client: self.active_client().id.clone(),
            destination,
            file,
        };

        self.state.status = UploadStatus::Uploading;
        self.state.progress = INITIAL_PROGRESS;
        self.state.outcome = None;

        let (sender, receiver) = mpsc::channel();
        self.events = Some(receiver);

        let store = Arc::clone(&self.store);
        let ingest = Arc::clone(&self.ingest);

        thread::spawn(move || {
            let result = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(upload::execute(
                    &job,
                    store.as_ref(),
                    ingest.as_ref(),
                    &sender,
                )),
                Err(e) => {
                    tracing::error!(error = %e, "failed to start upload runtime");
                    Err(UploadError::NotificationUnknownFailure(Some(format!(
                        "Could not start the upload worker: {}",
                        e
                    ))))
                }
            };
            let _ = sender.send(WorkflowEvent::Finished(result));
        });
    }

    /// Applies whatever the worker has reported since the last frame. Returns true on change.
    pub fn poll_events(&mut self) -> bool {
        let mut changed = false;

        while let Some(receiver) = &self.events {
            match receiver.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.events = None;
                    if self.state.is_busy() {
                        tracing::error!("upload worker stopped without reporting a result");
                        self.state.fail(UploadError::NotificationUnknownFailure(None));
                        changed = true;
                    }
                }
            }
        }

        changed
    }

    fn apply_event(&mut self, event: WorkflowEvent) {
        match event {
            WorkflowEvent::Progress(value) => {
                if self.state.status == UploadStatus::Uploading {
                    self.state.progress = self.state.progress.max(value.min(TICK_CAP));
                }
            }
            WorkflowEvent::Stored { key } => {
                tracing::debug!(%key, "storage confirmed");
                self.state.progress = self.state.progress.max(STORED_CHECKPOINT);
            }
            WorkflowEvent::Notifying => {
                self.state.status = UploadStatus::Notifying;
            }
            WorkflowEvent::Finished(Ok(receipt)) => {
                self.events = None;
                tracing::info!(
                    client = %receipt.client,
                    key = %receipt.key,
                    url = %receipt.public_url,
                    "upload complete"
                );
                self.state.progress = 100;
                self.state.status = UploadStatus::Success;
                self.state.selected_file = None;
                self.state.outcome = Some(Outcome::Success {
                    message: format!(
                        "✅ Uploaded and notified for client {}",
                        receipt.client.to_uppercase()
                    ),
                    receipt,
                });
            }
            WorkflowEvent::Finished(Err(e)) => {
                self.events = None;
                tracing::warn!(error = %e, "upload failed");
                self.state.fail(e);
            }
        }
    }

    #[cfg(test)]
    fn wait_until_settled(&mut self) {
        use std::time::Duration;

        while let Some(receiver) = &self.events {
            match receiver.recv_timeout(Duration::from_secs(5)) {
                Ok(event) => self.apply_event(event),
                Err(e) => panic!("worker did not finish: {e}"),
            }
        }
    }
}
