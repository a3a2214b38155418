mod controller;
mod state;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use eframe::{egui, App};

use crate::config::UploaderConfig;
use crate::upload::{SelectedFile, SupabaseStorage, UploadError, WebhookClient};
use controller::UploadController;

pub struct SheetUploader {
    controller: UploadController,
}

impl SheetUploader {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: UploaderConfig) -> Self {
        tracing::info!(
            storage = %config.storage_url,
            bucket = %config.bucket,
            clients = config.clients.len(),
            "initializing uploader"
        );
        let store = SupabaseStorage::new(
            config.storage_url.clone(),
            config.bucket.clone(),
            config.storage_key.clone(),
        );
        Self {
            controller: UploadController::new(&config, Arc::new(store), Arc::new(WebhookClient::new())),
        }
    }

    fn take_dropped_file(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        let Some(dropped) = dropped else {
            return;
        };

        let file = match (&dropped.bytes, &dropped.path) {
            (Some(bytes), _) => {
                let content_type = mime_guess::from_path(&dropped.name)
                    .first()
                    .map(|m| m.essence_str().to_string());
                Ok(SelectedFile::new(dropped.name.clone(), content_type, bytes.to_vec()))
            }
            (None, Some(path)) => SelectedFile::from_path(path),
            (None, None) => Err(UploadError::UnreadableFile {
                name: dropped.name.clone(),
                reason: "dropped item has no content".to_string(),
            }),
        };

        match file {
            Ok(file) => self.controller.select_file(file),
            Err(e) => self.controller.reject_file(e),
        }
    }
}

impl App for SheetUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.controller.poll_events() {
            ctx.request_repaint();
        }
        self.take_dropped_file(ctx);
        self.render(ctx);

        if self.controller.state().is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
