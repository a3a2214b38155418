use async_trait::async_trait;
use reqwest::multipart::Form;
use url::Url;

use super::error::NotifyError;
use super::types::Notification;

pub const SOURCE_TAG: &str = "sheet-uploader";

/// The automation webhook told about each stored file.
#[async_trait]
pub trait IngestEndpoint: Send + Sync {
    async fn notify(&self, destination: &Url, notification: &Notification)
        -> Result<(), NotifyError>;
}

#[derive(Clone, Default)]
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self::default()
    }
}

fn form_for(notification: &Notification) -> Form {
    Form::new()
        .text("client", notification.client.clone())
        .text("url", notification.url.to_string())
        .text("filename", notification.filename.clone())
        .text("mimetype", notification.mimetype.clone())
        .text("size", notification.size.to_string())
        .text("source", notification.source)
}

#[async_trait]
impl IngestEndpoint for WebhookClient {
    async fn notify(
        &self,
        destination: &Url,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(destination.clone())
            .multipart(form_for(notification))
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Http(status.as_u16()))
        }
    }
}

fn classify_send_error(err: reqwest::Error) -> NotifyError {
    if err.is_connect() {
        NotifyError::Network(err.to_string())
    } else {
        NotifyError::Other(err.to_string())
    }
}
