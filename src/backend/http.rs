use async_trait::async_trait;
use reqwest::multipart;
use tracing::{debug, info, instrument, warn};

use super::{
    MediaBackend, MediaKind, PROCESSED_IMAGE, ProcessedImageResponse, SET_WEBCAM, STOP_CAMERA,
    UPLOAD, UploadFile, UploadResponse, VIDEO_FEED,
};
use crate::config::Settings;
use crate::error::BackendError;

pub struct HttpMediaBackend {
    client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
}

impl HttpMediaBackend {
    pub fn new(settings: &Settings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;
        // The video feed never finishes, so only the connect phase is bounded.
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.request_timeout())
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            client,
            stream_client,
            base_url: settings.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stream_client(&self) -> reqwest::Client {
        self.stream_client.clone()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post_command(&self, endpoint: &'static str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .send()
            .await
            .map_err(|e| BackendError::Request {
                endpoint,
                reason: e.to_string(),
            })?;

        // Any answer counts; the status is informational only.
        let status = response.status();
        if status.is_success() {
            debug!(%status, "{} acknowledged", endpoint);
        } else {
            warn!(%status, "{} answered with an error status", endpoint);
        }
        Ok(())
    }
}

/// Parses a JSON body regardless of the HTTP status. Only a body that is not
/// the expected JSON is an error.
async fn read_json<T: serde::de::DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        warn!(%status, "{} answered with an error status", endpoint);
    }
    response
        .json()
        .await
        .map_err(|e| BackendError::MalformedBody {
            endpoint,
            reason: e.to_string(),
        })
}

#[async_trait]
impl MediaBackend for HttpMediaBackend {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn stop_camera(&self) -> Result<(), BackendError> {
        self.post_command(STOP_CAMERA).await
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn set_webcam(&self) -> Result<(), BackendError> {
        self.post_command(SET_WEBCAM).await
    }

    #[instrument(skip(self, file), fields(file_name = %file.file_name, bytes = file.bytes.len()))]
    async fn upload(&self, file: UploadFile) -> Result<MediaKind, BackendError> {
        let mime = file.mime_type();
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(mime)
            .map_err(|e| BackendError::Form(format!("mime: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(UPLOAD))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Request {
                endpoint: UPLOAD,
                reason: e.to_string(),
            })?;

        let body: UploadResponse = read_json(UPLOAD, response).await?;

        let kind = body.media_kind();
        info!(?kind, "Upload classified");
        Ok(kind)
    }

    #[instrument(skip(self))]
    async fn processed_image(&self) -> Result<Option<String>, BackendError> {
        let response = self
            .client
            .get(self.url(PROCESSED_IMAGE))
            .send()
            .await
            .map_err(|e| BackendError::Request {
                endpoint: PROCESSED_IMAGE,
                reason: e.to_string(),
            })?;

        let body: ProcessedImageResponse = read_json(PROCESSED_IMAGE, response).await?;

        let payload = body.into_payload();
        debug!(present = payload.is_some(), "Processed image fetched");
        Ok(payload)
    }

    fn video_feed_url(&self, cache_buster: u64) -> String {
        format!("{}?t={}", self.url(VIDEO_FEED), cache_buster)
    }
}
