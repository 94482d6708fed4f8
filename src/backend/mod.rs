mod http;
#[cfg(test)]
pub(crate) mod loopback;
#[cfg(test)]
pub(crate) mod mock;
mod types;

pub use http::HttpMediaBackend;
pub use types::{MediaKind, ProcessedImageResponse, UploadFile, UploadResponse};

use async_trait::async_trait;

use crate::error::BackendError;

pub const STOP_CAMERA: &str = "/stop_camera";
pub const SET_WEBCAM: &str = "/set_webcam";
pub const UPLOAD: &str = "/upload";
pub const PROCESSED_IMAGE: &str = "/processed_image";
pub const VIDEO_FEED: &str = "/video_feed";

/// The remote detection service the console drives.
///
/// Command calls (`stop_camera`, `set_webcam`) are best-effort from the
/// controller's point of view; `upload` and `processed_image` failures abort
/// the upload flow.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn stop_camera(&self) -> Result<(), BackendError>;

    async fn set_webcam(&self) -> Result<(), BackendError>;

    /// Sends the file as multipart field `file` and returns the backend's classification.
    async fn upload(&self, file: UploadFile) -> Result<MediaKind, BackendError>;

    /// Returns the processed still image, or `None` when the backend has none.
    async fn processed_image(&self) -> Result<Option<String>, BackendError>;

    /// URL of the live stream, keyed by the cache-buster.
    fn video_feed_url(&self, cache_buster: u64) -> String;
}
