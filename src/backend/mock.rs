use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{MediaBackend, MediaKind, UploadFile};
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    StopCamera,
    SetWebcam,
    Upload(String),
    ProcessedImage,
}

/// Scripted backend that records every call it receives.
#[derive(Default)]
pub struct MockMediaBackend {
    uploads: Mutex<VecDeque<Result<MediaKind, BackendError>>>,
    processed_images: Mutex<VecDeque<Result<Option<String>, BackendError>>>,
    fail_commands: AtomicBool,
    upload_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl MockMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload(self, result: Result<MediaKind, BackendError>) -> Self {
        self.uploads.lock().unwrap().push_back(result);
        self
    }

    pub fn with_processed_image(self, result: Result<Option<String>, BackendError>) -> Self {
        self.processed_images.lock().unwrap().push_back(result);
        self
    }

    pub fn with_failing_commands(self) -> Self {
        self.fail_commands.store(true, Ordering::SeqCst);
        self
    }

    /// Uploads block until the gate is notified.
    pub fn with_upload_gate(mut self, gate: Arc<Notify>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &BackendCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn command_result(&self, endpoint: &'static str) -> Result<(), BackendError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            Err(network_error(endpoint))
        } else {
            Ok(())
        }
    }
}

pub fn network_error(endpoint: &'static str) -> BackendError {
    BackendError::Request {
        endpoint,
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl MediaBackend for MockMediaBackend {
    async fn stop_camera(&self) -> Result<(), BackendError> {
        self.record(BackendCall::StopCamera);
        self.command_result(super::STOP_CAMERA)
    }

    async fn set_webcam(&self) -> Result<(), BackendError> {
        self.record(BackendCall::SetWebcam);
        self.command_result(super::SET_WEBCAM)
    }

    async fn upload(&self, file: UploadFile) -> Result<MediaKind, BackendError> {
        self.record(BackendCall::Upload(file.file_name));
        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(MediaKind::Other("video".to_string())))
    }

    async fn processed_image(&self) -> Result<Option<String>, BackendError> {
        self.record(BackendCall::ProcessedImage);
        self.processed_images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    fn video_feed_url(&self, cache_buster: u64) -> String {
        format!("http://mock{}?t={}", super::VIDEO_FEED, cache_buster)
    }
}
