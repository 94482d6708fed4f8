use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::state::{ConsoleState, StreamKey, UploadOutcome};
use crate::backend::{MediaBackend, MediaKind, UploadFile};
use crate::error::AppError;

pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed or backend offline.";

/// A notification the user has to acknowledge.
#[derive(Debug, Clone)]
pub struct Alert {
    pub message: String,
    pub detail: String,
    pub raised_at: DateTime<Local>,
}

impl Alert {
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: detail.into(),
            raised_at: Local::now(),
        }
    }
}

/// A file picked by the user, either by path or already in memory (drag and drop).
#[derive(Debug, Clone)]
pub enum FileSelection {
    Path(PathBuf),
    Loaded(UploadFile),
}

impl FileSelection {
    pub fn describe(&self) -> String {
        match self {
            FileSelection::Path(path) => path.display().to_string(),
            FileSelection::Loaded(file) => file.file_name.clone(),
        }
    }

    async fn load(self) -> Result<UploadFile, AppError> {
        match self {
            FileSelection::Path(path) => UploadFile::from_path(&path).await,
            FileSelection::Loaded(file) => Ok(file),
        }
    }
}

struct Shared {
    state: ConsoleState,
    upload_cancel: Option<CancellationToken>,
}

impl Shared {
    fn cancel_upload(&mut self) {
        if let Some(token) = self.upload_cancel.take() {
            token.cancel();
        }
    }
}

/// Runs source transitions against the media backend.
///
/// State changes are applied before the backend is contacted and are never
/// rolled back; only a failed upload flow forces the console back to idle.
#[derive(Clone)]
pub struct InputController {
    backend: Arc<dyn MediaBackend>,
    shared: Arc<Mutex<Shared>>,
    alert_tx: mpsc::UnboundedSender<Alert>,
}

impl InputController {
    pub fn new(backend: Arc<dyn MediaBackend>) -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (alert_tx, alert_rx) = mpsc::unbounded_channel();
        (
            Self {
                backend,
                shared: Arc::new(Mutex::new(Shared {
                    state: ConsoleState::new(),
                    upload_cancel: None,
                })),
                alert_tx,
            },
            alert_rx,
        )
    }

    pub fn snapshot(&self) -> ConsoleState {
        self.lock().state.clone()
    }

    pub fn video_feed_url(&self, key: StreamKey) -> String {
        self.backend.video_feed_url(key.cache_buster)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // State is replaced wholesale by each transition, so a poisoned lock is still consistent.
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Goes idle. The transition is applied immediately; the returned future
    /// only notifies the backend.
    pub fn stop(&self) -> impl Future<Output = ()> + Send + 'static {
        let abandoned = {
            let mut shared = self.lock();
            shared.cancel_upload();
            shared.state.stop()
        };
        if let Some(upload_id) = abandoned {
            info!(%upload_id, "In-flight upload cancelled by stop");
        }
        info!("Source set to idle");

        let backend = self.backend.clone();
        async move {
            if let Err(e) = backend.stop_camera().await {
                warn!("Failed to stop camera: {}", e);
            }
        }
    }

    /// Switches to the webcam. The cache-buster is bumped once the backend
    /// has acknowledged the switch.
    pub fn select_webcam(&self) -> impl Future<Output = ()> + Send + 'static {
        let abandoned = {
            let mut shared = self.lock();
            shared.cancel_upload();
            shared.state.enter_webcam()
        };
        if let Some(upload_id) = abandoned {
            info!(%upload_id, "In-flight upload cancelled by webcam selection");
        }

        let this = self.clone();
        async move {
            match this.backend.set_webcam().await {
                Ok(()) => {
                    if let Some(cache_buster) = this.lock().state.settle_webcam(true) {
                        info!(cache_buster, "Webcam stream requested");
                    }
                }
                Err(e) => {
                    this.lock().state.settle_webcam(false);
                    warn!("Failed to switch backend to webcam: {}", e);
                }
            }
        }
    }

    /// Starts an upload and returns the flow that drives it to completion.
    ///
    /// Fails with `AppError::UploadInFlight` without touching state if another
    /// upload is still running. Backend failures inside the flow are reported
    /// through an [`Alert`].
    pub fn select_file(
        &self,
        selection: FileSelection,
    ) -> Result<impl Future<Output = ()> + Send + 'static, AppError> {
        let upload_id = Uuid::new_v4();
        let token = CancellationToken::new();
        {
            let mut shared = self.lock();
            shared.state.begin_upload(upload_id)?;
            shared.upload_cancel = Some(token.clone());
        }
        info!(%upload_id, file = %selection.describe(), "Upload started");

        let this = self.clone();
        Ok(async move { this.drive_upload(upload_id, token, selection).await })
    }

    async fn drive_upload(
        &self,
        upload_id: Uuid,
        token: CancellationToken,
        selection: FileSelection,
    ) {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.run_upload_flow(selection) => Some(result),
        };

        match result {
            None => {
                debug!(%upload_id, "Upload flow abandoned");
            }
            Some(Ok(outcome)) => {
                if self.lock().state.complete_upload(upload_id, outcome) {
                    info!(%upload_id, "Upload finished");
                } else {
                    debug!(%upload_id, "Discarding stale upload result");
                }
            }
            Some(Err(e)) => {
                error!(%upload_id, "Upload failed: {}", e);
                let is_current = self.lock().state.is_current_upload(upload_id);
                if is_current {
                    self.raise_alert(UPLOAD_FAILED_MESSAGE, e.to_string());
                    self.stop().await;
                }
            }
        }

        self.finish_upload(upload_id);
    }

    async fn run_upload_flow(&self, selection: FileSelection) -> Result<UploadOutcome, AppError> {
        let file = selection.load().await?;
        match self.backend.upload(file).await? {
            MediaKind::Image => {
                let payload = self.backend.processed_image().await?;
                if payload.is_none() {
                    warn!("Backend classified the upload as an image but returned no result");
                }
                Ok(UploadOutcome::Image(payload))
            }
            MediaKind::Other(kind) => {
                debug!(kind = %kind, "Upload will be served as a stream");
                Ok(UploadOutcome::Stream)
            }
        }
    }

    fn finish_upload(&self, upload_id: Uuid) {
        let mut shared = self.lock();
        if shared.state.settle_upload(upload_id) {
            shared.upload_cancel = None;
        }
    }

    fn raise_alert(&self, message: &str, detail: String) {
        if self.alert_tx.send(Alert::new(message, detail)).is_err() {
            warn!("Alert receiver dropped; alert not shown: {}", message);
        }
    }
}
