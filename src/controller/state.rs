use std::fmt;

use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Idle,
    Webcam,
    Upload,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Idle => "idle",
            SourceMode::Webcam => "webcam",
            SourceMode::Upload => "upload",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an upload turned into once the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Pending,
    Image(String),
    Stream,
}

/// Outcome of a finished upload flow, as reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Classified as an image; carries the processed payload if the backend had one.
    Image(Option<String>),
    /// Classified as anything else; served through the video feed.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Idle,
    Webcam,
    Upload(UploadResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamKey {
    pub cache_buster: u64,
}

/// What the stage should show for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    Loading,
    Idle,
    Stream(StreamKey),
    Image(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    pub color: StatusColor,
    pub pulsing: bool,
    pub text: String,
}

/// Single source of truth for the console.
///
/// The busy flag is derived from the in-flight upload id, so it can never
/// disagree with the upload that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleState {
    source: Source,
    cache_buster: u64,
    active_upload: Option<Uuid>,
    // Webcam switches sent to the backend and not yet answered.
    webcam_requests: u32,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleState {
    pub fn new() -> Self {
        Self {
            source: Source::Idle,
            cache_buster: 0,
            active_upload: None,
            webcam_requests: 0,
        }
    }

    pub fn mode(&self) -> SourceMode {
        match self.source {
            Source::Idle => SourceMode::Idle,
            Source::Webcam => SourceMode::Webcam,
            Source::Upload(_) => SourceMode::Upload,
        }
    }

    pub fn upload_result(&self) -> Option<&UploadResult> {
        match &self.source {
            Source::Upload(result) => Some(result),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match &self.source {
            Source::Upload(UploadResult::Image(payload)) => Some(payload),
            _ => None,
        }
    }

    pub fn cache_buster(&self) -> u64 {
        self.cache_buster
    }

    pub fn is_busy(&self) -> bool {
        self.active_upload.is_some()
    }

    pub fn active_upload(&self) -> Option<Uuid> {
        self.active_upload
    }

    pub fn is_current_upload(&self, upload_id: Uuid) -> bool {
        self.active_upload == Some(upload_id)
    }

    /// Goes idle and drops the payload. Any in-flight upload is abandoned.
    pub fn stop(&mut self) -> Option<Uuid> {
        self.source = Source::Idle;
        self.active_upload.take()
    }

    /// Switches to the webcam. The cache-buster is bumped by
    /// [`ConsoleState::settle_webcam`], once the backend has answered.
    pub fn enter_webcam(&mut self) -> Option<Uuid> {
        self.source = Source::Webcam;
        self.webcam_requests += 1;
        self.active_upload.take()
    }

    /// Records the backend's answer to a webcam switch. Returns the new
    /// cache-buster when the switch was acknowledged.
    pub fn settle_webcam(&mut self, acknowledged: bool) -> Option<u64> {
        self.webcam_requests = self.webcam_requests.saturating_sub(1);
        if !acknowledged {
            return None;
        }
        self.cache_buster += 1;
        Some(self.cache_buster)
    }

    /// True while the webcam feed still carries the pre-switch cache-buster.
    pub fn is_feed_settling(&self) -> bool {
        self.source == Source::Webcam && self.webcam_requests > 0
    }

    pub fn begin_upload(&mut self, upload_id: Uuid) -> Result<(), AppError> {
        if let Some(in_flight) = self.active_upload {
            return Err(AppError::UploadInFlight(in_flight));
        }
        self.source = Source::Upload(UploadResult::Pending);
        self.active_upload = Some(upload_id);
        Ok(())
    }

    /// Applies the result of an upload flow. Returns false when the flow is stale.
    pub fn complete_upload(&mut self, upload_id: Uuid, outcome: UploadOutcome) -> bool {
        if !self.is_current_upload(upload_id) {
            return false;
        }
        self.source = match outcome {
            UploadOutcome::Image(Some(payload)) => Source::Upload(UploadResult::Image(payload)),
            // No payload to show: fall back to whatever the feed serves.
            UploadOutcome::Image(None) => Source::Upload(UploadResult::Stream),
            UploadOutcome::Stream => {
                self.cache_buster += 1;
                Source::Upload(UploadResult::Stream)
            }
        };
        true
    }

    /// Clears the busy flag if `upload_id` still owns it.
    pub fn settle_upload(&mut self, upload_id: Uuid) -> bool {
        if !self.is_current_upload(upload_id) {
            return false;
        }
        self.active_upload = None;
        if self.source == Source::Upload(UploadResult::Pending) {
            self.source = Source::Upload(UploadResult::Stream);
        }
        true
    }

    pub fn render_target(&self) -> RenderTarget {
        if self.is_busy() {
            return RenderTarget::Loading;
        }
        let stream = RenderTarget::Stream(StreamKey {
            cache_buster: self.cache_buster,
        });
        match &self.source {
            Source::Idle => RenderTarget::Idle,
            Source::Webcam => stream,
            Source::Upload(UploadResult::Image(payload)) => RenderTarget::Image(payload.clone()),
            Source::Upload(_) => stream,
        }
    }

    pub fn status(&self) -> StatusIndicator {
        let busy = self.is_busy();
        let mode = self.mode();
        let live = mode != SourceMode::Idle && !busy;
        let text = if busy {
            "PROCESSING...".to_string()
        } else if mode == SourceMode::Idle {
            "SYSTEM IDLE".to_string()
        } else {
            format!("SOURCE: {}", mode)
        };

        StatusIndicator {
            color: if live {
                StatusColor::Green
            } else {
                StatusColor::Red
            },
            pulsing: live,
            text,
        }
    }
}
