use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::app::views::{
    AlertView, ControlAction, ControlPanel, StageTextures, StageView, StatusView, View,
};
use crate::backend::{HttpMediaBackend, UploadFile};
use crate::config::Settings;
use crate::controller::{Alert, ConsoleState, FileSelection, InputController, RenderTarget};
use crate::error::AppError;
use crate::media::{StreamReader, VideoFrame};

const TITLE: &str = "Vision Console";
const REPAINT_INTERVAL: Duration = Duration::from_millis(33);
const MAX_ALERT_LOG: usize = 50;

struct ActiveStream {
    reader: StreamReader,
    frames: watch::Receiver<Option<VideoFrame>>,
}

pub struct ConsoleApp {
    runtime: Handle,
    controller: InputController,
    stream_client: reqwest::Client,
    alert_rx: mpsc::UnboundedReceiver<Alert>,
    pending_alerts: VecDeque<Alert>,
    alert_log: VecDeque<Alert>,
    stream: Option<ActiveStream>,
    stage_textures: StageTextures,
    path_input: String,
}

impl ConsoleApp {
    pub fn new(
        runtime: Handle,
        controller: InputController,
        alert_rx: mpsc::UnboundedReceiver<Alert>,
        stream_client: reqwest::Client,
    ) -> Self {
        Self {
            runtime,
            controller,
            stream_client,
            alert_rx,
            pending_alerts: VecDeque::new(),
            alert_log: VecDeque::new(),
            stream: None,
            stage_textures: StageTextures::new(),
            path_input: String::new(),
        }
    }

    /// Opens the console window and blocks until it is closed.
    ///
    /// Must be called from within a tokio runtime; backend calls and the
    /// video feed run on that runtime.
    pub fn start_gui(settings: &Settings) -> Result<(), AppError> {
        let runtime = Handle::try_current().map_err(|e| AppError::Ui(e.to_string()))?;
        let backend = Arc::new(HttpMediaBackend::new(settings)?);
        let stream_client = backend.stream_client();
        let (controller, alert_rx) = InputController::new(backend);

        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(egui::vec2(settings.window_width, settings.window_height))
                .with_title(TITLE),
            ..Default::default()
        };

        info!(api_url = %settings.api_url, "Starting {}", TITLE);
        eframe::run_native(
            TITLE,
            options,
            Box::new(move |_cc| {
                Ok(Box::new(ConsoleApp::new(
                    runtime,
                    controller,
                    alert_rx,
                    stream_client,
                )))
            }),
        )
        .map_err(|e| AppError::Ui(e.to_string()))
    }

    fn dispatch(&self, action: ControlAction) {
        match action {
            ControlAction::Stop => {
                self.runtime.spawn(self.controller.stop());
            }
            ControlAction::Webcam => {
                self.runtime.spawn(self.controller.select_webcam());
            }
            ControlAction::Upload(selection) => match self.controller.select_file(selection) {
                Ok(flow) => {
                    self.runtime.spawn(flow);
                }
                Err(e) => warn!("Ignoring file selection: {}", e),
            },
        }
    }

    fn drain_alerts(&mut self) {
        loop {
            match self.alert_rx.try_recv() {
                Ok(alert) => {
                    self.alert_log.push_back(alert.clone());
                    if self.alert_log.len() > MAX_ALERT_LOG {
                        self.alert_log.pop_front();
                    }
                    self.pending_alerts.push_back(alert);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("Alert channel disconnected");
                    break;
                }
            }
        }
    }

    fn dropped_file(ctx: &egui::Context) -> Option<ControlAction> {
        let file = ctx.input(|i| i.raw.dropped_files.first().cloned())?;
        let selection = match (file.path, file.bytes) {
            (Some(path), _) => FileSelection::Path(path),
            (None, Some(bytes)) => FileSelection::Loaded(UploadFile::new(file.name, bytes.to_vec())),
            (None, None) => {
                warn!("Dropped file {} has neither a path nor contents", file.name);
                return None;
            }
        };
        Some(ControlAction::Upload(selection))
    }

    /// Keeps exactly one feed connection open per stream key; a new key
    /// replaces the connection instead of reusing it. No connection is opened
    /// while a webcam switch is still waiting on the backend.
    fn sync_stream(&mut self, state: &ConsoleState, target: &RenderTarget) {
        let wanted = match target {
            RenderTarget::Stream(_) if state.is_feed_settling() => None,
            RenderTarget::Stream(key) => Some(self.controller.video_feed_url(*key)),
            _ => None,
        };
        let current = self.stream.as_ref().map(|stream| stream.reader.url());
        if wanted.as_deref() == current {
            return;
        }

        self.stream = wanted.map(|url| {
            let (frame_tx, frames) = watch::channel(None);
            let reader =
                StreamReader::spawn(&self.runtime, self.stream_client.clone(), url, frame_tx);
            ActiveStream { reader, frames }
        });
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        self.stream
            .as_ref()
            .and_then(|stream| stream.frames.borrow().clone())
    }
}

fn draw_alert_log(ui: &mut egui::Ui, alert_log: &VecDeque<Alert>) {
    if alert_log.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(format!("Alert Log ({})", alert_log.len()))
        .default_open(false)
        .show(ui, |ui| {
            egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                for alert in alert_log.iter().rev() {
                    ui.label(format!(
                        "[{}] {} {}",
                        alert.raised_at.format("%H:%M:%S"),
                        alert.message,
                        alert.detail
                    ));
                }
            });
        });
}

impl eframe::App for ConsoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_alerts();
        let mut action = Self::dropped_file(ctx);

        let state = self.controller.snapshot();
        let target = state.render_target();
        self.sync_stream(&state, &target);
        let status = state.status();
        let frame = self.latest_frame();

        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            StatusView::new(&status).draw(ui);
        });

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(6.0);
            let mut panel = ControlPanel::new(&state, &mut self.path_input);
            panel.draw(ui);
            if let Some(clicked) = panel.take_action() {
                action = Some(clicked);
            }
            draw_alert_log(ui, &self.alert_log);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            StageView::new(&target, frame, &mut self.stage_textures).draw(ui);

            let acknowledged = match self.pending_alerts.front() {
                Some(alert) => {
                    let mut view = AlertView::new(alert);
                    view.draw(ui);
                    view.acknowledged()
                }
                None => false,
            };
            if acknowledged {
                self.pending_alerts.pop_front();
            }
        });

        if let Some(action) = action {
            self.dispatch(action);
        }

        if state.is_busy() || status.pulsing || self.stream.is_some() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}
