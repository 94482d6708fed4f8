use std::path::PathBuf;

use crate::app::views::View;
use crate::controller::{ConsoleState, FileSelection, SourceMode};

#[derive(Debug, Clone)]
pub enum ControlAction {
    Stop,
    Webcam,
    Upload(FileSelection),
}

/// STOP / CAM / FILE bar. CAM and FILE are disabled while an upload runs;
/// STOP never is.
pub struct ControlPanel<'a> {
    state: &'a ConsoleState,
    path_input: &'a mut String,
    action: Option<ControlAction>,
}

impl<'a> ControlPanel<'a> {
    pub fn new(state: &'a ConsoleState, path_input: &'a mut String) -> Self {
        Self {
            state,
            path_input,
            action: None,
        }
    }

    pub fn take_action(self) -> Option<ControlAction> {
        self.action
    }
}

impl View for ControlPanel<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        let mode = self.state.mode();
        let busy = self.state.is_busy();

        ui.horizontal(|ui| {
            let stop = egui::Button::new("STOP").selected(mode == SourceMode::Idle);
            if ui.add(stop).clicked() {
                self.action = Some(ControlAction::Stop);
            }

            ui.separator();

            let cam = egui::Button::new("CAM").selected(mode == SourceMode::Webcam);
            if ui.add_enabled(!busy, cam).clicked() {
                self.action = Some(ControlAction::Webcam);
            }

            ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(&mut *self.path_input)
                    .hint_text("Image or video path (or drop a file)")
                    .desired_width(320.0),
            );

            let path = self.path_input.trim();
            let file = egui::Button::new("FILE").selected(mode == SourceMode::Upload);
            if ui.add_enabled(!busy && !path.is_empty(), file).clicked() {
                self.action = Some(ControlAction::Upload(FileSelection::Path(PathBuf::from(
                    path,
                ))));
            }
        });
    }
}
