pub mod alert_view;
pub mod control_panel;
pub mod stage_view;
pub mod status_view;

pub use alert_view::AlertView;
pub use control_panel::{ControlAction, ControlPanel};
pub use stage_view::{StageTextures, StageView};
pub use status_view::StatusView;

pub trait View {
    fn draw(&mut self, ui: &mut egui::Ui);
}
