use egui::Color32;

use crate::app::views::View;
use crate::controller::{StatusColor, StatusIndicator};

const LIVE: Color32 = Color32::from_rgb(34, 197, 94);
const HALTED: Color32 = Color32::from_rgb(239, 68, 68);

pub struct StatusView<'a> {
    indicator: &'a StatusIndicator,
}

impl<'a> StatusView<'a> {
    pub fn new(indicator: &'a StatusIndicator) -> Self {
        Self { indicator }
    }

    fn dot_color(&self, time: f64) -> Color32 {
        let base = match self.indicator.color {
            StatusColor::Green => LIVE,
            StatusColor::Red => HALTED,
        };
        if self.indicator.pulsing {
            base.gamma_multiply(0.6 + 0.4 * (time * 3.0).sin() as f32)
        } else {
            base
        }
    }
}

impl View for StatusView<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            let color = self.dot_color(ui.input(|i| i.time));
            ui.painter().circle_filled(rect.center(), 4.0, color);
            ui.monospace(self.indicator.text.as_str());
        });
    }
}
