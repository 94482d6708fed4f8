use crate::app::views::View;
use crate::controller::Alert;

/// Blocking notice; nothing else can be clicked until it is acknowledged.
pub struct AlertView<'a> {
    alert: &'a Alert,
    acknowledged: bool,
}

impl<'a> AlertView<'a> {
    pub fn new(alert: &'a Alert) -> Self {
        Self {
            alert,
            acknowledged: false,
        }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }
}

impl View for AlertView<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        let alert = self.alert;
        let response = egui::Modal::new(egui::Id::new("console_alert")).show(ui.ctx(), |ui| {
            ui.set_width(360.0);
            ui.heading(&alert.message);
            ui.add_space(4.0);
            ui.small(format!(
                "[{}] {}",
                alert.raised_at.format("%H:%M:%S"),
                alert.detail
            ));
            ui.separator();
            ui.button("OK").clicked()
        });

        if response.inner || response.should_close() {
            self.acknowledged = true;
        }
    }
}
