use crate::chat::status::StatusKind;
use crate::theme::Theme;
use egui::{RichText, Sense};

/// Dot plus status line. The dot pulses while Bella is busy.
pub fn status_indicator(ui: &mut egui::Ui, theme: &Theme, label: &str) {
    let kind = StatusKind::classify(label);
    let color = theme.status_color(kind);

    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), Sense::hover());
        let radius = if kind == StatusKind::Busy {
            let time = ui.input(|input| input.time) as f32;
            ui.ctx().request_repaint();
            3.5 + 1.5 * (time * 4.0).sin().abs()
        } else {
            4.0
        };
        ui.painter().circle_filled(rect.center(), radius, color);
        ui.label(RichText::new(label).color(color));
    });
}
