use egui::{Color32, Context};
use vitrine_stage::LoadingOverlay;

/// Draw the loading overlay: a white veil with a progress bar, faded by
/// the overlay's current opacity.
pub fn draw(ctx: &Context, overlay: &LoadingOverlay) {
    if !overlay.is_visible() {
        return;
    }
    let opacity = overlay.opacity();
    let veil = Color32::from_white_alpha((opacity * 255.0).round() as u8);

    egui::CentralPanel::default()
        .frame(egui::Frame::default().fill(veil))
        .show(ctx, |ui| {
            ui.set_opacity(opacity);
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.45);
                match overlay.error() {
                    Some(error) => {
                        ui.colored_label(Color32::from_rgb(180, 30, 30), "Failed to load environment");
                        ui.small(error);
                    }
                    None => {
                        ui.add(
                            egui::ProgressBar::new(overlay.progress() / 100.0)
                                .desired_width(320.0)
                                .show_percentage(),
                        );
                    }
                }
            });
        });
}
