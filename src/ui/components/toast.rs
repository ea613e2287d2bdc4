use eframe::egui;

use crate::notify::LocalNotification;

/// Seconds a banner stays on screen.
pub const TOAST_SECONDS: f64 = 4.0;

pub struct Toast {
    pub notification: LocalNotification,
    pub expires_at: f64,
}

/// Draws the banners in the top-right corner. Returns the one that was clicked.
pub fn render(ctx: &egui::Context, toasts: &[Toast]) -> Option<LocalNotification> {
    if toasts.is_empty() {
        return None;
    }

    let mut clicked = None;
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .show(ctx, |ui| {
            for toast in toasts {
                let response = egui::Frame::popup(ui.style())
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(&toast.notification.title).strong());
                        ui.label(&toast.notification.body);
                    })
                    .response
                    .interact(egui::Sense::click());

                if response.clicked() {
                    clicked = Some(toast.notification.clone());
                }
                ui.add_space(6.0);
            }
        });

    clicked
}
