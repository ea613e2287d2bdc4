use eframe::egui;

use crate::share::{QrMatrix, share_link, share_qr};

/// Pixels per QR module.
const MODULE_PX: usize = 4;
/// Light border around the code, in modules.
const QUIET_ZONE: usize = 4;
const QR_DISPLAY_SIZE: f32 = 180.0;

/// Shows the room link as a QR code, with the link itself and a copy button.
pub fn render(ui: &mut egui::Ui, app_domain: &str, chat_room_id: &str, chat_name: &str) {
    let link = share_link(app_domain, chat_room_id);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.label(egui::RichText::new(format!("Share {chat_name}")).strong());
        if let Some(texture) = qr_texture(ui, &link) {
            ui.add(
                egui::Image::new(&texture)
                    .fit_to_exact_size(egui::vec2(QR_DISPLAY_SIZE, QR_DISPLAY_SIZE)),
            );
        }
        ui.horizontal(|ui| {
            ui.monospace(&link);
            if ui.button("Copy").clicked() {
                ui.ctx().copy_text(link.clone());
                log::info!("Copied share link for {chat_room_id}");
            }
        });
        ui.label(
            egui::RichText::new("Scan the code, or paste the link into \"Join by code\".")
                .small()
                .weak(),
        );
    });
}

/// Encoded once per link and kept in egui's temp storage.
fn qr_texture(ui: &egui::Ui, link: &str) -> Option<egui::TextureHandle> {
    let id = egui::Id::new(("share_qr", link));
    if let Some(texture) = ui.ctx().data_mut(|data| data.get_temp::<egui::TextureHandle>(id)) {
        return Some(texture);
    }

    let matrix = match share_qr(link) {
        Ok(matrix) => matrix,
        Err(err) => {
            log::warn!("Cannot draw QR code for {link}: {err}");
            return None;
        }
    };
    let texture = ui
        .ctx()
        .load_texture("share_qr", qr_image(&matrix), egui::TextureOptions::NEAREST);
    ui.ctx()
        .data_mut(|data| data.insert_temp(id, texture.clone()));
    Some(texture)
}

fn qr_image(matrix: &QrMatrix) -> egui::ColorImage {
    let side = (matrix.width + 2 * QUIET_ZONE) * MODULE_PX;
    let mut gray = vec![255u8; side * side];

    for y in 0..matrix.width {
        for x in 0..matrix.width {
            if !matrix.is_dark(x, y) {
                continue;
            }
            for dy in 0..MODULE_PX {
                let row = (y + QUIET_ZONE) * MODULE_PX + dy;
                let start = row * side + (x + QUIET_ZONE) * MODULE_PX;
                gray[start..start + MODULE_PX].fill(0);
            }
        }
    }

    egui::ColorImage::from_gray([side, side], &gray)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_has_quiet_zone_and_scaled_modules() {
        let matrix = QrMatrix {
            width: 2,
            dark: vec![true, false, false, true],
        };
        let image = qr_image(&matrix);
        let side = (2 + 2 * QUIET_ZONE) * MODULE_PX;
        let pixel = |x: usize, y: usize| image.pixels[y * side + x];

        assert_eq!(image.size, [side, side]);
        assert_eq!(pixel(0, 0), egui::Color32::WHITE);

        let origin = QUIET_ZONE * MODULE_PX;
        assert_eq!(pixel(origin, origin), egui::Color32::BLACK);
        assert_eq!(
            pixel(origin + MODULE_PX - 1, origin + MODULE_PX - 1),
            egui::Color32::BLACK
        );
        assert_eq!(pixel(origin + MODULE_PX, origin), egui::Color32::WHITE);
        assert_eq!(
            pixel(origin + MODULE_PX, origin + MODULE_PX),
            egui::Color32::BLACK
        );
    }
}
