use eframe::egui;

use crate::common::{Message, User};
use crate::ui::room_view::{ChatRoomView, is_own_message};

const OWN_BUBBLE: egui::Color32 = egui::Color32::from_rgb(0xDC, 0xF8, 0xC6);
const OTHER_BUBBLE: egui::Color32 = egui::Color32::WHITE;

pub fn render(ui: &mut egui::Ui, view: &mut ChatRoomView, user: &User) {
    let Some(feed) = &view.feed else {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading messages...");
        });
        return;
    };

    if feed.is_empty() {
        ui.label(
            egui::RichText::new("No messages yet. Be the first to send a message!")
                .italics()
                .weak(),
        );
        return;
    }

    let scroll_to_bottom = std::mem::take(&mut view.scroll_to_bottom);
    let last_index = feed.len() - 1;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for (index, message) in feed.iter().enumerate() {
                let response = bubble(ui, message, is_own_message(message, user));
                if scroll_to_bottom && index == last_index {
                    response.scroll_to_me(Some(egui::Align::BOTTOM));
                }
            }
        });
}

fn bubble(ui: &mut egui::Ui, message: &Message, own: bool) -> egui::Response {
    let layout = if own {
        egui::Layout::right_to_left(egui::Align::TOP)
    } else {
        egui::Layout::left_to_right(egui::Align::TOP)
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::new()
            .fill(if own { OWN_BUBBLE } else { OTHER_BUBBLE })
            .corner_radius(12.0)
            .inner_margin(egui::Margin::same(8))
            .show(ui, |ui| {
                ui.set_max_width(ui.available_width() * 0.8);
                ui.vertical(|ui| {
                    if !own {
                        ui.label(egui::RichText::new(&message.sender_name).small().strong());
                    }
                    ui.label(egui::RichText::new(&message.content).color(egui::Color32::BLACK));
                    ui.label(
                        egui::RichText::new(format_time(message.timestamp))
                            .small()
                            .color(egui::Color32::GRAY),
                    );
                });
            });
    })
    .response
}

fn format_time(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|at| at.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_default()
}
