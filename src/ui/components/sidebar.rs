use crate::common::ChatRoom;
use crate::ui::state::AppState;
use eframe::egui;

#[derive(Default)]
pub struct SidebarActions {
    pub selected_room: Option<ChatRoom>,
    pub create_room: bool,
    pub join_by_code: bool,
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.heading("Chat Rooms");
    ui.label(egui::RichText::new(format!("Signed in as {}", state.user.username)).weak());
    ui.separator();

    ui.horizontal(|ui| {
        if ui.button("➕ New room").clicked() {
            actions.create_room = true;
        }
        if ui.button("🔗 Join by code").clicked() {
            actions.join_by_code = true;
        }
    });

    if let Some(status) = &state.status {
        ui.colored_label(egui::Color32::RED, status);
    }
    ui.separator();

    let Some(rooms) = &state.rooms else {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading...");
        });
        return actions;
    };

    if rooms.is_empty() {
        ui.label("No chat rooms yet");
        return actions;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for room in rooms {
            let joined = state.is_member(&room.id);
            let marker = if joined { "›" } else { "⇥" };

            let response = ui.selectable_label(false, format!("{marker} {}", room.name));
            ui.label(
                egui::RichText::new(format!("Created on {}", format_date(room.created_at)))
                    .small()
                    .weak(),
            );

            if response.clicked() {
                actions.selected_room = Some(room.clone());
            }
        }
    });

    actions
}

fn format_date(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|at| at.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
