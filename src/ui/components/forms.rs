use eframe::egui;

#[derive(Default)]
pub struct FormActions {
    pub submit: bool,
    pub back: bool,
}

/// Single-field form used by the create-room and join-by-code screens.
pub fn render(
    ui: &mut egui::Ui,
    title: &str,
    label: &str,
    hint: &str,
    input: &mut String,
    busy: bool,
    error: Option<&str>,
) -> FormActions {
    let mut actions = FormActions::default();

    if ui.button("← Back").clicked() {
        actions.back = true;
    }
    ui.heading(title);
    ui.add_space(8.0);

    ui.label(label);
    let response = ui.add(egui::TextEdit::singleline(input).hint_text(hint));
    let ready = !busy && !input.trim().is_empty();

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui.add_enabled(ready, egui::Button::new(title)).clicked() {
            actions.submit = true;
        }
        if busy {
            ui.spinner();
        }
    });

    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && ready {
        actions.submit = true;
    }

    if let Some(error) = error {
        ui.colored_label(egui::Color32::RED, error);
    }

    actions
}
