use eframe::egui;

/// Message input. Returns `true` when the user asked to send; clearing the
/// text is left to the caller once the send is confirmed.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, sending: bool) -> bool {
    let mut send = false;
    let can_send = !sending && !input_text.trim().is_empty();

    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Type a message...")
                .desired_width(ui.available_width() - 70.0),
        );

        if ui.add_enabled(can_send, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = can_send;
            response.request_focus();
        }
    });

    send
}
