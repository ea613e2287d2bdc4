use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{BackendCommand, BackendEvent};
use crate::notify::{LocalNotification, ToastPresenter};

use super::components::{
    chat_area, forms, input_bar, share_panel,
    sidebar::{self, SidebarActions},
    toast::{self, TOAST_SECONDS, Toast},
};
use super::state::{AppState, Screen};

/// Banners waiting to be drawn; more than this and new ones are dropped.
const TOAST_QUEUE: usize = 16;

enum UiAction {
    Back,
    SubmitCreate,
    SubmitJoin,
    Send,
}

pub struct ChatApp {
    state: AppState,
    app_domain: String,
    command_sender: mpsc::Sender<BackendCommand>,
    event_receiver: mpsc::Receiver<BackendEvent>,
    presenter: ToastPresenter,
    toast_receiver: mpsc::Receiver<LocalNotification>,
    toasts: Vec<Toast>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        mut state: AppState,
        app_domain: String,
        push_token: Option<String>,
        command_sender: mpsc::Sender<BackendCommand>,
        event_receiver: mpsc::Receiver<BackendEvent>,
    ) -> Self {
        let (presenter, toast_receiver) = ToastPresenter::channel(TOAST_QUEUE);

        let mut startup = state.startup_commands();
        if let Some(token) = push_token {
            startup.push(state.register_push_token(&token));
        }

        let mut app = Self {
            state,
            app_domain,
            command_sender,
            event_receiver,
            presenter,
            toast_receiver,
            toasts: Vec::new(),
        };
        app.dispatch(startup);
        app
    }

    fn dispatch(&mut self, commands: Vec<BackendCommand>) {
        for command in commands {
            if let Err(err) = self.command_sender.try_send(command) {
                log::warn!("Failed to send command to backend: {err}");
            }
        }
    }

    fn handle_backend_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            let commands = self.state.handle_event(event, &self.presenter);
            self.dispatch(commands);
        }
    }

    fn collect_toasts(&mut self, now: f64) {
        while let Ok(notification) = self.toast_receiver.try_recv() {
            self.toasts.push(Toast {
                notification,
                expires_at: now + TOAST_SECONDS,
            });
        }
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    fn apply(&mut self, action: UiAction) {
        let commands = match action {
            UiAction::Back => self.state.leave_room(),
            UiAction::SubmitCreate => self.state.submit_create_room(),
            UiAction::SubmitJoin => self.state.submit_join_code(),
            UiAction::Send => self.state.send_message(),
        };
        self.dispatch(commands);
    }

    fn apply_sidebar(&mut self, actions: SidebarActions) {
        let mut commands = Vec::new();
        if let Some(room) = actions.selected_room {
            commands.extend(self.state.select_room(&room));
        }
        if actions.create_room {
            commands.extend(self.state.show_create_room());
        }
        if actions.join_by_code {
            commands.extend(self.state.show_join_by_code());
        }
        self.dispatch(commands);
    }

    fn render_screen(&mut self, ui: &mut egui::Ui) -> Option<UiAction> {
        let user = self.state.user.clone();

        match &mut self.state.screen {
            Screen::RoomList => {
                ui.centered_and_justified(|ui| {
                    ui.label("Pick a room on the left, or create a new one.");
                });
                None
            }
            Screen::CreateRoom {
                name_input,
                creating,
                error,
            } => {
                let actions = forms::render(
                    ui,
                    "Create Chat Room",
                    "Chat Room Name",
                    "Enter chat room name",
                    name_input,
                    *creating,
                    error.as_deref(),
                );
                form_action(actions, UiAction::SubmitCreate)
            }
            Screen::JoinByCode {
                code_input,
                checking,
                error,
            } => {
                let actions = forms::render(
                    ui,
                    "Join Chat Room",
                    "Room link or code",
                    "https://.../chat/<room id>",
                    code_input,
                    *checking,
                    error.as_deref(),
                );
                form_action(actions, UiAction::SubmitJoin)
            }
            Screen::ChatRoom(view) => {
                let mut action = None;

                ui.horizontal(|ui| {
                    if ui.button("← Back").clicked() {
                        action = Some(UiAction::Back);
                    }
                    ui.heading(&view.name);
                    if ui.button("Share").clicked() {
                        view.show_share = !view.show_share;
                    }
                });
                if view.show_share {
                    share_panel::render(ui, &self.app_domain, &view.chat_room_id, &view.name);
                }
                if let Some(error) = &view.error {
                    ui.colored_label(egui::Color32::RED, error);
                }
                ui.separator();

                egui::TopBottomPanel::bottom("input_bar").show_inside(ui, |ui| {
                    ui.add_space(6.0);
                    let sending = view.is_sending();
                    if input_bar::render(ui, &mut view.input_text, sending) {
                        action = Some(UiAction::Send);
                    }
                    ui.add_space(6.0);
                });

                chat_area::render(ui, view, &user);
                action
            }
        }
    }
}

fn form_action(actions: forms::FormActions, submit: UiAction) -> Option<UiAction> {
    if actions.back {
        Some(UiAction::Back)
    } else if actions.submit {
        Some(submit)
    } else {
        None
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_backend_events();
        self.collect_toasts(ctx.input(|i| i.time));

        egui::SidePanel::left("room_sidebar")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                let actions = sidebar::render(ui, &self.state);
                self.apply_sidebar(actions);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(action) = self.render_screen(ui) {
                self.apply(action);
            }
        });

        if let Some(notification) = toast::render(ctx, &self.toasts) {
            let commands = self.state.open_notification(&notification.data);
            self.dispatch(commands);
            self.toasts.clear();
        }

        // backend events arrive off-thread; keep polling
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
