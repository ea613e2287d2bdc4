pub mod chat_area;
pub mod forms;
pub mod input_bar;
pub mod share_panel;
pub mod sidebar;
pub mod toast;
