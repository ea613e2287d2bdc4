use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::push::EXPO_PUSH_ENDPOINT;

pub const DEFAULT_CONFIG_PATH: &str = "config/room_chat.json";

/// Messages the chat room view asks for.
pub const DEFAULT_VIEW_MESSAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub identity_path: String,
    pub message_limit: usize,
    /// Host used when building shareable room links
    pub app_domain: String,
    pub push: PushConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub enabled: bool,
    pub endpoint: String,
    /// Push token of this device, registered for the local user at startup
    pub device_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "data/chat.db".to_string(),
            identity_path: "data/identity.json".to_string(),
            message_limit: DEFAULT_VIEW_MESSAGE_LIMIT,
            app_domain: "your-app-name.com".to_string(),
            push: PushConfig::default(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: EXPO_PUSH_ENDPOINT.to_string(),
            device_token: None,
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
