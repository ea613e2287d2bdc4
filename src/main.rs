mod backend;
mod common;
mod config;
mod error;
mod notify;
mod share;
mod storage;
mod ui;

use std::error::Error;

use backend::{BackendClient, PushSender};
use clap::Parser;
use common::User;
use config::AppConfig;
use dotenvy::dotenv;
use storage::{ChatDatabase, IdentityStore};
use tokio::sync::mpsc;
use ui::{AppState, ChatApp};

#[derive(Parser)]
#[command(
    name = "room_chat",
    version,
    about = "Chat rooms with live message feeds"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Save a new display name before starting
    #[arg(long, value_name = "NAME")]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    let user = load_user(&app_config, cli.username.as_deref());

    storage::ensure_parent_dir(&app_config.database_path)?;
    let db = ChatDatabase::with_path(&app_config.database_path)?;

    run_client(app_config, user, db).await
}

fn load_user(app_config: &AppConfig, username: Option<&str>) -> User {
    let identity = IdentityStore::new(&app_config.identity_path);
    let user = identity.load_or_create();

    let Some(username) = username.map(str::trim).filter(|name| !name.is_empty()) else {
        return user;
    };
    match identity.set_username(&user, username) {
        Ok(updated) => updated,
        Err(err) => {
            log::error!("Error setting username: {err}");
            user
        }
    }
}

async fn run_client(
    app_config: AppConfig,
    user: User,
    db: ChatDatabase,
) -> Result<(), Box<dyn Error>> {
    // UI -> backend
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // backend -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let push = app_config
        .push
        .enabled
        .then(|| PushSender::new(app_config.push.endpoint.clone()));
    let push_token = if app_config.push.enabled {
        app_config.push.device_token.clone()
    } else {
        None
    };

    tokio::spawn(async move {
        let client = BackendClient::new(event_tx, cmd_rx, db, push);
        if let Err(err) = client.run().await {
            log::error!("Backend terminated: {err}");
        }
    });

    log::info!("Starting client as {} ({})", user.username, user.user_id);

    let options = eframe::NativeOptions::default();
    let state = AppState::new(user, app_config.message_limit);

    eframe::run_native(
        "Room Chat",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ChatApp::new(
                cc,
                state,
                app_config.app_domain,
                push_token,
                cmd_tx,
                event_rx,
            )))
        }),
    )?;

    Ok(())
}
