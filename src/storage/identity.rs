use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::common::{User, now_ms};
use crate::error::Result;

/// On-disk shape of the identity file. Either field may be missing on first run.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredIdentity {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Persists the local user id and display name as a small JSON file.
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the stored identity, generating and persisting whatever is missing.
    /// Falls back to an anonymous in-memory identity if the file is unusable.
    pub fn load_or_create(&self) -> User {
        match self.try_load_or_create() {
            Ok(user) => user,
            Err(err) => {
                log::error!(
                    "Error initializing identity from {}: {err}",
                    self.path.display()
                );
                User {
                    user_id: format!("anonymous_{}", now_ms()),
                    username: "Anonymous".to_string(),
                }
            }
        }
    }

    fn try_load_or_create(&self) -> Result<User> {
        let mut stored = self.read()?;
        let mut dirty = false;

        let user_id = match stored.user_id.take() {
            Some(id) => id,
            None => {
                dirty = true;
                format!("user_{}_{}", device_name(), now_ms())
            }
        };

        let username = match stored.username.take() {
            Some(name) => name,
            None => {
                dirty = true;
                default_username()
            }
        };

        let user = User { user_id, username };
        if dirty {
            self.write(&user)?;
            log::info!("Created local identity {}", user.user_id);
        }
        Ok(user)
    }

    /// Persist a new display name for `user` and return the updated user.
    pub fn set_username(&self, user: &User, username: &str) -> Result<User> {
        let updated = User {
            user_id: user.user_id.clone(),
            username: username.to_string(),
        };
        self.write(&updated)?;
        Ok(updated)
    }

    fn read(&self) -> Result<StoredIdentity> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoredIdentity::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, user: &User) -> Result<()> {
        super::ensure_parent_dir(&self.path)?;
        let stored = StoredIdentity {
            user_id: Some(user.user_id.clone()),
            username: Some(user.username.clone()),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

fn device_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn default_username() -> String {
    format!("User_{}", Uuid::new_v4().as_u128() % 10_000)
}
