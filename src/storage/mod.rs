pub mod chat_db;
pub mod database;
pub mod identity;

pub use chat_db::ChatDatabase;
pub use identity::IdentityStore;

use std::fs;
use std::path::Path;

/// Ensure the parent directory of a data file exists
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
