use rusqlite::{Connection, Result as SqlResult};
use std::path::Path;
use std::time::Duration;

/// How long a statement waits for another client's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One SQLite connection. Several clients may open the same file, each
/// through its own `Database`.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> SqlResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Counter that moves whenever another connection commits to the file.
    /// Commits made through this connection leave it unchanged.
    pub fn data_version(&self) -> SqlResult<i64> {
        self.conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))
    }
}
