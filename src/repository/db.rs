//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations. Every repository shares the
//! same connection handle.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared connection handle; `None` until initialized or after `close`
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
}

impl DbState {
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to pass into repositories
    pub fn connection(&self) -> SharedConnection {
        self.conn.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection; repositories fail with Internal afterwards
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        *guard = None;
    }
}

impl Default for DbState {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrow the live connection out of a locked handle
pub(crate) fn require_conn(guard: &Option<Connection>) -> DomainResult<&Connection> {
    guard
        .as_ref()
        .ok_or_else(|| DomainError::Internal("Database not initialized".to_string()))
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("Corrupt record: {}", e))
    }
}

/// Initialize database with path (`:memory:` for an in-memory database)
pub async fn init_db(db_path: &Path) -> Result<DbState, String> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create db dir: {}", e))?;
        }
    }

    let conn = Connection::open(db_path).map_err(|e| format!("Failed to open db: {}", e))?;

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| format!("Failed to configure db: {}", e))?;

    run_migrations(&conn)?;
    log::info!("Database ready at {}", db_path.display());

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(mut rows) = stmt.query([]) else {
        return false;
    };
    while let Ok(Some(row)) = rows.next() {
        if let Ok(name) = row.get::<_, String>(1) {
            if name == column {
                return true;
            }
        }
    }
    false
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS shopping_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            amount REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL DEFAULT '',
            checked INTEGER NOT NULL DEFAULT 0,
            checked_at INTEGER,
            edited_at INTEGER NOT NULL DEFAULT 0,
            edited_by TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS item_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            items TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS shopping_lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            item_ids TEXT NOT NULL DEFAULT '[]',
            item_set_ids TEXT NOT NULL DEFAULT '[]',
            user_ids TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS item_activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            list_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            unit TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL,
            action TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_item_activities_list ON item_activities(list_id);

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            creator_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            source_item_set_id INTEGER,
            items TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            instructions TEXT NOT NULL DEFAULT '[]',
            categories TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_recipes_creator ON recipes(creator_id);",
    )
    .map_err(|e| e.to_string())?;

    // Columns added after the first schema
    if !column_exists(conn, "shopping_items", "note") {
        conn.execute("ALTER TABLE shopping_items ADD COLUMN note TEXT NOT NULL DEFAULT ''", [])
            .map_err(|e| format!("Failed to add note: {}", e))?;
    }

    if !column_exists(conn, "item_sets", "receipt_file_id") {
        conn.execute("ALTER TABLE item_sets ADD COLUMN receipt_file_id TEXT", [])
            .map_err(|e| format!("Failed to add receipt_file_id: {}", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shoplist.db");

        let first = init_db(&path).await.expect("first open");
        first.close().await;
        assert!(!first.is_initialized().await);

        let second = init_db(&path).await.expect("second open");
        let guard = second.conn.lock().await;
        let conn = require_conn(&guard).unwrap();
        assert!(column_exists(conn, "shopping_items", "note"));
        assert!(column_exists(conn, "item_sets", "receipt_file_id"));
    }

    #[tokio::test]
    async fn test_closed_state_reports_internal() {
        let state = DbState::new();
        let guard = state.conn.lock().await;
        assert!(matches!(require_conn(&guard), Err(DomainError::Internal(_))));
    }
}
