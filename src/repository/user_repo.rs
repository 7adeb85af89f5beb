//! User Repository
//!
//! Handles user lookups for list membership and credential resolution.

use rusqlite::{params, OptionalExtension};

use crate::domain::{User, DomainError, DomainResult};
use super::db::{require_conn, SharedConnection};

pub struct UserRepository {
    conn: SharedConnection,
}

impl UserRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Create a user; Conflict if the username is taken
    pub async fn create(&self, username: &str) -> DomainResult<User> {
        if username.trim().is_empty() {
            return Err(DomainError::InvalidInput("Username must not be empty".into()));
        }

        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        match conn.execute("INSERT INTO users (username) VALUES (?)", params![username]) {
            Ok(_) => Ok(User::new(conn.last_insert_rowid() as u32, username.to_string())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DomainError::Conflict(format!("User '{}' already exists", username)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Return the user with `username`, creating it if missing
    pub async fn ensure(&self, username: &str) -> DomainResult<User> {
        if let Some(user) = self.find_by_username(username).await? {
            return Ok(user);
        }
        self.create(username).await
    }

    pub async fn find_by_id(&self, id: u32) -> DomainResult<Option<User>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let user = conn
            .query_row(
                "SELECT id, username FROM users WHERE id = ?",
                params![id],
                |row| Ok(User::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let user = conn
            .query_row(
                "SELECT id, username FROM users WHERE username = ?",
                params![username],
                |row| Ok(User::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(user)
    }

    /// Users for the given ids, skipping unknown ids
    pub async fn find_by_ids(&self, ids: &[u32]) -> DomainResult<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.find_by_id(*id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute("DELETE FROM users WHERE id = ?", params![id])?;
        Ok(())
    }
}
