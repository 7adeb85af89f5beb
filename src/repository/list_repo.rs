//! Shopping List Repository
//!
//! Membership collections are stored as JSON arrays of ids, preserving order.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::domain::{ShoppingList, DomainError, DomainResult};
use super::db::{require_conn, SharedConnection};
use super::traits::Repository;

const LIST_COLUMNS: &str = "id, name, created_at, item_ids, item_set_ids, user_ids";

pub struct ListRepository {
    conn: SharedConnection,
}

impl ListRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Lists whose members include `user_id`
    pub async fn list_for_user(&self, user_id: u32) -> DomainResult<Vec<ShoppingList>> {
        let lists = self.list().await?;
        Ok(lists.into_iter().filter(|list| list.has_user(user_id)).collect())
    }
}

#[async_trait]
impl Repository<ShoppingList> for ListRepository {
    async fn create(&self, entity: &ShoppingList) -> DomainResult<ShoppingList> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute(
            "INSERT INTO shopping_lists (name, created_at, item_ids, item_set_ids, user_ids) VALUES (?, ?, ?, ?, ?)",
            params![
                entity.name,
                entity.created_at,
                serde_json::to_string(&entity.item_ids)?,
                serde_json::to_string(&entity.item_set_ids)?,
                serde_json::to_string(&entity.user_ids)?,
            ],
        )?;

        let mut list = entity.clone();
        list.id = conn.last_insert_rowid() as u32;
        Ok(list)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<ShoppingList>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM shopping_lists WHERE id = ?", LIST_COLUMNS);
        let row = conn.query_row(&query, params![id], row_to_raw).optional()?;
        row.map(RawList::into_list).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<ShoppingList>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM shopping_lists ORDER BY id", LIST_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], row_to_raw)?;

        let mut lists = Vec::new();
        for row in rows {
            lists.push(row?.into_list()?);
        }
        Ok(lists)
    }

    async fn update(&self, entity: &ShoppingList) -> DomainResult<ShoppingList> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let changed = conn.execute(
            "UPDATE shopping_lists SET name = ?, item_ids = ?, item_set_ids = ?, user_ids = ? WHERE id = ?",
            params![
                entity.name,
                serde_json::to_string(&entity.item_ids)?,
                serde_json::to_string(&entity.item_set_ids)?,
                serde_json::to_string(&entity.user_ids)?,
                entity.id,
            ],
        )?;

        if changed == 0 {
            return Err(DomainError::not_found::<ShoppingList>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute("DELETE FROM shopping_lists WHERE id = ?", params![id])?;
        Ok(())
    }
}

struct RawList {
    id: u32,
    name: String,
    created_at: i64,
    item_ids: String,
    item_set_ids: String,
    user_ids: String,
}

impl RawList {
    fn into_list(self) -> DomainResult<ShoppingList> {
        Ok(ShoppingList {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            item_ids: serde_json::from_str(&self.item_ids)?,
            item_set_ids: serde_json::from_str(&self.item_set_ids)?,
            user_ids: serde_json::from_str(&self.user_ids)?,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawList> {
    Ok(RawList {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        item_ids: row.get(3)?,
        item_set_ids: row.get(4)?,
        user_ids: row.get(5)?,
    })
}
