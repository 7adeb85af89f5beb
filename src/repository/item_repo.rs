//! Shopping Item Repository
//!
//! SQLite implementation of Repository<ShoppingItem>. Tags are stored as a
//! JSON array column.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::collections::HashMap;

use crate::domain::{ShoppingItem, DomainError, DomainResult};
use super::db::{require_conn, SharedConnection};
use super::traits::Repository;

const ITEM_COLUMNS: &str =
    "id, name, tags, amount, unit, checked, checked_at, note, edited_at, edited_by";

/// SQLite implementation of ShoppingItem repository
pub struct ItemRepository {
    conn: SharedConnection,
}

impl ItemRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<ShoppingItem> for ItemRepository {
    async fn create(&self, entity: &ShoppingItem) -> DomainResult<ShoppingItem> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute(
            "INSERT INTO shopping_items (name, tags, amount, unit, checked, checked_at, note, edited_at, edited_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.name,
                serde_json::to_string(&entity.tags)?,
                entity.amount,
                entity.unit,
                entity.checked,
                entity.checked_at,
                entity.note,
                entity.edited_at,
                entity.edited_by,
            ],
        )?;

        let mut item = entity.clone();
        item.id = conn.last_insert_rowid() as u32;
        Ok(item)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<ShoppingItem>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM shopping_items WHERE id = ?", ITEM_COLUMNS);
        let row = conn
            .query_row(&query, params![id], row_to_raw)
            .optional()?;
        row.map(RawItem::into_item).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<ShoppingItem>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM shopping_items ORDER BY id", ITEM_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], row_to_raw)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.into_item()?);
        }
        Ok(items)
    }

    async fn update(&self, entity: &ShoppingItem) -> DomainResult<ShoppingItem> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let changed = conn.execute(
            "UPDATE shopping_items SET name = ?, tags = ?, amount = ?, unit = ?, checked = ?, checked_at = ?, note = ?, edited_at = ?, edited_by = ?
             WHERE id = ?",
            params![
                entity.name,
                serde_json::to_string(&entity.tags)?,
                entity.amount,
                entity.unit,
                entity.checked,
                entity.checked_at,
                entity.note,
                entity.edited_at,
                entity.edited_by,
                entity.id,
            ],
        )?;

        if changed == 0 {
            return Err(DomainError::not_found::<ShoppingItem>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute("DELETE FROM shopping_items WHERE id = ?", params![id])?;
        Ok(())
    }

    async fn find_by_ids(&self, ids: &[u32]) -> DomainResult<Vec<ShoppingItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<u32, ShoppingItem> = {
            let guard = self.conn.lock().await;
            let conn = require_conn(&guard)?;

            let placeholders = vec!["?"; ids.len()].join(", ");
            let query = format!(
                "SELECT {} FROM shopping_items WHERE id IN ({})",
                ITEM_COLUMNS, placeholders
            );
            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_raw)?;

            let mut found = HashMap::with_capacity(ids.len());
            for row in rows {
                let item = row?.into_item()?;
                found.insert(item.id, item);
            }
            found
        };

        // Keep membership order
        Ok(ids.iter().filter_map(|id| found.get(id).cloned()).collect())
    }
}

/// Row as stored; tags still JSON-encoded
struct RawItem {
    id: u32,
    name: String,
    tags: String,
    amount: f64,
    unit: String,
    checked: bool,
    checked_at: Option<i64>,
    note: String,
    edited_at: i64,
    edited_by: String,
}

impl RawItem {
    fn into_item(self) -> DomainResult<ShoppingItem> {
        Ok(ShoppingItem {
            id: self.id,
            name: self.name,
            tags: serde_json::from_str(&self.tags)?,
            amount: self.amount,
            unit: self.unit,
            checked: self.checked,
            checked_at: self.checked_at,
            note: self.note,
            edited_at: self.edited_at,
            edited_by: self.edited_by,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get(0)?,
        name: row.get(1)?,
        tags: row.get(2)?,
        amount: row.get(3)?,
        unit: row.get(4)?,
        checked: row.get::<_, i32>(5)? != 0,
        checked_at: row.get(6)?,
        note: row.get(7)?,
        edited_at: row.get(8)?,
        edited_by: row.get(9)?,
    })
}
