//! Item Set Repository
//!
//! Entries are stored inline as a JSON array; item sets never own the
//! shopping items their entries point at.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::domain::{ItemSet, DomainError, DomainResult};
use super::db::{require_conn, SharedConnection};
use super::traits::Repository;

pub struct ItemSetRepository {
    conn: SharedConnection,
}

impl ItemSetRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Number of sets whose receipt is `file_id`
    pub async fn count_with_receipt(&self, file_id: &str) -> DomainResult<usize> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM item_sets WHERE receipt_file_id = ?",
            params![file_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl Repository<ItemSet> for ItemSetRepository {
    async fn create(&self, entity: &ItemSet) -> DomainResult<ItemSet> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute(
            "INSERT INTO item_sets (name, items, receipt_file_id) VALUES (?, ?, ?)",
            params![
                entity.name,
                serde_json::to_string(&entity.items)?,
                entity.receipt_file_id,
            ],
        )?;

        let mut set = entity.clone();
        set.id = conn.last_insert_rowid() as u32;
        Ok(set)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<ItemSet>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let row = conn
            .query_row(
                "SELECT id, name, items, receipt_file_id FROM item_sets WHERE id = ?",
                params![id],
                row_to_raw,
            )
            .optional()?;
        row.map(RawItemSet::into_item_set).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<ItemSet>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let mut stmt = conn.prepare("SELECT id, name, items, receipt_file_id FROM item_sets ORDER BY id")?;
        let rows = stmt.query_map([], row_to_raw)?;

        let mut sets = Vec::new();
        for row in rows {
            sets.push(row?.into_item_set()?);
        }
        Ok(sets)
    }

    async fn update(&self, entity: &ItemSet) -> DomainResult<ItemSet> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let changed = conn.execute(
            "UPDATE item_sets SET name = ?, items = ?, receipt_file_id = ? WHERE id = ?",
            params![
                entity.name,
                serde_json::to_string(&entity.items)?,
                entity.receipt_file_id,
                entity.id,
            ],
        )?;

        if changed == 0 {
            return Err(DomainError::not_found::<ItemSet>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute("DELETE FROM item_sets WHERE id = ?", params![id])?;
        Ok(())
    }
}

struct RawItemSet {
    id: u32,
    name: String,
    items: String,
    receipt_file_id: Option<String>,
}

impl RawItemSet {
    fn into_item_set(self) -> DomainResult<ItemSet> {
        Ok(ItemSet {
            id: self.id,
            name: self.name,
            items: serde_json::from_str(&self.items)?,
            receipt_file_id: self.receipt_file_id,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawItemSet> {
    Ok(RawItemSet {
        id: row.get(0)?,
        name: row.get(1)?,
        items: row.get(2)?,
        receipt_file_id: row.get(3)?,
    })
}
