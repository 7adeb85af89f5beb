//! Item Activity Repository
//!
//! Append-only analytics log with filtered reads.

use rusqlite::{params, ToSql};

use crate::domain::{ActivityAction, ActivityFilter, ItemActivity, DomainResult};
use super::db::{require_conn, SharedConnection};

pub struct ActivityRepository {
    conn: SharedConnection,
}

impl ActivityRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, activity: &ItemActivity) -> DomainResult<ItemActivity> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute(
            "INSERT INTO item_activities (list_id, user_id, item_id, name, amount, unit, timestamp, action)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                activity.list_id,
                activity.user_id,
                activity.item_id,
                activity.name,
                activity.amount,
                activity.unit,
                activity.timestamp,
                activity.action.as_str(),
            ],
        )?;

        let mut stored = activity.clone();
        stored.id = conn.last_insert_rowid() as u32;
        Ok(stored)
    }

    /// Activities matching every set field of `filter`, oldest first
    pub async fn query(&self, filter: &ActivityFilter) -> DomainResult<Vec<ItemActivity>> {
        let mut sql = String::from(
            "SELECT id, list_id, user_id, item_id, name, amount, unit, timestamp, action
             FROM item_activities WHERE list_id = ?",
        );
        let mut args: Vec<Box<dyn ToSql + Send>> = vec![Box::new(filter.list_id)];

        if let Some(user_id) = filter.user_id {
            sql.push_str(" AND user_id = ?");
            args.push(Box::new(user_id));
        }
        if let Some(name) = &filter.name {
            sql.push_str(" AND name = ?");
            args.push(Box::new(name.clone()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND timestamp >= ?");
            args.push(Box::new(from));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND timestamp <= ?");
            args.push(Box::new(to));
        }
        sql.push_str(" ORDER BY timestamp, id");

        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let mut stmt = conn.prepare(&sql)?;
        let refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref() as &dyn ToSql).collect();
        let rows = stmt.query_map(refs.as_slice(), |row| {
            let action: String = row.get(8)?;
            Ok(ItemActivity {
                id: row.get(0)?,
                list_id: row.get(1)?,
                user_id: row.get(2)?,
                item_id: row.get(3)?,
                name: row.get(4)?,
                amount: row.get(5)?,
                unit: row.get(6)?,
                timestamp: row.get(7)?,
                action: ActivityAction::parse(&action).unwrap_or(ActivityAction::Checked),
            })
        })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    /// Distinct item names with recorded activity on a list
    pub async fn names(&self, list_id: u32) -> DomainResult<Vec<String>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let mut stmt = conn.prepare(
            "SELECT DISTINCT name FROM item_activities WHERE list_id = ? ORDER BY name",
        )?;
        let rows = stmt.query_map(params![list_id], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }
}
