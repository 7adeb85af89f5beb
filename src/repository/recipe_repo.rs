//! Recipe Repository
//!
//! Entries, instructions and categories are stored as JSON arrays.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::domain::{DomainError, DomainResult, Recipe};
use super::db::{require_conn, SharedConnection};
use super::traits::Repository;

const RECIPE_COLUMNS: &str =
    "id, name, creator_id, created_at, source_item_set_id, items, description, instructions, categories";

pub struct RecipeRepository {
    conn: SharedConnection,
}

impl RecipeRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Recipes created by `creator_id`, oldest first
    pub async fn list_by_creator(&self, creator_id: u32) -> DomainResult<Vec<Recipe>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM recipes WHERE creator_id = ? ORDER BY id", RECIPE_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params![creator_id], row_to_raw)?;

        let mut recipes = Vec::new();
        for row in rows {
            recipes.push(row?.into_recipe()?);
        }
        Ok(recipes)
    }

    /// Whether `creator_id` already converted item set `set_id`
    pub async fn exists_for_item_set(&self, creator_id: u32, set_id: u32) -> DomainResult<bool> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let found = conn
            .query_row(
                "SELECT 1 FROM recipes WHERE creator_id = ? AND source_item_set_id = ? LIMIT 1",
                params![creator_id, set_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl Repository<Recipe> for RecipeRepository {
    async fn create(&self, entity: &Recipe) -> DomainResult<Recipe> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute(
            "INSERT INTO recipes (name, creator_id, created_at, source_item_set_id, items, description, instructions, categories)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.name,
                entity.creator_id,
                entity.created_at,
                entity.source_item_set_id,
                serde_json::to_string(&entity.items)?,
                entity.description,
                serde_json::to_string(&entity.instructions)?,
                serde_json::to_string(&entity.categories)?,
            ],
        )?;

        let mut recipe = entity.clone();
        recipe.id = conn.last_insert_rowid() as u32;
        Ok(recipe)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Recipe>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM recipes WHERE id = ?", RECIPE_COLUMNS);
        let row = conn.query_row(&query, params![id], row_to_raw).optional()?;
        row.map(RawRecipe::into_recipe).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Recipe>> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let query = format!("SELECT {} FROM recipes ORDER BY id", RECIPE_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], row_to_raw)?;

        let mut recipes = Vec::new();
        for row in rows {
            recipes.push(row?.into_recipe()?);
        }
        Ok(recipes)
    }

    async fn update(&self, entity: &Recipe) -> DomainResult<Recipe> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        let changed = conn.execute(
            "UPDATE recipes SET name = ?, items = ?, description = ?, instructions = ?, categories = ? WHERE id = ?",
            params![
                entity.name,
                serde_json::to_string(&entity.items)?,
                entity.description,
                serde_json::to_string(&entity.instructions)?,
                serde_json::to_string(&entity.categories)?,
                entity.id,
            ],
        )?;

        if changed == 0 {
            return Err(DomainError::not_found::<Recipe>(entity.id));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = require_conn(&guard)?;

        conn.execute("DELETE FROM recipes WHERE id = ?", params![id])?;
        Ok(())
    }
}

struct RawRecipe {
    id: u32,
    name: String,
    creator_id: u32,
    created_at: i64,
    source_item_set_id: Option<u32>,
    items: String,
    description: String,
    instructions: String,
    categories: String,
}

impl RawRecipe {
    fn into_recipe(self) -> DomainResult<Recipe> {
        Ok(Recipe {
            id: self.id,
            name: self.name,
            creator_id: self.creator_id,
            created_at: self.created_at,
            source_item_set_id: self.source_item_set_id,
            items: serde_json::from_str(&self.items)?,
            description: self.description,
            instructions: serde_json::from_str(&self.instructions)?,
            categories: serde_json::from_str(&self.categories)?,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawRecipe> {
    Ok(RawRecipe {
        id: row.get(0)?,
        name: row.get(1)?,
        creator_id: row.get(2)?,
        created_at: row.get(3)?,
        source_item_set_id: row.get(4)?,
        items: row.get(5)?,
        description: row.get(6)?,
        instructions: row.get(7)?,
        categories: row.get(8)?,
    })
}
