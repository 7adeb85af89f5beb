//! Recipe Service
//!
//! Recipes are private to their creator. Converting an item set copies its
//! entries, so later edits to the set or its items do not reach the recipe.

use std::sync::Arc;

use crate::domain::{now_millis, Actor, DomainError, DomainResult, Recipe, RecipeDraft};
use crate::repository::{RecipeRepository, Repository};
use super::aggregator::ShoppingListService;

pub struct RecipeService {
    recipes: Arc<RecipeRepository>,
    lists: Arc<ShoppingListService>,
}

impl RecipeService {
    pub fn new(recipes: Arc<RecipeRepository>, lists: Arc<ShoppingListService>) -> Self {
        Self { recipes, lists }
    }

    pub async fn recipes_for(&self, actor: &Actor) -> DomainResult<Vec<Recipe>> {
        self.recipes.list_by_creator(actor.user_id).await
    }

    pub async fn create(&self, draft: RecipeDraft, actor: &Actor) -> DomainResult<Recipe> {
        draft.validate()?;
        let recipe = self
            .recipes
            .create(&Recipe::from_draft(draft, actor.user_id, now_millis()))
            .await?;
        log::info!("User {} created recipe {}", actor.username, recipe.id);
        Ok(recipe)
    }

    /// Save a set from a list the actor belongs to as a new recipe.
    ///
    /// Each user can convert a given set once.
    pub async fn convert_item_set(&self, list_id: u32, set_id: u32, actor: &Actor) -> DomainResult<Recipe> {
        let set = self.lists.item_set(list_id, set_id, actor).await?;
        if self.recipes.exists_for_item_set(actor.user_id, set_id).await? {
            return Err(DomainError::Conflict(format!(
                "Item set '{}' is already saved as a recipe",
                set.name
            )));
        }

        let recipe = self
            .recipes
            .create(&Recipe::from_item_set(&set, actor.user_id, now_millis()))
            .await?;
        log::info!("Converted item set {} into recipe {}", set_id, recipe.id);
        Ok(recipe)
    }

    pub async fn update(&self, recipe_id: u32, draft: RecipeDraft, actor: &Actor) -> DomainResult<Recipe> {
        let mut recipe = self.recipes.get(recipe_id).await?;
        recipe.check_creator(actor)?;
        draft.validate()?;

        recipe.apply(draft);
        self.recipes.update(&recipe).await
    }

    pub async fn delete(&self, recipe_id: u32, actor: &Actor) -> DomainResult<()> {
        let recipe = self.recipes.get(recipe_id).await?;
        recipe.check_creator(actor)?;
        self.recipes.delete(recipe_id).await?;
        log::info!("User {} deleted recipe {}", actor.username, recipe_id);
        Ok(())
    }
}
