//! Recipe Commands

use crate::domain::{DomainResult, Recipe, RecipeDraft};
use crate::AppState;

/// Recipes the caller created
pub async fn list_recipes(state: &AppState, credential: &str) -> DomainResult<Vec<Recipe>> {
    let actor = state.identity.resolve(credential).await?;
    state.recipes.recipes_for(&actor).await
}

pub async fn create_recipe(state: &AppState, credential: &str, recipe: RecipeDraft) -> DomainResult<Recipe> {
    let actor = state.identity.resolve(credential).await?;
    state.recipes.create(recipe, &actor).await
}

pub async fn convert_item_set(state: &AppState, credential: &str, list_id: u32, set_id: u32) -> DomainResult<Recipe> {
    let actor = state.identity.resolve(credential).await?;
    state.recipes.convert_item_set(list_id, set_id, &actor).await
}

pub async fn update_recipe(state: &AppState, credential: &str, recipe_id: u32, recipe: RecipeDraft) -> DomainResult<Recipe> {
    let actor = state.identity.resolve(credential).await?;
    state.recipes.update(recipe_id, recipe, &actor).await
}

pub async fn delete_recipe(state: &AppState, credential: &str, recipe_id: u32) -> DomainResult<()> {
    let actor = state.identity.resolve(credential).await?;
    state.recipes.delete(recipe_id, &actor).await
}
