//! Item Commands
//!
//! Single-item operations on a list.

use crate::domain::{DomainResult, ItemInput, ItemPatch, ShoppingItem};
use crate::AppState;

/// Add a new item, or bump/re-activate an existing one
pub async fn add_item(state: &AppState, credential: &str, list_id: u32, input: ItemInput) -> DomainResult<ShoppingItem> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.add_item(list_id, input, &actor).await
}

/// Partial update
pub async fn update_item(state: &AppState, credential: &str, list_id: u32, patch: ItemPatch) -> DomainResult<ShoppingItem> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.update_item(list_id, patch, &actor).await
}

pub async fn set_item_checked(
    state: &AppState,
    credential: &str,
    list_id: u32,
    item_id: u32,
    checked: bool,
) -> DomainResult<ShoppingItem> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.set_checked(list_id, item_id, checked, &actor).await
}

/// Decrease amount by one (checks the item when nothing is left)
pub async fn remove_one(state: &AppState, credential: &str, list_id: u32, item_id: u32) -> DomainResult<ShoppingItem> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.remove_one(list_id, item_id, &actor).await
}

pub async fn delete_item(state: &AppState, credential: &str, list_id: u32, item_id: u32) -> DomainResult<()> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.delete_item(list_id, item_id, &actor).await
}
