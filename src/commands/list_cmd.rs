//! List Commands
//!
//! List CRUD, sorted item listing and unchecked counters.

use std::collections::BTreeMap;

use crate::domain::{DomainResult, ItemSort, ShoppingItem, ShoppingList, SortDirection};
use crate::AppState;

/// Create a list owned by the caller
pub async fn create_list(state: &AppState, credential: &str, name: String) -> DomainResult<ShoppingList> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.create_list(&name, &actor).await
}

pub async fn get_list(state: &AppState, credential: &str, list_id: u32) -> DomainResult<ShoppingList> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.get_list(list_id, &actor).await
}

/// Lists the caller is a member of
pub async fn list_lists(state: &AppState, credential: &str) -> DomainResult<Vec<ShoppingList>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.lists_for(&actor).await
}

pub async fn rename_list(state: &AppState, credential: &str, list_id: u32, name: String) -> DomainResult<ShoppingList> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.rename_list(list_id, &name, &actor).await
}

/// Delete a list together with its items
pub async fn delete_list(state: &AppState, credential: &str, list_id: u32) -> DomainResult<()> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.delete_list(list_id, &actor).await
}

pub async fn list_items(
    state: &AppState,
    credential: &str,
    list_id: u32,
    sort: ItemSort,
    direction: SortDirection,
) -> DomainResult<Vec<ShoppingItem>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.list_items(list_id, sort, direction, &actor).await
}

/// Unchecked item count per list the caller belongs to
pub async fn unchecked_counts(state: &AppState, credential: &str) -> DomainResult<BTreeMap<u32, usize>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.unchecked_counts_for(&actor).await
}
