//! User Commands
//!
//! List sharing and account removal.

use crate::domain::{Actor, DomainResult, User};
use crate::AppState;

/// Resolve the caller
pub async fn whoami(state: &AppState, credential: &str) -> DomainResult<Actor> {
    state.identity.resolve(credential).await
}

pub async fn list_users(state: &AppState, credential: &str, list_id: u32) -> DomainResult<Vec<User>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.list_users(list_id, &actor).await
}

/// Share a list with another user
pub async fn add_list_user(state: &AppState, credential: &str, list_id: u32, username: String) -> DomainResult<User> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.add_user(list_id, &username, &actor).await
}

pub async fn remove_list_user(state: &AppState, credential: &str, list_id: u32, user_id: u32) -> DomainResult<()> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.remove_user(list_id, user_id, &actor).await
}

/// Leave every list and delete the caller's user record
pub async fn delete_account(state: &AppState, credential: &str) -> DomainResult<()> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.remove_user_everywhere(actor.user_id).await?;
    log::info!("Deleted user {} ({})", actor.user_id, actor.username);
    Ok(())
}
