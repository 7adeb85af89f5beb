//! Item Set Commands
//!
//! Set CRUD, bulk and single-entry apply/retract, receipts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, ItemSet, ItemSetDraft, ItemSetItem, ShoppingItem};
use crate::service::StoredFile;
use crate::AppState;

/// Receipt file with base64 content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub file: StoredFile,
    pub data: String,
}

pub async fn list_item_sets(state: &AppState, credential: &str, list_id: u32) -> DomainResult<Vec<ItemSet>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.list_item_sets(list_id, &actor).await
}

pub async fn create_item_set(state: &AppState, credential: &str, list_id: u32, draft: ItemSetDraft) -> DomainResult<ItemSet> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.create_item_set(list_id, draft, &actor).await
}

pub async fn update_item_set(
    state: &AppState,
    credential: &str,
    list_id: u32,
    set_id: u32,
    draft: ItemSetDraft,
) -> DomainResult<ItemSet> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.update_item_set(list_id, set_id, draft, &actor).await
}

/// Delete a set; its items stay on the list
pub async fn delete_item_set(state: &AppState, credential: &str, list_id: u32, set_id: u32) -> DomainResult<()> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.delete_item_set(list_id, set_id, &actor).await
}

pub async fn apply_item_set(state: &AppState, credential: &str, list_id: u32, set_id: u32) -> DomainResult<Vec<ShoppingItem>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.apply_item_set(list_id, set_id, &actor).await
}

pub async fn retract_item_set(state: &AppState, credential: &str, list_id: u32, set_id: u32) -> DomainResult<Vec<ShoppingItem>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.retract_item_set(list_id, set_id, &actor).await
}

pub async fn apply_entry(state: &AppState, credential: &str, list_id: u32, entry: ItemSetItem) -> DomainResult<ShoppingItem> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.apply_entry(list_id, entry, &actor).await
}

pub async fn retract_entry(state: &AppState, credential: &str, list_id: u32, entry: ItemSetItem) -> DomainResult<ShoppingItem> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.retract_entry(list_id, entry, &actor).await
}

/// Store a receipt and attach it to the set
pub async fn upload_receipt(
    state: &AppState,
    credential: &str,
    list_id: u32,
    set_id: u32,
    filename: String,
    data: String,
) -> DomainResult<ItemSet> {
    let actor = state.identity.resolve(credential).await?;
    let bytes = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| DomainError::InvalidInput(format!("Receipt is not valid base64: {}", e)))?;

    state.lists.attach_receipt(list_id, set_id, &bytes, &filename, &actor).await
}

pub async fn download_receipt(state: &AppState, credential: &str, list_id: u32, set_id: u32) -> DomainResult<ReceiptPayload> {
    let actor = state.identity.resolve(credential).await?;
    let file_id = state.lists.receipt_of(list_id, set_id, &actor).await?;
    let (file, bytes) = state.attachments.load(&file_id).await?;
    Ok(ReceiptPayload {
        file,
        data: STANDARD.encode(bytes),
    })
}
