//! JSON Request Dispatcher
//!
//! Maps one JSON request envelope onto the matching command handler:
//!
//! ```json
//! {"id": 1, "credential": "Bearer t", "request": {"cmd": "create_list", "args": {"name": "Groceries"}}}
//! ```
//!
//! Every reply carries the request id, an HTTP-style status and either the
//! handler's result or the `DomainError`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    ActivityFilter, DomainError, DomainResult, ItemInput, ItemPatch, ItemSetDraft, ItemSetItem,
    ItemSort, RecipeDraft, SortDirection,
};
use crate::AppState;
use super::*;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum Request {
    // Lists
    CreateList { name: String },
    GetList { list_id: u32 },
    ListLists,
    RenameList { list_id: u32, name: String },
    DeleteList { list_id: u32 },
    ListItems {
        list_id: u32,
        #[serde(default)]
        sort: ItemSort,
        #[serde(default)]
        direction: SortDirection,
    },
    UncheckedCounts,
    // Items
    AddItem { list_id: u32, item: ItemInput },
    UpdateItem { list_id: u32, item: ItemPatch },
    SetItemChecked { list_id: u32, item_id: u32, checked: bool },
    RemoveOne { list_id: u32, item_id: u32 },
    DeleteItem { list_id: u32, item_id: u32 },
    // Item sets
    ListItemSets { list_id: u32 },
    CreateItemSet { list_id: u32, item_set: ItemSetDraft },
    UpdateItemSet { list_id: u32, set_id: u32, item_set: ItemSetDraft },
    DeleteItemSet { list_id: u32, set_id: u32 },
    ApplyItemSet { list_id: u32, set_id: u32 },
    RetractItemSet { list_id: u32, set_id: u32 },
    ApplyEntry { list_id: u32, entry: ItemSetItem },
    RetractEntry { list_id: u32, entry: ItemSetItem },
    UploadReceipt { list_id: u32, set_id: u32, filename: String, data: String },
    DownloadReceipt { list_id: u32, set_id: u32 },
    // Users
    Whoami,
    ListUsers { list_id: u32 },
    AddListUser { list_id: u32, username: String },
    RemoveListUser { list_id: u32, user_id: u32 },
    DeleteAccount,
    // Recipes
    ListRecipes,
    CreateRecipe { recipe: RecipeDraft },
    ConvertItemSet { list_id: u32, set_id: u32 },
    UpdateRecipe { recipe_id: u32, recipe: RecipeDraft },
    DeleteRecipe { recipe_id: u32 },
    // Activity
    QueryActivity { filter: ActivityFilter },
    ActivityNames { list_id: u32 },
    RunRepair,
    RecentLogs {
        #[serde(default = "default_log_lines")]
        lines: usize,
    },
}

fn default_log_lines() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub credential: String,
    pub request: Request,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: Option<Value>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DomainError>,
}

impl Response {
    fn from_result(id: Option<Value>, result: DomainResult<Value>) -> Self {
        match result {
            Ok(data) => Self {
                id,
                status: 200,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                id,
                status: error.status_code(),
                data: None,
                error: Some(error),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn to_value<T: Serialize>(result: DomainResult<T>) -> DomainResult<Value> {
    Ok(serde_json::to_value(result?)?)
}

/// Parse one line of JSON and run it
pub async fn handle_line(state: &AppState, line: &str) -> Response {
    match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => dispatch(state, envelope).await,
        Err(e) => Response::from_result(
            None,
            Err(DomainError::InvalidInput(format!("Malformed request: {}", e))),
        ),
    }
}

pub async fn dispatch(state: &AppState, envelope: Envelope) -> Response {
    let Envelope { id, credential, request } = envelope;
    let cred = credential.as_str();

    let result = match request {
        Request::CreateList { name } => to_value(create_list(state, cred, name).await),
        Request::GetList { list_id } => to_value(get_list(state, cred, list_id).await),
        Request::ListLists => to_value(list_lists(state, cred).await),
        Request::RenameList { list_id, name } => to_value(rename_list(state, cred, list_id, name).await),
        Request::DeleteList { list_id } => to_value(delete_list(state, cred, list_id).await),
        Request::ListItems { list_id, sort, direction } => {
            to_value(list_items(state, cred, list_id, sort, direction).await)
        }
        Request::UncheckedCounts => to_value(unchecked_counts(state, cred).await),

        Request::AddItem { list_id, item } => to_value(add_item(state, cred, list_id, item).await),
        Request::UpdateItem { list_id, item } => to_value(update_item(state, cred, list_id, item).await),
        Request::SetItemChecked { list_id, item_id, checked } => {
            to_value(set_item_checked(state, cred, list_id, item_id, checked).await)
        }
        Request::RemoveOne { list_id, item_id } => to_value(remove_one(state, cred, list_id, item_id).await),
        Request::DeleteItem { list_id, item_id } => to_value(delete_item(state, cred, list_id, item_id).await),

        Request::ListItemSets { list_id } => to_value(list_item_sets(state, cred, list_id).await),
        Request::CreateItemSet { list_id, item_set } => {
            to_value(create_item_set(state, cred, list_id, item_set).await)
        }
        Request::UpdateItemSet { list_id, set_id, item_set } => {
            to_value(update_item_set(state, cred, list_id, set_id, item_set).await)
        }
        Request::DeleteItemSet { list_id, set_id } => to_value(delete_item_set(state, cred, list_id, set_id).await),
        Request::ApplyItemSet { list_id, set_id } => to_value(apply_item_set(state, cred, list_id, set_id).await),
        Request::RetractItemSet { list_id, set_id } => {
            to_value(retract_item_set(state, cred, list_id, set_id).await)
        }
        Request::ApplyEntry { list_id, entry } => to_value(apply_entry(state, cred, list_id, entry).await),
        Request::RetractEntry { list_id, entry } => to_value(retract_entry(state, cred, list_id, entry).await),
        Request::UploadReceipt { list_id, set_id, filename, data } => {
            to_value(upload_receipt(state, cred, list_id, set_id, filename, data).await)
        }
        Request::DownloadReceipt { list_id, set_id } => {
            to_value(download_receipt(state, cred, list_id, set_id).await)
        }

        Request::Whoami => to_value(whoami(state, cred).await),
        Request::ListUsers { list_id } => to_value(list_users(state, cred, list_id).await),
        Request::AddListUser { list_id, username } => {
            to_value(add_list_user(state, cred, list_id, username).await)
        }
        Request::RemoveListUser { list_id, user_id } => {
            to_value(remove_list_user(state, cred, list_id, user_id).await)
        }
        Request::DeleteAccount => to_value(delete_account(state, cred).await),

        Request::ListRecipes => to_value(list_recipes(state, cred).await),
        Request::CreateRecipe { recipe } => to_value(create_recipe(state, cred, recipe).await),
        Request::ConvertItemSet { list_id, set_id } => {
            to_value(convert_item_set(state, cred, list_id, set_id).await)
        }
        Request::UpdateRecipe { recipe_id, recipe } => {
            to_value(update_recipe(state, cred, recipe_id, recipe).await)
        }
        Request::DeleteRecipe { recipe_id } => to_value(delete_recipe(state, cred, recipe_id).await),

        Request::QueryActivity { filter } => to_value(query_activity(state, cred, filter).await),
        Request::ActivityNames { list_id } => to_value(activity_names(state, cred, list_id).await),
        Request::RunRepair => to_value(run_repair(state, cred).await),
        Request::RecentLogs { lines } => to_value(recent_logs(state, cred, lines).await),
    };

    if let Err(e) = &result {
        log::debug!("Request {:?} failed: {}", id, e);
    }
    Response::from_result(id, result)
}
