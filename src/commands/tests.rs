//! Command Tests
//!
//! Drive the JSON dispatcher the way a client would.

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::config::{AppConfig, UserConfig};
use crate::repository::{init_db, UserRepository};
use crate::AppState;
use super::*;

async fn setup() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        attachments_dir: dir.path().join("attachments"),
        users: vec![
            UserConfig { username: "anna".into(), token: "t-anna".into() },
            UserConfig { username: "ben".into(), token: "t-ben".into() },
        ],
        ..AppConfig::default()
    };

    let db = init_db(&PathBuf::from(":memory:")).await.expect("Failed to init test DB");
    let users = UserRepository::new(db.connection());
    for user in &config.users {
        users.ensure(&user.username).await.unwrap();
    }
    (AppState::new(db, &config), dir)
}

async fn call(state: &AppState, credential: &str, cmd: &str, args: Value) -> Response {
    let request = if args.is_null() {
        json!({"cmd": cmd})
    } else {
        json!({"cmd": cmd, "args": args})
    };
    let line = json!({"id": cmd, "credential": credential, "request": request});
    handle_line(state, &line.to_string()).await
}

async fn ok(state: &AppState, credential: &str, cmd: &str, args: Value) -> Value {
    let response = call(state, credential, cmd, args).await;
    assert!(response.is_ok(), "{} failed: {:?}", cmd, response.error);
    response.data.unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_groceries_flow_over_dispatch() {
    let (state, _dir) = setup().await;

    let list = ok(&state, "Bearer t-anna", "create_list", json!({"name": "Groceries"})).await;
    let list_id = list["id"].as_u64().unwrap();
    assert_eq!(list["itemIds"], json!([]));

    let set = ok(
        &state,
        "t-anna",
        "create_item_set",
        json!({
            "list_id": list_id,
            "item_set": {
                "name": "Groceries",
                "items": [
                    {"name": "Milk", "amount": 2, "unit": "L"},
                    {"name": "Eggs", "amount": 12, "unit": "pcs"}
                ]
            }
        }),
    )
    .await;
    let set_id = set["id"].as_u64().unwrap();

    let counts = ok(&state, "t-anna", "unchecked_counts", Value::Null).await;
    assert_eq!(counts[list_id.to_string()], json!(0));

    let applied = ok(&state, "t-anna", "apply_item_set", json!({"list_id": list_id, "set_id": set_id})).await;
    assert_eq!(applied[0]["amount"], json!(2.0));
    assert_eq!(applied[1]["checked"], json!(false));

    let items = ok(
        &state,
        "t-anna",
        "list_items",
        json!({"list_id": list_id, "sort": "alphabetical", "direction": "ascending"}),
    )
    .await;
    assert_eq!(items[0]["name"], "Eggs");
    assert_eq!(items[1]["name"], "Milk");

    let retracted = ok(&state, "t-anna", "retract_item_set", json!({"list_id": list_id, "set_id": set_id})).await;
    for item in retracted.as_array().unwrap() {
        assert_eq!(item["amount"], json!(0.0));
        assert_eq!(item["checked"], json!(true));
    }
}

#[tokio::test]
async fn test_errors_carry_status_codes() {
    let (state, _dir) = setup().await;

    let denied = call(&state, "wrong", "create_list", json!({"name": "x"})).await;
    assert_eq!(denied.status, 403);
    assert!(matches!(denied.error, Some(crate::domain::DomainError::PermissionDenied(_))));

    let missing = call(&state, "t-anna", "get_list", json!({"list_id": 42})).await;
    assert_eq!(missing.status, 404);

    let list = ok(&state, "t-anna", "create_list", json!({"name": "Private"})).await;
    let foreign = call(&state, "t-ben", "get_list", json!({"list_id": list["id"]})).await;
    assert_eq!(foreign.status, 403);

    let draft = json!({"list_id": list["id"], "item_set": {"name": "Weekly", "items": []}});
    ok(&state, "t-anna", "create_item_set", draft.clone()).await;
    let conflict = call(&state, "t-anna", "create_item_set", draft).await;
    assert_eq!(conflict.status, 409);

    let malformed = handle_line(&state, "{not json").await;
    assert_eq!(malformed.status, 400);
    assert!(malformed.id.is_none());

    let negative = call(
        &state,
        "t-anna",
        "create_item_set",
        json!({"list_id": list["id"], "item_set": {"name": "Bad", "items": [{"name": "Milk", "amount": -1}]}}),
    )
    .await;
    assert_eq!(negative.status, 400);
}

#[tokio::test]
async fn test_sharing_and_activity() {
    let (state, _dir) = setup().await;
    let list = ok(&state, "t-anna", "create_list", json!({"name": "Shared"})).await;
    let list_id = list["id"].clone();

    let ben = ok(&state, "t-anna", "add_list_user", json!({"list_id": list_id, "username": "ben"})).await;
    assert_eq!(ben["username"], "ben");

    let item = ok(&state, "t-ben", "add_item", json!({"list_id": list_id, "item": {"name": "Coffee"}})).await;
    ok(&state, "t-ben", "add_item", json!({"list_id": list_id, "item": {"id": item["id"]}})).await;
    let checked = ok(
        &state,
        "t-ben",
        "set_item_checked",
        json!({"list_id": list_id, "item_id": item["id"], "checked": true}),
    )
    .await;
    assert_eq!(checked["amount"], json!(0.0));
    assert_eq!(checked["editedBy"], "ben");

    let events = ok(&state, "t-anna", "query_activity", json!({"filter": {"listId": list_id}})).await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["name"], "Coffee");
    assert_eq!(events[0]["amount"], json!(1.0));

    let names = ok(&state, "t-anna", "activity_names", json!({"list_id": list_id})).await;
    assert_eq!(names, json!(["Coffee"]));

    let users = ok(&state, "t-anna", "list_users", json!({"list_id": list_id})).await;
    assert_eq!(users.as_array().unwrap().len(), 2);

    ok(&state, "t-ben", "delete_account", Value::Null).await;
    let denied = call(&state, "t-ben", "whoami", Value::Null).await;
    assert_eq!(denied.status, 403);
}

#[tokio::test]
async fn test_receipt_upload_and_download() {
    let (state, _dir) = setup().await;
    let list = ok(&state, "t-anna", "create_list", json!({"name": "Groceries"})).await;
    let set = ok(
        &state,
        "t-anna",
        "create_item_set",
        json!({"list_id": list["id"], "item_set": {"name": "Weekly"}}),
    )
    .await;
    let ids = json!({"list_id": list["id"], "set_id": set["id"]});

    let none = call(&state, "t-anna", "download_receipt", ids.clone()).await;
    assert_eq!(none.status, 404);

    // "receipt" in base64
    let updated = ok(
        &state,
        "t-anna",
        "upload_receipt",
        json!({"list_id": list["id"], "set_id": set["id"], "filename": "r.png", "data": "cmVjZWlwdA=="}),
    )
    .await;
    assert!(updated["receiptFileId"].is_string());

    let receipt = ok(&state, "t-anna", "download_receipt", ids.clone()).await;
    assert_eq!(receipt["data"], "cmVjZWlwdA==");
    assert_eq!(receipt["file"]["contentType"], "image/png");

    let bad = call(
        &state,
        "t-anna",
        "upload_receipt",
        json!({"list_id": list["id"], "set_id": set["id"], "filename": "r.png", "data": "%%%"}),
    )
    .await;
    assert_eq!(bad.status, 400);

    ok(&state, "t-anna", "delete_item_set", ids).await;
    let report = ok(&state, "t-anna", "run_repair", Value::Null).await;
    assert_eq!(report["danglingItemSetIds"], json!(0));
}

#[tokio::test]
async fn test_rejected_receipt_upload_writes_no_file() {
    let (state, dir) = setup().await;
    let list = ok(&state, "t-anna", "create_list", json!({"name": "Private"})).await;
    let set = ok(
        &state,
        "t-anna",
        "create_item_set",
        json!({"list_id": list["id"], "item_set": {"name": "Weekly"}}),
    )
    .await;

    let denied = call(
        &state,
        "t-ben",
        "upload_receipt",
        json!({"list_id": list["id"], "set_id": set["id"], "filename": "r.png", "data": "cmVjZWlwdA=="}),
    )
    .await;
    assert_eq!(denied.status, 403);

    let unknown_set = call(
        &state,
        "t-anna",
        "upload_receipt",
        json!({"list_id": list["id"], "set_id": 999, "filename": "r.png", "data": "cmVjZWlwdA=="}),
    )
    .await;
    assert_eq!(unknown_set.status, 404);

    let attachments = dir.path().join("attachments");
    let stored = std::fs::read_dir(&attachments).map(|entries| entries.count()).unwrap_or(0);
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_recipes_over_dispatch() {
    let (state, _dir) = setup().await;
    let list = ok(&state, "t-anna", "create_list", json!({"name": "Kitchen"})).await;
    let set = ok(
        &state,
        "t-anna",
        "create_item_set",
        json!({"list_id": list["id"], "item_set": {"name": "Pancakes", "items": [{"name": "Flour", "amount": 0.5, "unit": "kg"}]}}),
    )
    .await;

    let recipe = ok(&state, "t-anna", "convert_item_set", json!({"list_id": list["id"], "set_id": set["id"]})).await;
    assert_eq!(recipe["name"], "Pancakes");
    assert_eq!(recipe["items"][0]["itemId"], Value::Null);

    let twice = call(&state, "t-anna", "convert_item_set", json!({"list_id": list["id"], "set_id": set["id"]})).await;
    assert_eq!(twice.status, 409);

    let edit = json!({"recipe_id": recipe["id"], "recipe": {"name": "Crepes", "instructions": ["Whisk"]}});
    let foreign = call(&state, "t-ben", "update_recipe", edit.clone()).await;
    assert_eq!(foreign.status, 403);
    let updated = ok(&state, "t-anna", "update_recipe", edit).await;
    assert_eq!(updated["instructions"], json!(["Whisk"]));

    ok(&state, "t-ben", "create_recipe", json!({"recipe": {"name": "Soup"}})).await;
    let annas = ok(&state, "t-anna", "list_recipes", Value::Null).await;
    assert_eq!(annas.as_array().unwrap().len(), 1);

    let denied = call(&state, "t-ben", "delete_recipe", json!({"recipe_id": recipe["id"]})).await;
    assert_eq!(denied.status, 403);
    ok(&state, "t-anna", "delete_recipe", json!({"recipe_id": recipe["id"]})).await;
    assert_eq!(ok(&state, "t-anna", "list_recipes", Value::Null).await, json!([]));
}
