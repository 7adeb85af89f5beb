//! Repository Integration Tests
//!
//! Tests for the SQLite repositories with an in-memory database.

use std::path::PathBuf;

use crate::domain::{
    ActivityAction, ActivityFilter, DomainError, ItemActivity, ItemSet, ItemSetItem, Recipe,
    RecipeDraft, ShoppingItem, ShoppingList,
};
use crate::repository::{
    init_db, ActivityRepository, ItemRepository, ItemSetRepository, ListRepository,
    RecipeRepository, Repository, UserRepository,
};

async fn setup_test_db() -> crate::repository::SharedConnection {
    let db_path = PathBuf::from(":memory:");
    let db_state = init_db(&db_path).await.expect("Failed to init test DB");
    db_state.connection()
}

fn item(name: &str) -> ShoppingItem {
    ShoppingItem {
        id: 0,
        name: name.to_string(),
        tags: vec![],
        amount: 0.0,
        unit: String::new(),
        checked: false,
        checked_at: None,
        note: String::new(),
        edited_at: 0,
        edited_by: "tester".to_string(),
    }
}

#[tokio::test]
async fn test_create_item() {
    let repo = ItemRepository::new(setup_test_db().await);

    let created = repo.create(&item("Milk")).await.expect("Failed to create");

    assert!(created.id > 0);
    assert_eq!(created.name, "Milk");
    assert!(!created.checked);
}

#[tokio::test]
async fn test_item_roundtrip_keeps_fields() {
    let repo = ItemRepository::new(setup_test_db().await);

    let mut draft = item("Flour");
    draft.tags = vec!["baking".to_string(), "dry".to_string()];
    draft.amount = 1.5;
    draft.unit = "kg".to_string();
    draft.checked = true;
    draft.checked_at = Some(42);
    draft.note = "type 405".to_string();
    let created = repo.create(&draft).await.unwrap();

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_update_missing_item_is_not_found() {
    let repo = ItemRepository::new(setup_test_db().await);

    let mut ghost = item("Ghost");
    ghost.id = 99;
    let err = repo.update(&ghost).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_get_reports_not_found() {
    let repo = ItemRepository::new(setup_test_db().await);
    let err = repo.get(5).await.unwrap_err();
    assert_eq!(err, DomainError::NotFound("Item 5 not found".to_string()));
}

#[tokio::test]
async fn test_delete_item() {
    let repo = ItemRepository::new(setup_test_db().await);

    let created = repo.create(&item("To delete")).await.unwrap();
    repo.delete(created.id).await.expect("Delete failed");

    assert!(repo.find_by_id(created.id).await.unwrap().is_none());
    // Deleting again is a no-op
    repo.delete(created.id).await.expect("Second delete failed");
}

#[tokio::test]
async fn test_find_by_ids_keeps_order_and_skips_missing() {
    let repo = ItemRepository::new(setup_test_db().await);

    let a = repo.create(&item("A")).await.unwrap();
    let b = repo.create(&item("B")).await.unwrap();
    let c = repo.create(&item("C")).await.unwrap();

    let found = repo.find_by_ids(&[c.id, 999, a.id, b.id]).await.unwrap();
    let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);

    assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_membership_roundtrip() {
    let repo = ListRepository::new(setup_test_db().await);

    let mut list = ShoppingList::new(0, "Weekly".to_string(), 1000);
    list.user_ids = vec![1];
    let mut created = repo.create(&list).await.unwrap();

    created.add_item(3);
    created.add_item(1);
    created.add_item_set(8);
    repo.update(&created).await.unwrap();

    let found = repo.get(created.id).await.unwrap();
    assert_eq!(found.item_ids, vec![3, 1]);
    assert_eq!(found.item_set_ids, vec![8]);
    assert_eq!(found.created_at, 1000);

    assert_eq!(repo.list_for_user(1).await.unwrap().len(), 1);
    assert!(repo.list_for_user(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_item_set_roundtrip() {
    let repo = ItemSetRepository::new(setup_test_db().await);

    let mut entry = ItemSetItem::new("Eggs", 12.0, "pcs");
    entry.item_id = Some(4);
    entry.tmp_id = "tmp-1".to_string();
    let mut set = ItemSet::new(0, "Breakfast".to_string(), vec![entry]);
    set.receipt_file_id = Some("abc".to_string());

    let created = repo.create(&set).await.unwrap();
    let found = repo.get(created.id).await.unwrap();
    assert_eq!(found, created);
    assert_eq!(found.items[0].item_id, Some(4));
}

#[tokio::test]
async fn test_count_sets_with_receipt() {
    let repo = ItemSetRepository::new(setup_test_db().await);

    for name in ["A", "B", "C"] {
        let mut set = ItemSet::new(0, name.to_string(), vec![]);
        if name != "C" {
            set.receipt_file_id = Some("abc".to_string());
        }
        repo.create(&set).await.unwrap();
    }

    assert_eq!(repo.count_with_receipt("abc").await.unwrap(), 2);
    assert_eq!(repo.count_with_receipt("def").await.unwrap(), 0);
}

#[tokio::test]
async fn test_recipes_by_creator_and_source() {
    let repo = RecipeRepository::new(setup_test_db().await);

    let set = ItemSet::new(9, "Pancakes".to_string(), vec![ItemSetItem::new("Milk", 0.5, "L")]);
    let converted = repo.create(&Recipe::from_item_set(&set, 1, 10)).await.unwrap();
    let draft = RecipeDraft {
        name: "Soup".into(),
        instructions: vec!["Boil".into()],
        categories: vec!["winter".into()],
        ..Default::default()
    };
    repo.create(&Recipe::from_draft(draft, 2, 20)).await.unwrap();

    assert_eq!(repo.get(converted.id).await.unwrap(), converted);
    let annas = repo.list_by_creator(1).await.unwrap();
    assert_eq!(annas.len(), 1);
    assert_eq!(annas[0].name, "Pancakes");
    assert_eq!(repo.list_by_creator(2).await.unwrap()[0].instructions, vec!["Boil"]);

    assert!(repo.exists_for_item_set(1, 9).await.unwrap());
    assert!(!repo.exists_for_item_set(2, 9).await.unwrap());
}

#[tokio::test]
async fn test_users_are_unique() {
    let repo = UserRepository::new(setup_test_db().await);

    let anna = repo.create("anna").await.unwrap();
    let err = repo.create("anna").await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let ensured = repo.ensure("anna").await.unwrap();
    assert_eq!(ensured.id, anna.id);

    let ben = repo.ensure("ben").await.unwrap();
    let users = repo.find_by_ids(&[ben.id, 77, anna.id]).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].username, "ben");
}

#[tokio::test]
async fn test_activity_filters() {
    let repo = ActivityRepository::new(setup_test_db().await);

    let mut milk = item("Milk");
    milk.id = 1;
    let mut bread = item("Bread");
    bread.id = 2;

    repo.insert(&ItemActivity::record(1, 10, &milk, ActivityAction::Checked, 100)).await.unwrap();
    repo.insert(&ItemActivity::record(1, 11, &bread, ActivityAction::Checked, 200)).await.unwrap();
    repo.insert(&ItemActivity::record(1, 10, &milk, ActivityAction::Checked, 300)).await.unwrap();
    repo.insert(&ItemActivity::record(2, 10, &milk, ActivityAction::Checked, 400)).await.unwrap();

    assert_eq!(repo.query(&ActivityFilter::for_list(1)).await.unwrap().len(), 3);

    let mut by_user = ActivityFilter::for_list(1);
    by_user.user_id = Some(10);
    assert_eq!(repo.query(&by_user).await.unwrap().len(), 2);

    let mut windowed = ActivityFilter::for_list(1);
    windowed.from = Some(150);
    windowed.to = Some(300);
    let found = repo.query(&windowed).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "Bread");

    let mut by_name = ActivityFilter::for_list(1);
    by_name.name = Some("Milk".to_string());
    by_name.to = Some(150);
    assert_eq!(repo.query(&by_name).await.unwrap().len(), 1);

    assert_eq!(repo.names(1).await.unwrap(), vec!["Bread".to_string(), "Milk".to_string()]);
}
