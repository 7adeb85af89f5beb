//! ShopList Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and SQLite implementations
//! - service: Item lifecycle, item-set reconciliation, list aggregation, recipes
//! - commands: Request handlers and the JSON dispatcher

use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod domain;
pub mod repository;
pub mod service;
pub mod commands;

use config::AppConfig;
use domain::DomainResult;
use repository::{
    init_db, ActivityRepository, DbState, ItemRepository, ItemSetRepository, ListRepository,
    RecipeRepository, UserRepository,
};
use service::{
    AttachmentStore, FsAttachmentStore, IdentityProvider, ItemLifecycle, ItemSetReconciler,
    ListLocks, RecipeService, RepairService, ShoppingListService, TokenIdentity,
};

/// Application state shared across commands
pub struct AppState {
    pub db_state: DbState,
    pub identity: Arc<dyn IdentityProvider>,
    pub lists: Arc<ShoppingListService>,
    pub recipes: RecipeService,
    pub activity: Arc<ActivityRepository>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub repair: Arc<RepairService>,
}

impl AppState {
    /// Wire repositories and services onto an initialized database
    pub fn new(db_state: DbState, config: &AppConfig) -> Self {
        let conn = db_state.connection();
        let items = Arc::new(ItemRepository::new(conn.clone()));
        let sets = Arc::new(ItemSetRepository::new(conn.clone()));
        let lists = Arc::new(ListRepository::new(conn.clone()));
        let users = Arc::new(UserRepository::new(conn.clone()));
        let activity = Arc::new(ActivityRepository::new(conn.clone()));
        let recipes = Arc::new(RecipeRepository::new(conn));
        let attachments: Arc<dyn AttachmentStore> =
            Arc::new(FsAttachmentStore::new(config.attachments_dir.clone()));
        let locks = Arc::new(ListLocks::new());

        let lifecycle = Arc::new(ItemLifecycle::new(items.clone(), activity.clone()));
        let reconciler = ItemSetReconciler::new(lifecycle.clone(), sets.clone(), config.bulk_merge_unit);
        let repair = Arc::new(RepairService::new(
            lists.clone(),
            items,
            sets.clone(),
            locks.clone(),
            Duration::from_secs(config.orphan_grace_secs),
        ));

        let identity: Arc<dyn IdentityProvider> =
            Arc::new(TokenIdentity::new(config.token_map(), users.clone()));
        let lists = Arc::new(ShoppingListService::new(
            lists,
            users,
            sets,
            lifecycle,
            reconciler,
            attachments.clone(),
            locks,
        ));

        Self {
            db_state,
            identity,
            recipes: RecipeService::new(recipes, lists.clone()),
            lists,
            activity,
            attachments,
            repair,
        }
    }
}

/// Open the database, seed configured users and build the state
pub async fn build_state(config: &AppConfig) -> Result<AppState, String> {
    let db_state = init_db(&config.db_path).await?;
    seed_users(&db_state, config)
        .await
        .map_err(|e| format!("Failed to seed users: {}", e))?;
    Ok(AppState::new(db_state, config))
}

async fn seed_users(db_state: &DbState, config: &AppConfig) -> DomainResult<()> {
    let users = UserRepository::new(db_state.connection());
    for user in &config.users {
        users.ensure(&user.username).await?;
    }
    log::info!("Seeded {} configured users", config.users.len());
    Ok(())
}
