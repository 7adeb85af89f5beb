//! Repository Layer
//!
//! Data access abstractions and SQLite implementations.

mod traits;
mod db;
mod item_repo;
mod item_set_repo;
mod list_repo;
mod user_repo;
mod activity_repo;
mod recipe_repo;

#[cfg(test)]
mod tests;

pub use traits::Repository;
pub use db::{init_db, DbState, SharedConnection};
pub use item_repo::ItemRepository;
pub use item_set_repo::ItemSetRepository;
pub use list_repo::ListRepository;
pub use user_repo::UserRepository;
pub use activity_repo::ActivityRepository;
pub use recipe_repo::RecipeRepository;
