//! Domain Layer
//!
//! Contains all domain entities and core abstractions.

mod entity;
mod shopping_item;
mod item_set;
mod shopping_list;
mod user;
mod activity;
mod recipe;
mod file_id;

pub use entity::{Entity, DomainError, DomainResult, now_millis, validate_amount};
pub use shopping_item::{ShoppingItem, ItemDraft, ItemPatch, ItemInput, ItemSort, SortDirection};
pub use item_set::{ItemSet, ItemSetItem, ItemSetDraft};
pub use shopping_list::ShoppingList;
pub use user::{User, Actor};
pub use activity::{ItemActivity, ActivityAction, ActivityFilter};
pub use recipe::{Recipe, RecipeDraft};
pub use file_id::FileIdentifier;
