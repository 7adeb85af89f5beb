//! Service Layer
//!
//! Business operations on top of the repositories: the item lifecycle, the
//! item-set reconciler, the list aggregator that drives both, and recipes.

mod analytics;
mod attachments;
mod identity;
mod list_locks;
mod lifecycle;
mod reconciler;
mod aggregator;
mod repair;
mod recipes;


pub use analytics::ActivitySink;
pub use attachments::{AttachmentStore, FsAttachmentStore, StoredFile};
pub use identity::{IdentityProvider, TokenIdentity};
pub use list_locks::ListLocks;
pub use lifecycle::ItemLifecycle;
pub use reconciler::ItemSetReconciler;
pub use aggregator::ShoppingListService;
pub use repair::{spawn_repair_task, RepairReport, RepairService};
pub use recipes::RecipeService;
