//! Shopping List Service
//!
//! Owns list membership (items, item sets, users) and orchestrates the
//! lifecycle manager and the reconciler. Every mutating operation:
//! 1. takes the list's lock,
//! 2. loads the list and checks that the actor is a member,
//! 3. delegates item work, then persists the membership delta.
//!
//! Item and list writes are separate; a failure between them leaves state
//! that `RepairService` cleans up.

use std::collections::BTreeMap;
use std::sync::Arc;

use pinyin::ToPinyin;
use tokio::sync::Mutex;

use crate::domain::{
    now_millis, Actor, DomainError, DomainResult, ItemInput, ItemPatch, ItemSet, ItemSetDraft,
    ItemSetItem, ItemSort, ShoppingItem, ShoppingList, SortDirection, User,
};
use crate::repository::{ItemSetRepository, ListRepository, Repository, UserRepository};
use super::attachments::AttachmentStore;
use super::lifecycle::ItemLifecycle;
use super::list_locks::ListLocks;
use super::reconciler::ItemSetReconciler;

pub struct ShoppingListService {
    lists: Arc<ListRepository>,
    users: Arc<UserRepository>,
    sets: Arc<ItemSetRepository>,
    lifecycle: Arc<ItemLifecycle>,
    reconciler: ItemSetReconciler,
    attachments: Arc<dyn AttachmentStore>,
    locks: Arc<ListLocks>,
    /// Serializes receipt attach and release across lists
    receipts: Mutex<()>,
}

impl ShoppingListService {
    pub fn new(
        lists: Arc<ListRepository>,
        users: Arc<UserRepository>,
        sets: Arc<ItemSetRepository>,
        lifecycle: Arc<ItemLifecycle>,
        reconciler: ItemSetReconciler,
        attachments: Arc<dyn AttachmentStore>,
        locks: Arc<ListLocks>,
    ) -> Self {
        Self {
            lists,
            users,
            sets,
            lifecycle,
            reconciler,
            attachments,
            locks,
            receipts: Mutex::new(()),
        }
    }

    /// Load a list the actor may access
    async fn load_for(&self, list_id: u32, actor: &Actor) -> DomainResult<ShoppingList> {
        let list = self.lists.get(list_id).await?;
        if !list.has_user(actor.user_id) {
            return Err(DomainError::PermissionDenied(format!(
                "{} is not a member of list {}",
                actor.username, list_id
            )));
        }
        Ok(list)
    }

    fn ensure_item_on(list: &ShoppingList, item_id: u32) -> DomainResult<()> {
        if list.has_item(item_id) {
            Ok(())
        } else {
            Err(DomainError::not_found::<ShoppingItem>(item_id))
        }
    }

    fn ensure_set_on(list: &ShoppingList, set_id: u32) -> DomainResult<()> {
        if list.has_item_set(set_id) {
            Ok(())
        } else {
            Err(DomainError::not_found::<ItemSet>(set_id))
        }
    }

    // ========================
    // Lists
    // ========================

    /// Create a list with the actor as its only member
    pub async fn create_list(&self, name: &str, actor: &Actor) -> DomainResult<ShoppingList> {
        let mut list = ShoppingList::new(0, name.to_string(), now_millis());
        list.add_user(actor.user_id);
        let list = self.lists.create(&list).await?;
        log::info!("{} created list {} '{}'", actor.username, list.id, list.name);
        Ok(list)
    }

    pub async fn get_list(&self, list_id: u32, actor: &Actor) -> DomainResult<ShoppingList> {
        self.load_for(list_id, actor).await
    }

    pub async fn lists_for(&self, actor: &Actor) -> DomainResult<Vec<ShoppingList>> {
        self.lists.list_for_user(actor.user_id).await
    }

    pub async fn rename_list(&self, list_id: u32, name: &str, actor: &Actor) -> DomainResult<ShoppingList> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        list.name = name.to_string();
        self.lists.update(&list).await
    }

    /// Delete the list and every item it owns. Item sets are only referenced
    /// and survive.
    pub async fn delete_list(&self, list_id: u32, actor: &Actor) -> DomainResult<()> {
        let guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;

        for item_id in &list.item_ids {
            self.lifecycle.delete(*item_id).await?;
        }
        self.lists.delete(list_id).await?;

        drop(guard);
        self.locks.forget(list_id);
        log::info!("{} deleted list {} ({} items)", actor.username, list_id, list.item_ids.len());
        Ok(())
    }

    /// Member items, sorted on request
    pub async fn list_items(&self, list_id: u32, sort: ItemSort, direction: SortDirection, actor: &Actor) -> DomainResult<Vec<ShoppingItem>> {
        let list = self.load_for(list_id, actor).await?;
        let mut items = self.lifecycle.items_of(&list.item_ids).await?;
        sort_items(&mut items, sort, direction);
        Ok(items)
    }

    /// Count of unchecked member items for every list, recomputed per call
    pub async fn unchecked_counts(&self) -> DomainResult<BTreeMap<u32, usize>> {
        let lists = self.lists.list().await?;
        self.count_unchecked(&lists).await
    }

    /// Same as `unchecked_counts`, restricted to the actor's lists
    pub async fn unchecked_counts_for(&self, actor: &Actor) -> DomainResult<BTreeMap<u32, usize>> {
        let lists = self.lists.list_for_user(actor.user_id).await?;
        self.count_unchecked(&lists).await
    }

    async fn count_unchecked(&self, lists: &[ShoppingList]) -> DomainResult<BTreeMap<u32, usize>> {
        let mut counts = BTreeMap::new();
        for list in lists {
            let items = self.lifecycle.items_of(&list.item_ids).await?;
            counts.insert(list.id, items.iter().filter(|item| item.is_active()).count());
        }
        Ok(counts)
    }

    // ========================
    // Items
    // ========================

    /// Add an item to the list.
    ///
    /// A new item is created active with amount 0. An existing member is
    /// re-activated if checked (amount 0, unit cleared) or bumped by one unit.
    pub async fn add_item(&self, list_id: u32, input: ItemInput, actor: &Actor) -> DomainResult<ShoppingItem> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;

        let existing = match input.id {
            Some(id) if list.has_item(id) => Some(self.lifecycle.get(id).await?),
            _ => None,
        };

        let Some(existing) = existing else {
            let item = self.lifecycle.create(input.draft(), false, actor).await?;
            list.add_item(item.id);
            self.lists.update(&list).await?;
            log::debug!("Added new item {} to list {}", item.id, list_id);
            return Ok(item);
        };

        let patch = ItemPatch {
            id: existing.id,
            name: input.name,
            tags: input.tags,
            amount: Some(if existing.checked { 0.0 } else { existing.amount + 1.0 }),
            unit: if existing.checked { Some(String::new()) } else { input.unit },
            note: input.note,
            checked: false,
        };
        self.lifecycle.update(&patch, actor).await
    }

    pub async fn update_item(&self, list_id: u32, patch: ItemPatch, actor: &Actor) -> DomainResult<ShoppingItem> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_item_on(&list, patch.id)?;
        self.lifecycle.update(&patch, actor).await
    }

    pub async fn set_checked(&self, list_id: u32, item_id: u32, checked: bool, actor: &Actor) -> DomainResult<ShoppingItem> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_item_on(&list, item_id)?;
        self.lifecycle.set_checked(list_id, item_id, checked, actor).await
    }

    /// Remove one unit; the item stays on the list
    pub async fn remove_one(&self, list_id: u32, item_id: u32, actor: &Actor) -> DomainResult<ShoppingItem> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_item_on(&list, item_id)?;
        self.lifecycle.decrement_one(item_id).await
    }

    /// Delete the item record, then drop it from membership
    pub async fn delete_item(&self, list_id: u32, item_id: u32, actor: &Actor) -> DomainResult<()> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        Self::ensure_item_on(&list, item_id)?;

        self.lifecycle.delete(item_id).await?;
        list.remove_item(item_id);
        self.lists.update(&list).await?;
        Ok(())
    }

    // ========================
    // Item sets
    // ========================

    pub async fn list_item_sets(&self, list_id: u32, actor: &Actor) -> DomainResult<Vec<ItemSet>> {
        let list = self.load_for(list_id, actor).await?;
        self.reconciler.sets_of(&list).await
    }

    /// One set on a list the actor can read
    pub async fn item_set(&self, list_id: u32, set_id: u32, actor: &Actor) -> DomainResult<ItemSet> {
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_set_on(&list, set_id)?;
        self.sets.get(set_id).await
    }

    pub async fn create_item_set(&self, list_id: u32, draft: ItemSetDraft, actor: &Actor) -> DomainResult<ItemSet> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        let set = self.reconciler.reconcile_create(&mut list, draft, actor).await?;
        self.lists.update(&list).await?;
        Ok(set)
    }

    pub async fn update_item_set(&self, list_id: u32, set_id: u32, draft: ItemSetDraft, actor: &Actor) -> DomainResult<ItemSet> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        let before = list.item_ids.len();
        let previous = if list.has_item_set(set_id) {
            self.sets.find_by_id(set_id).await?.and_then(|set| set.receipt_file_id)
        } else {
            None
        };

        let _receipts = self.receipts.lock().await;
        let set = self.reconciler.reconcile_update(&mut list, set_id, draft, actor).await?;
        if list.item_ids.len() != before {
            self.lists.update(&list).await?;
        }
        if let Some(old) = previous.filter(|old| set.receipt_file_id.as_ref() != Some(old)) {
            self.release_receipt(&old).await;
        }
        Ok(set)
    }

    /// Delete the set and, unless another set shares it, its receipt.
    /// Bound items are left untouched.
    pub async fn delete_item_set(&self, list_id: u32, set_id: u32, actor: &Actor) -> DomainResult<()> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        Self::ensure_set_on(&list, set_id)?;

        let set = self.sets.get(set_id).await?;
        let _receipts = self.receipts.lock().await;
        self.sets.delete(set_id).await?;
        list.remove_item_set(set_id);
        self.lists.update(&list).await?;

        if let Some(file_id) = &set.receipt_file_id {
            self.release_receipt(file_id).await;
        }
        Ok(())
    }

    pub async fn apply_item_set(&self, list_id: u32, set_id: u32, actor: &Actor) -> DomainResult<Vec<ShoppingItem>> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_set_on(&list, set_id)?;
        self.reconciler.apply_all(set_id, actor).await
    }

    pub async fn retract_item_set(&self, list_id: u32, set_id: u32, actor: &Actor) -> DomainResult<Vec<ShoppingItem>> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_set_on(&list, set_id)?;
        self.reconciler.retract_all(set_id, actor).await
    }

    pub async fn apply_entry(&self, list_id: u32, entry: ItemSetItem, actor: &Actor) -> DomainResult<ShoppingItem> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_item_on(&list, entry.bound_id()?)?;
        self.reconciler.apply_entry(&entry, actor).await
    }

    pub async fn retract_entry(&self, list_id: u32, entry: ItemSetItem, actor: &Actor) -> DomainResult<ShoppingItem> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_item_on(&list, entry.bound_id()?)?;
        self.reconciler.retract_entry(&entry, actor).await
    }

    /// Store a receipt and attach it to a set, releasing the one it replaces.
    ///
    /// Nothing is written until the actor's access to the set is checked.
    pub async fn attach_receipt(
        &self,
        list_id: u32,
        set_id: u32,
        bytes: &[u8],
        filename: &str,
        actor: &Actor,
    ) -> DomainResult<ItemSet> {
        let _guard = self.locks.acquire(list_id).await;
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_set_on(&list, set_id)?;
        let mut set = self.sets.get(set_id).await?;

        let _receipts = self.receipts.lock().await;
        let stored = self.attachments.store(bytes, filename).await?;
        let previous = set.receipt_file_id.replace(stored.id);
        let set = self.sets.update(&set).await?;

        if let Some(old) = previous.filter(|old| set.receipt_file_id.as_ref() != Some(old)) {
            self.release_receipt(&old).await;
        }
        Ok(set)
    }

    /// Delete a receipt file once no item set references it.
    /// Callers hold `receipts`; failures are logged, not returned.
    async fn release_receipt(&self, file_id: &str) {
        if file_id.is_empty() {
            return;
        }
        match self.sets.count_with_receipt(file_id).await {
            Ok(0) => {
                if let Err(e) = self.attachments.delete(file_id).await {
                    log::warn!("Failed to delete receipt {}: {}", file_id, e);
                }
            }
            Ok(users) => log::debug!("Receipt {} still used by {} item sets", file_id, users),
            Err(e) => log::warn!("Failed to count users of receipt {}: {}", file_id, e),
        }
    }

    /// Receipt id of a set on a list the actor can read
    pub async fn receipt_of(&self, list_id: u32, set_id: u32, actor: &Actor) -> DomainResult<String> {
        let list = self.load_for(list_id, actor).await?;
        Self::ensure_set_on(&list, set_id)?;
        self.sets
            .get(set_id)
            .await?
            .receipt_file_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DomainError::NotFound(format!("Item set {} has no receipt", set_id)))
    }

    // ========================
    // Users
    // ========================

    pub async fn list_users(&self, list_id: u32, actor: &Actor) -> DomainResult<Vec<User>> {
        let list = self.load_for(list_id, actor).await?;
        self.users.find_by_ids(&list.user_ids).await
    }

    /// Share the list with `username`; adding an existing member is a no-op
    pub async fn add_user(&self, list_id: u32, username: &str, actor: &Actor) -> DomainResult<User> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User '{}' not found", username)))?;

        if list.add_user(user.id) {
            self.lists.update(&list).await?;
        }
        Ok(user)
    }

    pub async fn remove_user(&self, list_id: u32, user_id: u32, actor: &Actor) -> DomainResult<()> {
        let _guard = self.locks.acquire(list_id).await;
        let mut list = self.load_for(list_id, actor).await?;
        if list.remove_user(user_id) {
            self.lists.update(&list).await?;
        }
        Ok(())
    }

    /// Drop a user from every list, then delete the user record
    pub async fn remove_user_everywhere(&self, user_id: u32) -> DomainResult<()> {
        for list in self.lists.list_for_user(user_id).await? {
            let _guard = self.locks.acquire(list.id).await;
            let Some(mut list) = self.lists.find_by_id(list.id).await? else {
                continue;
            };
            if list.remove_user(user_id) {
                self.lists.update(&list).await?;
            }
        }
        self.users.delete(user_id).await
    }
}

/// Sort key that orders CJK names by their pinyin spelling
fn name_key(name: &str) -> String {
    name.chars()
        .map(|c| match c.to_pinyin() {
            Some(p) => p.plain().to_string(),
            None => c.to_lowercase().to_string(),
        })
        .collect()
}

fn sort_items(items: &mut [ShoppingItem], sort: ItemSort, direction: SortDirection) {
    match sort {
        ItemSort::Insertion => {}
        ItemSort::Alphabetical => items.sort_by_cached_key(|item| name_key(&item.name)),
        ItemSort::CheckedAt => items.sort_by_key(|item| item.checked_at),
        ItemSort::EditedAt => items.sort_by_key(|item| item.edited_at),
    }
    if direction == SortDirection::Descending {
        items.reverse();
    }
}
