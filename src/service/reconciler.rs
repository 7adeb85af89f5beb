//! Item Set Reconciler
//!
//! Binds every entry of an item set to a shopping item on the target list:
//! an item with exactly the entry's name is reused, otherwise a dormant item
//! (checked, amount 0) is created and added to the list's membership.
//!
//! The reconciler mutates the `ShoppingList` it is handed but never persists
//! it; the caller owns the list write and the list lock.

use std::sync::Arc;

use crate::config::UnitPolicy;
use crate::domain::{
    Actor, DomainError, DomainResult, ItemDraft, ItemSet, ItemSetDraft, ItemSetItem,
    ShoppingItem, ShoppingList,
};
use crate::repository::{ItemSetRepository, Repository};
use super::lifecycle::ItemLifecycle;

pub struct ItemSetReconciler {
    lifecycle: Arc<ItemLifecycle>,
    sets: Arc<ItemSetRepository>,
    bulk_unit: UnitPolicy,
}

impl ItemSetReconciler {
    pub fn new(lifecycle: Arc<ItemLifecycle>, sets: Arc<ItemSetRepository>, bulk_unit: UnitPolicy) -> Self {
        Self {
            lifecycle,
            sets,
            bulk_unit,
        }
    }

    /// Item sets referenced by `list`, in membership order
    pub async fn sets_of(&self, list: &ShoppingList) -> DomainResult<Vec<ItemSet>> {
        self.sets.find_by_ids(&list.item_set_ids).await
    }

    /// Fail with Conflict when another set on `list` has `name` (ignoring case)
    pub async fn check_name_free(&self, list: &ShoppingList, name: &str, exclude: Option<u32>) -> DomainResult<()> {
        let taken = self
            .sets_of(list)
            .await?
            .iter()
            .any(|set| Some(set.id) != exclude && set.has_name(name));

        if taken {
            return Err(DomainError::Conflict(format!(
                "An item set named '{}' already exists in this shopping list",
                name
            )));
        }
        Ok(())
    }

    /// Bind all entries, persist the new set and reference it from `list`.
    ///
    /// The name check runs before any write.
    pub async fn reconcile_create(&self, list: &mut ShoppingList, draft: ItemSetDraft, actor: &Actor) -> DomainResult<ItemSet> {
        draft.validate()?;
        self.check_name_free(list, &draft.name, None).await?;

        let mut entries = draft.items;
        let created = self.bind_entries(list, &mut entries, false, actor).await?;

        let mut set = ItemSet::new(0, draft.name, entries);
        set.receipt_file_id = draft.receipt_file_id;
        let set = self.sets.create(&set).await?;
        list.add_item_set(set.id);

        log::info!(
            "Created item set {} '{}' on list {} ({} new items)",
            set.id, set.name, list.id, created
        );
        Ok(set)
    }

    /// Re-bind only entries that are unbound or whose item no longer carries
    /// the entry's name, then overwrite the stored set.
    pub async fn reconcile_update(&self, list: &mut ShoppingList, set_id: u32, draft: ItemSetDraft, actor: &Actor) -> DomainResult<ItemSet> {
        draft.validate()?;
        if !list.has_item_set(set_id) {
            return Err(DomainError::not_found::<ItemSet>(set_id));
        }
        let mut set = self.sets.get(set_id).await?;
        if !set.has_name(&draft.name) {
            self.check_name_free(list, &draft.name, Some(set_id)).await?;
        }

        let mut entries = draft.items;
        let created = self.bind_entries(list, &mut entries, true, actor).await?;

        set.name = draft.name;
        set.items = entries;
        if draft.receipt_file_id.is_some() {
            set.receipt_file_id = draft.receipt_file_id;
        }
        let set = self.sets.update(&set).await?;

        log::info!("Updated item set {} on list {} ({} new items)", set.id, list.id, created);
        Ok(set)
    }

    /// Merge every entry onto its bound item.
    ///
    /// Not transactional: a missing item stops the loop with earlier items
    /// already updated.
    pub async fn apply_all(&self, set_id: u32, actor: &Actor) -> DomainResult<Vec<ShoppingItem>> {
        let set = self.sets.get(set_id).await?;
        let overwrite_unit = self.bulk_unit == UnitPolicy::Overwrite;

        let mut updated = Vec::with_capacity(set.items.len());
        for entry in &set.items {
            updated.push(self.lifecycle.merge_entry(entry, actor, overwrite_unit).await?);
        }
        log::debug!("Applied item set {} ({} items)", set_id, updated.len());
        Ok(updated)
    }

    /// Subtract every entry from its bound item; same failure behavior as `apply_all`
    pub async fn retract_all(&self, set_id: u32, actor: &Actor) -> DomainResult<Vec<ShoppingItem>> {
        let set = self.sets.get(set_id).await?;

        let mut updated = Vec::with_capacity(set.items.len());
        for entry in &set.items {
            updated.push(self.lifecycle.unmerge_entry(entry, actor).await?);
        }
        log::debug!("Retracted item set {} ({} items)", set_id, updated.len());
        Ok(updated)
    }

    /// Merge a single entry; the entry's unit always replaces the item's
    pub async fn apply_entry(&self, entry: &ItemSetItem, actor: &Actor) -> DomainResult<ShoppingItem> {
        self.lifecycle.merge_entry(entry, actor, true).await
    }

    pub async fn retract_entry(&self, entry: &ItemSetItem, actor: &Actor) -> DomainResult<ShoppingItem> {
        self.lifecycle.unmerge_entry(entry, actor).await
    }

    /// Bind entries against the items currently on `list`.
    ///
    /// Items created for earlier entries are visible to later ones, so two
    /// entries with the same name end up on the same item. Returns the
    /// number of items created.
    async fn bind_entries(&self, list: &mut ShoppingList, entries: &mut [ItemSetItem], only_stale: bool, actor: &Actor) -> DomainResult<usize> {
        let mut known = self.lifecycle.items_of(&list.item_ids).await?;
        let mut created = 0;

        for entry in entries.iter_mut() {
            if only_stale && !needs_rebind(entry, &known) {
                continue;
            }

            if let Some(existing) = known.iter().find(|item| item.name == entry.name) {
                entry.item_id = Some(existing.id);
                continue;
            }

            let draft = ItemDraft {
                name: Some(entry.name.clone()),
                tags: Some(Vec::new()),
                unit: Some(entry.unit.clone()),
                note: None,
            };
            let item = self.lifecycle.create(draft, true, actor).await?;
            entry.item_id = Some(item.id);
            list.add_item(item.id);
            known.push(item);
            created += 1;
        }
        Ok(created)
    }
}

/// An entry is stale when unbound, bound to an item that is not on the
/// list (deleted or foreign), or bound to an item that has been renamed.
fn needs_rebind(entry: &ItemSetItem, known: &[ShoppingItem]) -> bool {
    match entry.item_id {
        None => true,
        Some(id) => match known.iter().find(|item| item.id == id) {
            None => true,
            Some(item) => item.name != entry.name,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, name: &str) -> ShoppingItem {
        ShoppingItem {
            id,
            name: name.to_string(),
            tags: vec![],
            amount: 0.0,
            unit: String::new(),
            checked: true,
            checked_at: None,
            note: String::new(),
            edited_at: 0,
            edited_by: String::new(),
        }
    }

    #[test]
    fn test_needs_rebind() {
        let known = vec![item(1, "Milk"), item(2, "Eggs")];

        let unbound = ItemSetItem::new("Milk", 1.0, "L");
        assert!(needs_rebind(&unbound, &known));

        let mut bound = ItemSetItem::new("Milk", 1.0, "L");
        bound.item_id = Some(1);
        assert!(!needs_rebind(&bound, &known));

        let mut renamed = ItemSetItem::new("Whole milk", 1.0, "L");
        renamed.item_id = Some(1);
        assert!(needs_rebind(&renamed, &known));

        let mut dangling = ItemSetItem::new("Bread", 1.0, "");
        dangling.item_id = Some(9);
        assert!(needs_rebind(&dangling, &known));
    }
}
