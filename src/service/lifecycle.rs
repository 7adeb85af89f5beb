//! Shopping Item Lifecycle
//!
//! Owns the quantity/checked state machine of a single item. Every
//! transition keeps `amount >= 0`: a decrement that would cross zero checks
//! the item instead.
//!
//! The transitions are plain functions over `&mut ShoppingItem`; the
//! `ItemLifecycle` methods load, apply one transition and persist.

use std::sync::Arc;

use crate::domain::{
    now_millis, validate_amount, Actor, ActivityAction, DomainResult, ItemDraft, ItemPatch,
    ItemSetItem, ShoppingItem,
};
use crate::repository::{ItemRepository, Repository};
use super::analytics::ActivitySink;

/// Amounts closer to zero than this count as zero after subtraction
const AMOUNT_EPSILON: f64 = 1e-9;

pub struct ItemLifecycle {
    items: Arc<ItemRepository>,
    activity: Arc<dyn ActivitySink>,
}

impl ItemLifecycle {
    pub fn new(items: Arc<ItemRepository>, activity: Arc<dyn ActivitySink>) -> Self {
        Self { items, activity }
    }

    pub async fn get(&self, id: u32) -> DomainResult<ShoppingItem> {
        self.items.get(id).await
    }

    /// Items for `ids` in the given order; ids without a record are skipped
    pub async fn items_of(&self, ids: &[u32]) -> DomainResult<Vec<ShoppingItem>> {
        self.items.find_by_ids(ids).await
    }

    /// Create an empty-quantity item.
    ///
    /// `checked == true` creates a dormant item that exists only as a
    /// name-matching target and stays off the active list.
    pub async fn create(&self, draft: ItemDraft, checked: bool, actor: &Actor) -> DomainResult<ShoppingItem> {
        let item = new_item(draft, checked, actor, now_millis());
        let created = self.items.create(&item).await?;
        log::debug!("Created item {} '{}' (checked={})", created.id, created.name, checked);
        Ok(created)
    }

    /// Partial update; fails with NotFound when the id is absent
    pub async fn update(&self, patch: &ItemPatch, actor: &Actor) -> DomainResult<ShoppingItem> {
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        let mut item = self.items.get(patch.id).await?;
        apply_patch(&mut item, patch, actor, now_millis());
        self.items.update(&item).await
    }

    /// Toggle the checked flag.
    ///
    /// Checking consumes the quantity (amount 0, unit cleared) and records a
    /// "checked" activity on the first transition. Unchecking only refreshes
    /// `checked_at`.
    pub async fn set_checked(&self, list_id: u32, id: u32, checked: bool, actor: &Actor) -> DomainResult<ShoppingItem> {
        let mut item = self.items.get(id).await?;

        if checked && !item.checked {
            if let Err(e) = self
                .activity
                .record_event(list_id, actor.user_id, &item, ActivityAction::Checked)
                .await
            {
                log::warn!("Dropping checked activity for item {}: {}", id, e);
            }
        }

        apply_checked(&mut item, checked, now_millis());
        self.items.update(&item).await
    }

    /// Remove one unit, or check the item when less than one unit is left
    pub async fn decrement_one(&self, id: u32) -> DomainResult<ShoppingItem> {
        let mut item = self.items.get(id).await?;
        apply_decrement(&mut item);
        self.items.update(&item).await
    }

    /// Add an item-set entry's quantity onto its bound item and re-activate it
    pub async fn merge_entry(&self, entry: &ItemSetItem, actor: &Actor, overwrite_unit: bool) -> DomainResult<ShoppingItem> {
        validate_amount(entry.amount)?;
        let mut item = self.items.get(entry.bound_id()?).await?;
        let unit = overwrite_unit.then_some(entry.unit.as_str());
        apply_merge(&mut item, entry.amount, unit, actor, now_millis());
        self.items.update(&item).await
    }

    /// Subtract an item-set entry's quantity from its bound item
    pub async fn unmerge_entry(&self, entry: &ItemSetItem, actor: &Actor) -> DomainResult<ShoppingItem> {
        validate_amount(entry.amount)?;
        let mut item = self.items.get(entry.bound_id()?).await?;
        apply_unmerge(&mut item, entry.amount, actor, now_millis());
        self.items.update(&item).await
    }

    pub async fn delete(&self, id: u32) -> DomainResult<()> {
        self.items.delete(id).await
    }
}

fn new_item(draft: ItemDraft, checked: bool, actor: &Actor, now: i64) -> ShoppingItem {
    ShoppingItem {
        id: 0,
        name: draft.name.unwrap_or_default(),
        tags: draft.tags.unwrap_or_default(),
        amount: 0.0,
        unit: draft.unit.unwrap_or_default(),
        checked,
        checked_at: if checked { None } else { Some(now) },
        note: draft.note.unwrap_or_default(),
        edited_at: now,
        edited_by: actor.username.clone(),
    }
}

fn apply_patch(item: &mut ShoppingItem, patch: &ItemPatch, actor: &Actor, now: i64) {
    let amount_changed = patch.amount.is_some_and(|amount| amount != item.amount);
    let reactivated = item.checked && !patch.checked;
    if amount_changed || reactivated {
        item.edited_by = actor.username.clone();
        item.checked_at = Some(now);
    }

    if let Some(name) = &patch.name {
        item.name = name.clone();
    }
    if let Some(tags) = &patch.tags {
        item.tags = tags.clone();
    }
    if let Some(amount) = patch.amount {
        item.amount = amount;
    }
    if let Some(unit) = &patch.unit {
        item.unit = unit.clone();
    }
    if let Some(note) = &patch.note {
        item.note = note.clone();
    }

    item.checked = patch.checked;
    item.edited_at = now;
}

fn apply_checked(item: &mut ShoppingItem, checked: bool, now: i64) {
    item.checked = checked;
    if checked {
        item.amount = 0.0;
        item.unit.clear();
    } else {
        item.checked_at = Some(now);
    }
}

fn apply_decrement(item: &mut ShoppingItem) {
    if item.amount >= 1.0 {
        item.amount -= 1.0;
    } else {
        item.checked = true;
    }
}

fn apply_merge(item: &mut ShoppingItem, amount: f64, unit: Option<&str>, actor: &Actor, now: i64) {
    item.amount += amount;
    if let Some(unit) = unit {
        item.unit = unit.to_string();
    }
    if item.checked {
        item.checked_at = Some(now);
    }
    item.checked = false;
    item.edited_at = now;
    item.edited_by = actor.username.clone();
}

fn apply_unmerge(item: &mut ShoppingItem, amount: f64, actor: &Actor, now: i64) {
    let remaining = item.amount - amount;
    if remaining <= AMOUNT_EPSILON {
        item.amount = 0.0;
        item.checked = true;
    } else {
        item.amount = remaining;
    }
    item.edited_at = now;
    item.edited_by = actor.username.clone();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> Actor {
        Actor::new(1, "anna")
    }

    fn active(amount: f64, unit: &str) -> ShoppingItem {
        let mut item = new_item(ItemDraft::named("Milk"), false, &actor(), 100);
        item.id = 1;
        item.amount = amount;
        item.unit = unit.to_string();
        item
    }

    #[test]
    fn test_new_item_defaults() {
        let item = new_item(ItemDraft::default(), false, &actor(), 100);
        assert_eq!(item.name, "");
        assert!(item.tags.is_empty());
        assert_eq!(item.amount, 0.0);
        assert_eq!(item.checked_at, Some(100));
        assert_eq!(item.edited_by, "anna");

        let dormant = new_item(ItemDraft::named("Eggs"), true, &actor(), 100);
        assert!(dormant.checked);
        assert_eq!(dormant.checked_at, None);
        assert_eq!(dormant.edited_at, 100);
    }

    #[test]
    fn test_decrement_to_checked() {
        let mut item = active(0.5, "L");
        apply_decrement(&mut item);
        assert!(item.checked);
        assert_eq!(item.amount, 0.5);

        let mut item = active(2.0, "L");
        apply_decrement(&mut item);
        assert!(!item.checked);
        assert_eq!(item.amount, 1.0);
    }

    #[test]
    fn test_checked_zeroes_quantity() {
        let mut item = active(3.0, "kg");
        apply_checked(&mut item, true, 200);
        assert!(item.checked);
        assert_eq!(item.amount, 0.0);
        assert_eq!(item.unit, "");
    }

    #[test]
    fn test_unchecking_preserves_quantity() {
        let mut item = active(3.0, "kg");
        item.checked = true;
        apply_checked(&mut item, false, 300);
        assert!(!item.checked);
        assert_eq!(item.amount, 3.0);
        assert_eq!(item.unit, "kg");
        assert_eq!(item.checked_at, Some(300));
    }

    #[test]
    fn test_patch_only_overwrites_set_fields() {
        let mut item = active(1.0, "L");
        item.note = "organic".to_string();
        let editor = Actor::new(2, "ben");

        let mut patch = ItemPatch::checked(1, false);
        patch.name = Some("Oat milk".to_string());
        apply_patch(&mut item, &patch, &editor, 500);

        assert_eq!(item.name, "Oat milk");
        assert_eq!(item.note, "organic");
        assert_eq!(item.amount, 1.0);
        // Name-only edits do not change attribution
        assert_eq!(item.edited_by, "anna");
        assert_eq!(item.edited_at, 500);

        patch.amount = Some(4.0);
        apply_patch(&mut item, &patch, &editor, 600);
        assert_eq!(item.edited_by, "ben");
        assert_eq!(item.checked_at, Some(600));
    }

    #[test]
    fn test_patch_reactivation_refreshes_checked_at() {
        let mut item = active(0.0, "");
        item.checked = true;
        item.checked_at = Some(1);
        apply_patch(&mut item, &ItemPatch::checked(1, false), &Actor::new(3, "cem"), 700);
        assert!(!item.checked);
        assert_eq!(item.checked_at, Some(700));
        assert_eq!(item.edited_by, "cem");
    }

    #[test]
    fn test_merge_reactivates_and_unmerge_checks_at_zero() {
        let mut item = active(0.0, "");
        item.checked = true;

        apply_merge(&mut item, 2.0, Some("L"), &actor(), 10);
        assert!(!item.checked);
        assert_eq!(item.amount, 2.0);
        assert_eq!(item.unit, "L");

        apply_merge(&mut item, 1.0, None, &actor(), 11);
        assert_eq!(item.amount, 3.0);
        assert_eq!(item.unit, "L");

        apply_unmerge(&mut item, 1.0, &actor(), 12);
        assert!(!item.checked);
        assert_eq!(item.amount, 2.0);

        apply_unmerge(&mut item, 2.0, &actor(), 13);
        assert!(item.checked);
        assert_eq!(item.amount, 0.0);
    }

    #[test]
    fn test_unmerge_never_goes_negative() {
        let mut item = active(1.0, "pcs");
        apply_unmerge(&mut item, 5.0, &actor(), 10);
        assert_eq!(item.amount, 0.0);
        assert!(item.checked);

        let mut item = active(0.3, "kg");
        apply_unmerge(&mut item, 0.1, &actor(), 10);
        apply_unmerge(&mut item, 0.2, &actor(), 10);
        assert_eq!(item.amount, 0.0);
        assert!(item.checked);
    }

    #[test]
    fn test_amount_stays_non_negative_over_mixed_sequences() {
        let deltas = [2.0, 0.5, 3.25, 1.0, 0.75];
        let mut item = active(0.0, "");

        for step in 0..200usize {
            let amount = deltas[step % deltas.len()];
            match step % 4 {
                0 => apply_merge(&mut item, amount, None, &actor(), step as i64),
                1 | 2 => apply_unmerge(&mut item, amount, &actor(), step as i64),
                _ => apply_decrement(&mut item),
            }
            assert!(item.amount >= 0.0, "negative amount at step {}", step);
        }
    }
}
