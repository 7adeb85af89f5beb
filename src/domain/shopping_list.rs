//! Shopping List Entity
//!
//! Owns three membership collections. Deleting a list deletes every item in
//! `item_ids`; item sets in `item_set_ids` are referenced, not owned.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: u32,
    pub name: String,
    pub created_at: i64,
    pub item_ids: Vec<u32>,
    pub item_set_ids: Vec<u32>,
    pub user_ids: Vec<u32>,
}

impl ShoppingList {
    pub fn new(id: u32, name: String, created_at: i64) -> Self {
        Self {
            id,
            name,
            created_at,
            item_ids: Vec::new(),
            item_set_ids: Vec::new(),
            user_ids: Vec::new(),
        }
    }

    pub fn has_item(&self, item_id: u32) -> bool {
        self.item_ids.contains(&item_id)
    }

    pub fn has_item_set(&self, item_set_id: u32) -> bool {
        self.item_set_ids.contains(&item_set_id)
    }

    pub fn has_user(&self, user_id: u32) -> bool {
        self.user_ids.contains(&user_id)
    }

    /// Append an item id unless already present; returns whether it was added
    pub fn add_item(&mut self, item_id: u32) -> bool {
        push_unique(&mut self.item_ids, item_id)
    }

    pub fn remove_item(&mut self, item_id: u32) -> bool {
        remove_id(&mut self.item_ids, item_id)
    }

    pub fn add_item_set(&mut self, item_set_id: u32) -> bool {
        push_unique(&mut self.item_set_ids, item_set_id)
    }

    pub fn remove_item_set(&mut self, item_set_id: u32) -> bool {
        remove_id(&mut self.item_set_ids, item_set_id)
    }

    pub fn add_user(&mut self, user_id: u32) -> bool {
        push_unique(&mut self.user_ids, user_id)
    }

    pub fn remove_user(&mut self, user_id: u32) -> bool {
        remove_id(&mut self.user_ids, user_id)
    }
}

fn push_unique(ids: &mut Vec<u32>, id: u32) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}

fn remove_id(ids: &mut Vec<u32>, id: u32) -> bool {
    let before = ids.len();
    ids.retain(|existing| *existing != id);
    ids.len() != before
}

impl Entity for ShoppingList {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "Shopping list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_unique() {
        let mut list = ShoppingList::new(1, "Weekly".to_string(), 0);
        assert!(list.add_item(10));
        assert!(!list.add_item(10));
        assert_eq!(list.item_ids, vec![10]);

        assert!(list.remove_item(10));
        assert!(!list.remove_item(10));
        assert!(list.item_ids.is_empty());
    }

    #[test]
    fn test_membership_order_is_kept() {
        let mut list = ShoppingList::new(1, "Weekly".to_string(), 0);
        list.add_item_set(3);
        list.add_item_set(1);
        list.add_item_set(2);
        list.remove_item_set(1);
        assert_eq!(list.item_set_ids, vec![3, 2]);
    }
}
