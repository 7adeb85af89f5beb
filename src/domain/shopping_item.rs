//! Shopping Item Entity
//!
//! A single line item tracked on exactly one shopping list.
//! `checked == true` means the item is resolved off the active list;
//! `checked == false` means it still needs acquiring.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    /// Unique identifier
    pub id: u32,
    /// Free-text label, matched exactly when reconciling item sets
    pub name: String,
    pub tags: Vec<String>,
    /// Non-negative quantity; 0 is a valid resolved state
    pub amount: f64,
    /// Opaque unit label, never converted
    pub unit: String,
    pub checked: bool,
    pub checked_at: Option<i64>,
    pub note: String,
    pub edited_at: i64,
    /// Username of the last actor who mutated the item
    pub edited_by: String,
}

impl ShoppingItem {
    /// Whether the item is on the active (unchecked) part of its list
    pub fn is_active(&self) -> bool {
        !self.checked
    }
}

impl Entity for ShoppingItem {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "Item"
    }
}

/// Initial fields for a new item; unset fields default to empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub unit: Option<String>,
    pub note: Option<String>,
}

impl ItemDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Partial update: `None` fields keep the stored value.
/// `checked` has no partial-skip and is always written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub checked: bool,
}

impl ItemPatch {
    /// Patch that only sets the checked flag
    pub fn checked(id: u32, checked: bool) -> Self {
        Self {
            id,
            name: None,
            tags: None,
            amount: None,
            unit: None,
            note: None,
            checked,
        }
    }
}

/// Request body for adding an item to a list.
///
/// `id == None` (or an id not on the list) creates a new item;
/// otherwise the existing member is bumped or re-activated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ItemInput {
    pub fn draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            tags: self.tags.clone(),
            unit: self.unit.clone(),
            note: self.note.clone(),
        }
    }
}

/// Sort category for listing a list's items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemSort {
    /// Keep list membership order
    #[default]
    Insertion,
    Alphabetical,
    CheckedAt,
    EditedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_json_shape() {
        let item = ShoppingItem {
            id: 7,
            name: "Milk".to_string(),
            tags: vec!["dairy".to_string()],
            amount: 2.0,
            unit: "L".to_string(),
            checked: false,
            checked_at: Some(1),
            note: String::new(),
            edited_at: 2,
            edited_by: "anna".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["checkedAt"], 1);
        assert_eq!(json["editedBy"], "anna");
        assert!(item.is_active());
    }

    #[test]
    fn test_patch_defaults_missing_fields() {
        let patch: ItemPatch = serde_json::from_str(r#"{"id": 3, "checked": true}"#).unwrap();
        assert_eq!(patch.id, 3);
        assert!(patch.checked);
        assert!(patch.amount.is_none());
        assert!(patch.name.is_none());
    }
}
