//! Item Set Entity
//!
//! A named, ordered template of desired quantities. Each entry is bound to a
//! shopping item on the target list once reconciled.

use serde::{Deserialize, Serialize};
use super::entity::{validate_amount, DomainError, DomainResult, Entity};

/// One entry of an item set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSetItem {
    /// Bound shopping item; `None` until reconciled
    #[serde(default)]
    pub item_id: Option<u32>,
    /// Client-local correlation id, opaque to the server
    #[serde(default)]
    pub tmp_id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

impl ItemSetItem {
    pub fn new(name: impl Into<String>, amount: f64, unit: impl Into<String>) -> Self {
        Self {
            item_id: None,
            tmp_id: String::new(),
            name: name.into(),
            amount,
            unit: unit.into(),
        }
    }

    /// The bound item id, or NotFound naming the unbound entry
    pub fn bound_id(&self) -> DomainResult<u32> {
        self.item_id.ok_or_else(|| {
            DomainError::NotFound(format!("Item set entry '{}' is not bound to an item", self.name))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSet {
    pub id: u32,
    pub name: String,
    pub items: Vec<ItemSetItem>,
    /// Attachment id of a stored receipt
    #[serde(default)]
    pub receipt_file_id: Option<String>,
}

impl ItemSet {
    pub fn new(id: u32, name: String, items: Vec<ItemSetItem>) -> Self {
        Self {
            id,
            name,
            items,
            receipt_file_id: None,
        }
    }

    /// Case-insensitive name comparison used for per-list uniqueness
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl Entity for ItemSet {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "Item set"
    }
}

/// Client payload for creating or updating an item set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSetDraft {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemSetItem>,
    #[serde(default)]
    pub receipt_file_id: Option<String>,
}

impl ItemSetDraft {
    pub fn new(name: impl Into<String>, items: Vec<ItemSetItem>) -> Self {
        Self {
            name: name.into(),
            items,
            receipt_file_id: None,
        }
    }

    /// Reject blank names and entries with invalid amounts
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Item set name must not be empty".into()));
        }
        for entry in &self.items {
            validate_amount(entry.amount)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_name_ignores_case() {
        let set = ItemSet::new(1, "Groceries".to_string(), vec![]);
        assert!(set.has_name("groceries"));
        assert!(set.has_name("GROCERIES"));
        assert!(!set.has_name("Grocery"));
    }

    #[test]
    fn test_unbound_entry() {
        let entry = ItemSetItem::new("Milk", 2.0, "L");
        assert!(matches!(entry.bound_id(), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_draft_validation() {
        assert!(ItemSetDraft::new("", vec![]).validate().is_err());
        let bad = ItemSetDraft::new("Trip", vec![ItemSetItem::new("Eggs", -1.0, "pcs")]);
        assert!(matches!(bad.validate(), Err(DomainError::InvalidInput(_))));
        let ok = ItemSetDraft::new("Trip", vec![ItemSetItem::new("Eggs", 12.0, "pcs")]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_entry_deserializes_without_binding() {
        let entry: ItemSetItem =
            serde_json::from_str(r#"{"name": "Milk", "amount": 2, "unit": "L"}"#).unwrap();
        assert_eq!(entry.item_id, None);
        assert_eq!(entry.amount, 2.0);
    }
}
