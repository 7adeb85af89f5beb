//! Item Activity Entity
//!
//! Analytics record written whenever an item is checked off a list.

use serde::{Deserialize, Serialize};
use super::entity::Entity;
use super::shopping_item::ShoppingItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Checked,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Checked => "checked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checked" => Some(ActivityAction::Checked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemActivity {
    pub id: u32,
    pub list_id: u32,
    pub user_id: u32,
    pub item_id: u32,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub timestamp: i64,
    pub action: ActivityAction,
}

impl ItemActivity {
    /// Snapshot of `item` at the moment of the action.
    /// An item with no recorded amount counts as one unit.
    pub fn record(list_id: u32, user_id: u32, item: &ShoppingItem, action: ActivityAction, timestamp: i64) -> Self {
        Self {
            id: 0,
            list_id,
            user_id,
            item_id: item.id,
            name: item.name.clone(),
            amount: if item.amount == 0.0 { 1.0 } else { item.amount },
            unit: item.unit.clone(),
            timestamp,
            action,
        }
    }
}

impl Entity for ItemActivity {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "Activity"
    }
}

/// Filter for activity queries; unset fields match everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    pub list_id: u32,
    #[serde(default)]
    pub user_id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
}

impl ActivityFilter {
    pub fn for_list(list_id: u32) -> Self {
        Self {
            list_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(amount: f64) -> ShoppingItem {
        ShoppingItem {
            id: 4,
            name: "Bread".to_string(),
            tags: vec![],
            amount,
            unit: "loaf".to_string(),
            checked: false,
            checked_at: None,
            note: String::new(),
            edited_at: 0,
            edited_by: String::new(),
        }
    }

    #[test]
    fn test_zero_amount_counts_as_one() {
        let activity = ItemActivity::record(1, 2, &item(0.0), ActivityAction::Checked, 10);
        assert_eq!(activity.amount, 1.0);
        let activity = ItemActivity::record(1, 2, &item(3.0), ActivityAction::Checked, 10);
        assert_eq!(activity.amount, 3.0);
        assert_eq!(ActivityAction::parse(activity.action.as_str()), Some(ActivityAction::Checked));
    }
}
