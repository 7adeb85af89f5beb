//! Recipe Entity
//!
//! A recipe keeps its own copy of an item set's entries. Only its creator may
//! change or delete it.

use serde::{Deserialize, Serialize};
use super::entity::{validate_amount, DomainError, DomainResult, Entity};
use super::item_set::{ItemSet, ItemSetItem};
use super::user::Actor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: u32,
    pub name: String,
    pub creator_id: u32,
    pub created_at: i64,
    /// Item set this recipe was converted from, if any
    pub source_item_set_id: Option<u32>,
    /// Entries copied without their list bindings
    pub items: Vec<ItemSetItem>,
    pub description: String,
    pub instructions: Vec<String>,
    pub categories: Vec<String>,
}

impl Recipe {
    pub fn from_draft(draft: RecipeDraft, creator_id: u32, created_at: i64) -> Self {
        Self {
            id: 0,
            name: draft.name,
            creator_id,
            created_at,
            source_item_set_id: None,
            items: unbound(draft.items),
            description: draft.description,
            instructions: draft.instructions,
            categories: draft.categories,
        }
    }

    /// Private recipe carrying the set's name and entries
    pub fn from_item_set(set: &ItemSet, creator_id: u32, created_at: i64) -> Self {
        let mut recipe = Self::from_draft(
            RecipeDraft {
                name: set.name.clone(),
                items: set.items.clone(),
                ..Default::default()
            },
            creator_id,
            created_at,
        );
        recipe.source_item_set_id = Some(set.id);
        recipe
    }

    /// Overwrite the editable fields; creator and origin stay
    pub fn apply(&mut self, draft: RecipeDraft) {
        self.name = draft.name;
        self.items = unbound(draft.items);
        self.description = draft.description;
        self.instructions = draft.instructions;
        self.categories = draft.categories;
    }

    pub fn check_creator(&self, actor: &Actor) -> DomainResult<()> {
        if self.creator_id == actor.user_id {
            return Ok(());
        }
        Err(DomainError::PermissionDenied(format!(
            "{} did not create recipe {}",
            actor.username, self.id
        )))
    }
}

impl Entity for Recipe {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "Recipe"
    }
}

/// Client payload for creating or updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemSetItem>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl RecipeDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Recipe name must not be empty".into()));
        }
        for entry in &self.items {
            validate_amount(entry.amount)?;
        }
        Ok(())
    }
}

fn unbound(mut items: Vec<ItemSetItem>) -> Vec<ItemSetItem> {
    for entry in &mut items {
        entry.item_id = None;
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_drops_bindings() {
        let mut entry = ItemSetItem::new("Flour", 1.0, "kg");
        entry.item_id = Some(7);
        let mut set = ItemSet::new(3, "Pancakes".to_string(), vec![entry]);
        set.receipt_file_id = Some("f".repeat(64));

        let recipe = Recipe::from_item_set(&set, 1, 100);
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.source_item_set_id, Some(3));
        assert_eq!(recipe.items[0].item_id, None);
        assert_eq!(recipe.items[0].amount, 1.0);
        assert!(recipe.instructions.is_empty());
    }

    #[test]
    fn test_only_creator_passes() {
        let recipe = Recipe::from_draft(RecipeDraft { name: "Soup".into(), ..Default::default() }, 1, 0);
        assert!(recipe.check_creator(&Actor::new(1, "anna")).is_ok());
        assert!(matches!(
            recipe.check_creator(&Actor::new(2, "ben")),
            Err(DomainError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_draft_validation() {
        assert!(RecipeDraft::default().validate().is_err());
        let bad = RecipeDraft {
            name: "Soup".into(),
            items: vec![ItemSetItem::new("Salt", -1.0, "g")],
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(DomainError::InvalidInput(_))));
    }
}
