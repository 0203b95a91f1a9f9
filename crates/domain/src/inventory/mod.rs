//! Inventory items and their validation rules.

mod service;

pub use service::InventoryService;

use common::ItemId;
use store::{ItemCategory, NewItem};
use thiserror::Error;

use crate::error::ErrorKind;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 5000;
pub const MAX_IMAGE_LEN: usize = 1000;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("No items found in inventory")]
    NoItemsInInventory,

    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    #[error("Item already exists: {name} ({category})")]
    DuplicateItem { name: String, category: ItemCategory },

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

impl InventoryError {
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::NoItemsInInventory => "NO_ITEMS_IN_INVENTORY",
            InventoryError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            InventoryError::DuplicateItem { .. } => "DUPLICATE_ITEM",
            InventoryError::InvalidItem(_) => "INVALID_ITEM",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::NoItemsInInventory | InventoryError::ItemNotFound { .. } => {
                ErrorKind::NotFound
            }
            InventoryError::DuplicateItem { .. } => ErrorKind::Conflict,
            InventoryError::InvalidItem(_) => ErrorKind::Validation,
        }
    }
}

/// Checks the field rules an item must satisfy before it is stored.
pub fn validate_item(item: &NewItem) -> Result<(), InventoryError> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(InventoryError::InvalidItem("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(InventoryError::InvalidItem(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if !item.price.is_positive() {
        return Err(InventoryError::InvalidItem(
            "price must be greater than 0".to_string(),
        ));
    }
    if item
        .description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
    {
        return Err(InventoryError::InvalidItem(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if item
        .image
        .as_ref()
        .is_some_and(|i| i.chars().count() > MAX_IMAGE_LEN)
    {
        return Err(InventoryError::InvalidItem(format!(
            "image must be at most {MAX_IMAGE_LEN} characters"
        )));
    }
    if item.quantity < 0 {
        return Err(InventoryError::InvalidItem(
            "quantity must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn lamp() -> NewItem {
        NewItem {
            category: ItemCategory::Electronics,
            name: "Desk lamp".to_string(),
            price: Money::from_cents(2999),
            description: Some("Warm white LED".to_string()),
            image: None,
            quantity: 0,
        }
    }

    #[test]
    fn zero_stock_is_valid() {
        assert!(validate_item(&lamp()).is_ok());
    }

    #[test]
    fn rejects_each_field_rule() {
        let cases: Vec<(&str, NewItem)> = vec![
            ("name", NewItem { name: "  ".to_string(), ..lamp() }),
            ("name", NewItem { name: "x".repeat(256), ..lamp() }),
            ("price", NewItem { price: Money::zero(), ..lamp() }),
            ("description", NewItem { description: Some("d".repeat(5001)), ..lamp() }),
            ("image", NewItem { image: Some("i".repeat(1001)), ..lamp() }),
            ("quantity", NewItem { quantity: -1, ..lamp() }),
        ];

        for (field, item) in cases {
            let err = validate_item(&item).unwrap_err();
            assert!(err.to_string().contains(field), "{field}: {err}");
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn limits_are_inclusive() {
        let item = NewItem {
            name: "n".repeat(MAX_NAME_LEN),
            description: Some("d".repeat(MAX_DESCRIPTION_LEN)),
            image: Some("i".repeat(MAX_IMAGE_LEN)),
            ..lamp()
        };
        assert!(validate_item(&item).is_ok());
    }
}
