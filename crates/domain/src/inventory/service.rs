//! Inventory service providing listing, lookup and creation of items.

use common::ItemId;
use store::{InventoryStore, Item, NewItem, Store, StoreError, Transaction};

use crate::caller::Caller;
use crate::error::DomainError;

use super::{InventoryError, validate_item};

/// Service for managing inventory items.
pub struct InventoryService<S: Store> {
    store: S,
}

impl<S: Store> InventoryService<S> {
    /// Creates a new inventory service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists every item that has not been deleted.
    ///
    /// An empty inventory is reported as [`InventoryError::NoItemsInInventory`].
    #[tracing::instrument(skip(self, caller), fields(request_id = %caller.request_id))]
    pub async fn list_items(&self, caller: &Caller) -> Result<Vec<Item>, DomainError> {
        let mut tx = self.store.begin().await?;
        let items = tx.list_items().await?;
        tx.commit().await?;

        if items.is_empty() {
            return Err(InventoryError::NoItemsInInventory.into());
        }
        Ok(items)
    }

    #[tracing::instrument(skip(self, caller), fields(request_id = %caller.request_id))]
    pub async fn get_item(&self, caller: &Caller, item_id: ItemId) -> Result<Item, DomainError> {
        let mut tx = self.store.begin().await?;
        let item = tx.get_item_by_id(item_id).await?;
        tx.commit().await?;

        item.ok_or_else(|| InventoryError::ItemNotFound { item_id }.into())
    }

    /// Validates and stores a new item.
    #[tracing::instrument(skip(self, caller, item), fields(request_id = %caller.request_id, name = %item.name, category = %item.category))]
    pub async fn add_item(&self, caller: &Caller, item: NewItem) -> Result<Item, DomainError> {
        validate_item(&item)?;

        let mut tx = self.store.begin().await?;
        if tx
            .get_item_by_name_and_category(&item.name, item.category)
            .await?
            .is_some()
        {
            return Err(duplicate(&item).into());
        }

        let (name, category) = (item.name.clone(), item.category);
        let created = match tx.create_item(item).await {
            Ok(created) => created,
            // lost a race against an identical insert
            Err(StoreError::UniqueViolation { .. }) => {
                return Err(InventoryError::DuplicateItem { name, category }.into());
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        metrics::counter!("inventory_items_created_total").increment(1);
        tracing::info!(item_id = %created.id, "inventory item created");
        Ok(created)
    }
}

fn duplicate(item: &NewItem) -> InventoryError {
    InventoryError::DuplicateItem {
        name: item.name.clone(),
        category: item.category,
    }
}
