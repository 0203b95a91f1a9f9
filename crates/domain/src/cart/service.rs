//! Cart service: the rules tying cart quantities to inventory stock.

use std::collections::HashMap;

use common::{ItemId, LineItemId};
use store::{Cart, CartStore, InventoryStore, Store, StoreError, Transaction, UserStore};

use crate::caller::Caller;
use crate::error::DomainError;

use super::{CartError, CartLine, CartProjection};

/// Service for reading and mutating a customer's cart.
///
/// Every mutation runs in one store transaction. Stock is moved with single
/// conditional updates in the store, so two customers racing for the last
/// unit cannot both win; a failure at any step leaves stock and cart as they
/// were.
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the caller's cart. Never creates one.
    #[tracing::instrument(skip(self, caller), fields(request_id = %caller.request_id, customer_id = %caller.user_id))]
    pub async fn get_cart(&self, caller: &Caller) -> Result<CartProjection, DomainError> {
        let mut tx = self.store.begin().await?;
        let cart = tx
            .get_cart_by_customer(caller.user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        let projection = project(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(projection)
    }

    /// Moves `quantity` units of an item from inventory into the caller's
    /// cart, creating the cart on first use.
    #[tracing::instrument(skip(self, caller), fields(request_id = %caller.request_id, customer_id = %caller.user_id))]
    pub async fn add_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<CartProjection, DomainError> {
        let result = self.try_add_item(caller, item_id, quantity).await;
        match &result {
            Ok(_) => {
                metrics::counter!("cart_items_added_total").increment(quantity as u64);
                tracing::info!(%item_id, quantity, "item added to cart");
            }
            Err(e) => record_failure(e),
        }
        result
    }

    /// Moves `quantity` units of a cart line back into inventory, deleting
    /// the line when nothing is left in it.
    #[tracing::instrument(skip(self, caller), fields(request_id = %caller.request_id, customer_id = %caller.user_id))]
    pub async fn remove_item(
        &self,
        caller: &Caller,
        line_item_id: LineItemId,
        quantity: i32,
    ) -> Result<CartProjection, DomainError> {
        let result = self.try_remove_item(caller, line_item_id, quantity).await;
        match &result {
            Ok(_) => {
                metrics::counter!("cart_items_removed_total").increment(quantity as u64);
                tracing::info!(%line_item_id, quantity, "item removed from cart");
            }
            Err(e) => record_failure(e),
        }
        result
    }

    async fn try_add_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<CartProjection, DomainError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let mut tx = self.store.begin().await?;

        let item = tx
            .get_item_by_id(item_id)
            .await?
            .ok_or(CartError::ItemNotFound { item_id })?;
        if item.quantity <= 0 {
            return Err(CartError::OutOfStock { item_id }.into());
        }
        if quantity > item.quantity {
            return Err(CartError::InsufficientQuantity {
                requested: quantity,
                available: item.quantity,
            }
            .into());
        }

        let cart = match tx.get_cart_by_customer(caller.user_id).await? {
            Some(cart) => cart,
            None => {
                if tx.get_user_by_id(caller.user_id).await?.is_none() {
                    return Err(CartError::CustomerNotFound {
                        customer_id: caller.user_id,
                    }
                    .into());
                }
                // a concurrent first add for the same customer loses here on
                // the unique constraint and surfaces as a data error
                tx.create_cart(caller.user_id).await?
            }
        };

        // Can still fail on the non-negative check if another request took
        // the stock after our read. No row touched means the item was
        // deleted after our read.
        if tx.decrement_stock(item_id, quantity).await? == 0 {
            return Err(CartError::ItemNotFound { item_id }.into());
        }

        let existing = tx
            .get_line_items(cart.id)
            .await?
            .into_iter()
            .find(|line| line.item_id == item_id);
        match existing {
            Some(line) => {
                let merged = line
                    .quantity_in_cart
                    .checked_add(quantity)
                    .ok_or(CartError::InvalidQuantity { quantity })?;
                tx.update_line_item_quantity(line.id, merged).await?;
            }
            None => {
                tx.add_line_item(cart.id, item_id, quantity).await?;
            }
        }

        let projection = project(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(projection)
    }

    async fn try_remove_item(
        &self,
        caller: &Caller,
        line_item_id: LineItemId,
        quantity: i32,
    ) -> Result<CartProjection, DomainError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let mut tx = self.store.begin().await?;

        // Fetched first so the cart row is locked before the line is read.
        let cart = tx.get_cart_by_customer(caller.user_id).await?;
        let line = tx
            .get_line_item_by_id(line_item_id)
            .await?
            .ok_or(CartError::CartLineItemNotFound { line_item_id })?;
        let cart = cart
            .filter(|c| c.id == line.cart_id)
            .ok_or(CartError::CartNotFound)?;

        if quantity > line.quantity_in_cart {
            return Err(CartError::InsufficientCartQuantity {
                requested: quantity,
                in_cart: line.quantity_in_cart,
            }
            .into());
        }

        let restocked = tx.increment_stock(line.item_id, quantity).await?;
        if restocked == 0 {
            tracing::warn!(item_id = %line.item_id, quantity, "item no longer in inventory, units not restocked");
        }

        if quantity == line.quantity_in_cart {
            tx.delete_line_item(line.id).await?;
        } else {
            tx.update_line_item_quantity(line.id, line.quantity_in_cart - quantity)
                .await?;
        }

        let projection = project(&mut tx, &cart).await?;
        tx.commit().await?;
        Ok(projection)
    }
}

/// Builds the projection of a cart from its live lines and the current item
/// rows, deleted items included.
async fn project<T: Transaction>(tx: &mut T, cart: &Cart) -> Result<CartProjection, DomainError> {
    let lines = tx.get_line_items(cart.id).await?;
    let ids: Vec<ItemId> = lines.iter().map(|l| l.item_id).collect();
    let mut items: HashMap<ItemId, _> = tx
        .get_items_by_ids(&ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut projected = Vec::with_capacity(lines.len());
    for line in lines {
        let item = items.remove(&line.item_id).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "line item {} references missing item {}",
                line.id, line.item_id
            ))
        })?;
        projected.push(CartLine {
            line_item_id: line.id,
            quantity_in_cart: line.quantity_in_cart,
            item,
        });
    }

    Ok(CartProjection::new(cart, projected)?)
}

fn record_failure(err: &DomainError) {
    metrics::counter!("cart_operation_failures_total", "code" => err.code()).increment(1);
    tracing::debug!(code = err.code(), error = %err, "cart operation failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, UserId};
    use store::{InMemoryStore, ItemCategory, NewItem, NewUser, UserRole, UserStatus};

    async fn seed(store: &InMemoryStore, stock: i32) -> (Caller, ItemId) {
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .create_user(NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                role: UserRole::Customer,
                status: UserStatus::Active,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let item = tx
            .create_item(NewItem {
                category: ItemCategory::Books,
                name: "Notes on the Analytical Engine".to_string(),
                price: Money::from_cents(1250),
                description: None,
                image: None,
                quantity: stock,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (Caller::customer(user.id), item.id)
    }

    #[tokio::test]
    async fn add_then_merge() {
        let store = InMemoryStore::new();
        let (caller, item_id) = seed(&store, 10).await;
        let service = CartService::new(store.clone());

        let cart = service.add_item(&caller, item_id, 2).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].item.quantity, 8);

        let cart = service.add_item(&caller, item_id, 3).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity_in_cart, 5);
        assert_eq!(cart.total_price, Money::from_cents(6250));
        assert_eq!(store.item_quantity(item_id).await, Some(5));
    }

    #[tokio::test]
    async fn quantity_must_be_positive() {
        let store = InMemoryStore::new();
        let (caller, item_id) = seed(&store, 10).await;
        let service = CartService::new(store.clone());

        for quantity in [0, -3] {
            let err = service.add_item(&caller, item_id, quantity).await.unwrap_err();
            assert_eq!(err.code(), "INVALID_QUANTITY");
            let err = service
                .remove_item(&caller, LineItemId::new(), quantity)
                .await
                .unwrap_err();
            assert_eq!(err.code(), "INVALID_QUANTITY");
        }
        assert_eq!(store.item_quantity(item_id).await, Some(10));
    }

    #[tokio::test]
    async fn get_cart_does_not_create_one() {
        let store = InMemoryStore::new();
        let (caller, _) = seed(&store, 1).await;
        let service = CartService::new(store.clone());

        let err = service.get_cart(&caller).await.unwrap_err();
        assert!(matches!(err, DomainError::Cart(CartError::CartNotFound)));
        assert_eq!(store.cart_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_customer_cannot_get_a_cart() {
        let store = InMemoryStore::new();
        let (_, item_id) = seed(&store, 3).await;
        let service = CartService::new(store.clone());

        let stranger = Caller::customer(UserId::new());
        let err = service.add_item(&stranger, item_id, 1).await.unwrap_err();
        assert_eq!(err.code(), "CUSTOMER_NOT_FOUND");
        assert_eq!(store.item_quantity(item_id).await, Some(3));
    }

    #[tokio::test]
    async fn line_of_another_cart_reports_cart_not_found() {
        let store = InMemoryStore::new();
        let (owner, item_id) = seed(&store, 5).await;
        let service = CartService::new(store.clone());
        let cart = service.add_item(&owner, item_id, 1).await.unwrap();
        let line_id = cart.lines[0].line_item_id;

        let mut tx = store.begin().await.unwrap();
        let other = tx
            .create_user(NewUser {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "grace@example.com".to_string(),
                role: UserRole::Customer,
                status: UserStatus::Active,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        let other = Caller::customer(other.id);

        // no cart at all
        let err = service.remove_item(&other, line_id, 1).await.unwrap_err();
        assert_eq!(err.code(), "CART_NOT_FOUND");

        // a cart, but not the one owning the line
        service.add_item(&other, item_id, 1).await.unwrap();
        let err = service.remove_item(&other, line_id, 1).await.unwrap_err();
        assert_eq!(err.code(), "CART_NOT_FOUND");
        assert_eq!(store.item_quantity(item_id).await, Some(3));
    }
}
