use async_trait::async_trait;

use crate::{
    Cart, CartId, CartLineItem, Item, ItemCategory, ItemId, LineItemId, NewItem, NewUser, Result,
    User, UserId, UserRole, UserStatus,
};

/// Item records and their stock counters.
///
/// Lookups ignore soft-deleted items unless stated otherwise. Stock changes
/// are single row updates evaluated by the store, never read-modify-write in
/// the caller, and return the number of rows touched (0 when the item does
/// not resolve).
#[async_trait]
pub trait InventoryStore: Send {
    async fn get_item_by_id(&mut self, id: ItemId) -> Result<Option<Item>>;

    /// Fetches items by id including soft-deleted ones, for cart snapshots.
    async fn get_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>>;

    async fn get_item_by_name_and_category(
        &mut self,
        name: &str,
        category: ItemCategory,
    ) -> Result<Option<Item>>;

    async fn create_item(&mut self, item: NewItem) -> Result<Item>;

    /// Lists every non-deleted item, oldest first.
    async fn list_items(&mut self) -> Result<Vec<Item>>;

    /// Subtracts `quantity` from the item's stock.
    ///
    /// Fails with [`StoreError::CheckViolation`](crate::StoreError::CheckViolation)
    /// if the stock would become negative.
    async fn decrement_stock(&mut self, id: ItemId, quantity: i32) -> Result<u64>;

    /// Adds `quantity` to the item's stock.
    async fn increment_stock(&mut self, id: ItemId, quantity: i32) -> Result<u64>;
}

/// Carts and their line items.
#[async_trait]
pub trait CartStore: Send {
    /// Fetches the customer's cart. Relational stores lock the cart row for
    /// the rest of the transaction so mutations of one cart serialize.
    async fn get_cart_by_customer(&mut self, customer_id: UserId) -> Result<Option<Cart>>;

    /// Creates a cart. Fails with
    /// [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation) if the
    /// customer already has one.
    async fn create_cart(&mut self, customer_id: UserId) -> Result<Cart>;

    /// Non-deleted lines of a cart, oldest first.
    async fn get_line_items(&mut self, cart_id: CartId) -> Result<Vec<CartLineItem>>;

    async fn get_line_item_by_id(&mut self, id: LineItemId) -> Result<Option<CartLineItem>>;

    async fn add_line_item(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<CartLineItem>;

    async fn update_line_item_quantity(&mut self, id: LineItemId, quantity: i32) -> Result<u64>;

    /// Soft-deletes a line.
    async fn delete_line_item(&mut self, id: LineItemId) -> Result<u64>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send {
    async fn get_user_by_id(&mut self, id: UserId) -> Result<Option<User>>;

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>>;

    async fn get_active_user_by_email(&mut self, email: &str) -> Result<Option<User>>;

    async fn create_user(&mut self, user: NewUser) -> Result<User>;

    /// Sets a user's status. When `role` is given only a user holding that role
    /// is updated.
    async fn update_user_status(
        &mut self,
        id: UserId,
        status: UserStatus,
        role: Option<UserRole>,
    ) -> Result<u64>;
}

/// A unit of work spanning all stores.
///
/// Either every write made through it becomes visible on [`commit`](Self::commit)
/// or none does. Dropping a transaction rolls it back.
#[async_trait]
pub trait Transaction: InventoryStore + CartStore + UserStore {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Entry point to a storage backend.
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: Transaction;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}
