use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Cart, CartId, CartLineItem, Item, ItemCategory, ItemId, LineItemId, NewItem, NewUser, Result,
    StoreError, User, UserId, UserRole, UserStatus,
    store::{CartStore, InventoryStore, Store, Transaction, UserStore},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: Vec<Item>,
    carts: Vec<Cart>,
    line_items: Vec<CartLineItem>,
    users: Vec<User>,
}

/// In-memory store implementation for tests and local runs.
///
/// Transactions are serialized: [`begin`](Store::begin) takes an exclusive
/// lock on the whole state and hands out a working copy that replaces the
/// shared state on commit. The same constraints as the relational schema are
/// enforced: stock never goes negative, one cart per customer, one email per
/// user.
///
/// Every transaction copies the whole state, so its cost grows with the
/// number of stored rows. Use it for tests and local runs only; anything
/// serving real traffic should run on `PostgresStore`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_line_item_write: Arc<AtomicBool>,
    miss_next_stock_update: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next line-item insert or update fail with
    /// [`StoreError::Injected`].
    pub fn fail_next_line_item_write(&self) {
        self.fail_next_line_item_write.store(true, Ordering::SeqCst);
    }

    /// Makes the next stock decrement or increment touch no row, as if the
    /// item had been deleted between the read and the update.
    pub fn miss_next_stock_update(&self) {
        self.miss_next_stock_update.store(true, Ordering::SeqCst);
    }

    /// Returns the committed stock of an item, deleted or not.
    pub async fn item_quantity(&self, id: ItemId) -> Option<i32> {
        let state = self.state.lock().await;
        state.items.iter().find(|i| i.id == id).map(|i| i.quantity)
    }

    /// Returns the number of committed, non-deleted line items across all carts.
    pub async fn line_item_count(&self) -> usize {
        let state = self.state.lock().await;
        state.line_items.iter().filter(|l| !l.is_deleted).count()
    }

    /// Returns the number of committed carts.
    pub async fn cart_count(&self) -> usize {
        self.state.lock().await.carts.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction {
            guard,
            working,
            fail_next_line_item_write: self.fail_next_line_item_write.clone(),
            miss_next_stock_update: self.miss_next_stock_update.clone(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Transaction over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_next_line_item_write: Arc<AtomicBool>,
    miss_next_stock_update: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    fn check_injected_failure(&self) -> Result<()> {
        if self.fail_next_line_item_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Injected("line item write"));
        }
        Ok(())
    }

    fn stock_target_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        if self.miss_next_stock_update.swap(false, Ordering::SeqCst) {
            return None;
        }
        self.live_item_mut(id)
    }

    fn live_item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.working
            .items
            .iter_mut()
            .find(|i| i.id == id && !i.is_deleted)
    }

    fn live_line_mut(&mut self, id: LineItemId) -> Option<&mut CartLineItem> {
        self.working
            .line_items
            .iter_mut()
            .find(|l| l.id == id && !l.is_deleted)
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(mut self) -> Result<()> {
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for InMemoryTransaction {
    async fn get_item_by_id(&mut self, id: ItemId) -> Result<Option<Item>> {
        Ok(self
            .working
            .items
            .iter()
            .find(|i| i.id == id && !i.is_deleted)
            .cloned())
    }

    async fn get_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        Ok(self
            .working
            .items
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn get_item_by_name_and_category(
        &mut self,
        name: &str,
        category: ItemCategory,
    ) -> Result<Option<Item>> {
        Ok(self
            .working
            .items
            .iter()
            .find(|i| i.name == name && i.category == category && !i.is_deleted)
            .cloned())
    }

    async fn create_item(&mut self, item: NewItem) -> Result<Item> {
        if item.quantity < 0 {
            return Err(StoreError::CheckViolation {
                constraint: "item_quantity_non_negative".to_string(),
            });
        }
        if self
            .working
            .items
            .iter()
            .any(|i| i.name == item.name && i.category == item.category && !i.is_deleted)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "items_name_category_unique".to_string(),
            });
        }

        let now = Utc::now();
        let record = Item {
            id: ItemId::new(),
            category: item.category,
            name: item.name,
            price: item.price,
            description: item.description,
            image: item.image,
            quantity: item.quantity,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        self.working.items.push(record.clone());
        Ok(record)
    }

    async fn list_items(&mut self) -> Result<Vec<Item>> {
        Ok(self
            .working
            .items
            .iter()
            .filter(|i| !i.is_deleted)
            .cloned()
            .collect())
    }

    async fn decrement_stock(&mut self, id: ItemId, quantity: i32) -> Result<u64> {
        let Some(item) = self.stock_target_mut(id) else {
            return Ok(0);
        };
        let remaining = item.quantity - quantity;
        if remaining < 0 {
            return Err(StoreError::CheckViolation {
                constraint: "item_quantity_non_negative".to_string(),
            });
        }
        item.quantity = remaining;
        item.updated_at = Utc::now();
        Ok(1)
    }

    async fn increment_stock(&mut self, id: ItemId, quantity: i32) -> Result<u64> {
        let Some(item) = self.stock_target_mut(id) else {
            return Ok(0);
        };
        item.quantity += quantity;
        item.updated_at = Utc::now();
        Ok(1)
    }
}

#[async_trait]
impl CartStore for InMemoryTransaction {
    async fn get_cart_by_customer(&mut self, customer_id: UserId) -> Result<Option<Cart>> {
        Ok(self
            .working
            .carts
            .iter()
            .find(|c| c.customer_id == customer_id && !c.is_deleted)
            .cloned())
    }

    async fn create_cart(&mut self, customer_id: UserId) -> Result<Cart> {
        if self
            .working
            .carts
            .iter()
            .any(|c| c.customer_id == customer_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "cart_customer_unique".to_string(),
            });
        }

        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(),
            customer_id,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        self.working.carts.push(cart.clone());
        Ok(cart)
    }

    async fn get_line_items(&mut self, cart_id: CartId) -> Result<Vec<CartLineItem>> {
        Ok(self
            .working
            .line_items
            .iter()
            .filter(|l| l.cart_id == cart_id && !l.is_deleted)
            .cloned()
            .collect())
    }

    async fn get_line_item_by_id(&mut self, id: LineItemId) -> Result<Option<CartLineItem>> {
        Ok(self
            .working
            .line_items
            .iter()
            .find(|l| l.id == id && !l.is_deleted)
            .cloned())
    }

    async fn add_line_item(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<CartLineItem> {
        self.check_injected_failure()?;
        if quantity < 1 {
            return Err(StoreError::CheckViolation {
                constraint: "line_item_quantity_positive".to_string(),
            });
        }
        if self
            .working
            .line_items
            .iter()
            .any(|l| l.cart_id == cart_id && l.item_id == item_id && !l.is_deleted)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "cart_line_items_cart_item_unique".to_string(),
            });
        }

        let now = Utc::now();
        let line = CartLineItem {
            id: LineItemId::new(),
            cart_id,
            item_id,
            quantity_in_cart: quantity,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        self.working.line_items.push(line.clone());
        Ok(line)
    }

    async fn update_line_item_quantity(&mut self, id: LineItemId, quantity: i32) -> Result<u64> {
        self.check_injected_failure()?;
        if quantity < 1 {
            return Err(StoreError::CheckViolation {
                constraint: "line_item_quantity_positive".to_string(),
            });
        }
        let Some(line) = self.live_line_mut(id) else {
            return Ok(0);
        };
        line.quantity_in_cart = quantity;
        line.updated_at = Utc::now();
        Ok(1)
    }

    async fn delete_line_item(&mut self, id: LineItemId) -> Result<u64> {
        let Some(line) = self.live_line_mut(id) else {
            return Ok(0);
        };
        line.is_deleted = true;
        line.updated_at = Utc::now();
        Ok(1)
    }
}

#[async_trait]
impl UserStore for InMemoryTransaction {
    async fn get_user_by_id(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.id == id && !u.is_deleted)
            .cloned())
    }

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.email == email && !u.is_deleted)
            .cloned())
    }

    async fn get_active_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.email == email && u.status == UserStatus::Active && !u.is_deleted)
            .cloned())
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User> {
        if self
            .working
            .users
            .iter()
            .any(|u| u.email == user.email && !u.is_deleted)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "users_email_unique".to_string(),
            });
        }

        let now = Utc::now();
        let record = User {
            id: UserId::new(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            status: user.status,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        self.working.users.push(record.clone());
        Ok(record)
    }

    async fn update_user_status(
        &mut self,
        id: UserId,
        status: UserStatus,
        role: Option<UserRole>,
    ) -> Result<u64> {
        let Some(user) = self.working.users.iter_mut().find(|u| {
            u.id == id && !u.is_deleted && role.is_none_or(|r| u.role == r)
        }) else {
            return Ok(0);
        };
        user.status = status;
        user.updated_at = Utc::now();
        Ok(1)
    }
}
