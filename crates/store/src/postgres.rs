use async_trait::async_trait;
use common::Money;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Cart, CartId, CartLineItem, Item, ItemCategory, ItemId, LineItemId, NewItem, NewUser, Result,
    StoreError, User, UserId, UserRole, UserStatus,
    store::{CartStore, InventoryStore, Store, Transaction, UserStore},
};

const ITEM_COLUMNS: &str = "id, category, name, price_cents, description, image, quantity, created_at, updated_at, is_deleted";
const CART_COLUMNS: &str = "id, customer_id, created_at, updated_at, is_deleted";
const LINE_COLUMNS: &str =
    "id, cart_id, item_id, quantity_in_cart, created_at, updated_at, is_deleted";
const USER_COLUMNS: &str = "id, first_name, last_name, email, role, status, password_hash, created_at, updated_at, is_deleted";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTransaction { tx })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction over a [`PostgresStore`]. Runs at READ COMMITTED; correctness
/// of concurrent stock changes comes from single-statement updates and the
/// table constraints.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

fn parse_enum<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = crate::ParseEnumError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: crate::ParseEnumError| StoreError::Corrupt(e.to_string()))
}

fn row_to_item(row: PgRow) -> Result<Item> {
    Ok(Item {
        id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        category: parse_enum::<ItemCategory>(&row, "category")?,
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        quantity: row.try_get("quantity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_deleted: row.try_get("is_deleted")?,
    })
}

fn row_to_cart(row: PgRow) -> Result<Cart> {
    Ok(Cart {
        id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
        customer_id: UserId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_deleted: row.try_get("is_deleted")?,
    })
}

fn row_to_line(row: PgRow) -> Result<CartLineItem> {
    Ok(CartLineItem {
        id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
        item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("item_id")?),
        quantity_in_cart: row.try_get("quantity_in_cart")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_deleted: row.try_get("is_deleted")?,
    })
}

fn row_to_user(row: PgRow) -> Result<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        role: parse_enum::<UserRole>(&row, "role")?,
        status: parse_enum::<UserStatus>(&row, "status")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_deleted: row.try_get("is_deleted")?,
    })
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresTransaction {
    async fn get_item_by_id(&mut self, id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_item).transpose()
    }

    async fn get_items_by_ids(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        let uuids: Vec<Uuid> = ids.iter().map(ItemId::as_uuid).collect();
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ANY($1) ORDER BY row_id ASC"
        ))
        .bind(uuids)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn get_item_by_name_and_category(
        &mut self,
        name: &str,
        category: ItemCategory,
    ) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE name = $1 AND category = $2 AND NOT is_deleted"
        ))
        .bind(name)
        .bind(category.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_item).transpose()
    }

    async fn create_item(&mut self, item: NewItem) -> Result<Item> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO items (id, category, name, price_cents, description, image, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(item.category.as_str())
        .bind(&item.name)
        .bind(item.price.cents())
        .bind(&item.description)
        .bind(&item.image)
        .bind(item.quantity)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        row_to_item(row)
    }

    async fn list_items(&mut self) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE NOT is_deleted ORDER BY row_id ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn decrement_stock(&mut self, id: ItemId, quantity: i32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE items SET quantity = quantity - $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected())
    }

    async fn increment_stock(&mut self, id: ItemId, quantity: i32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE items SET quantity = quantity + $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CartStore for PostgresTransaction {
    async fn get_cart_by_customer(&mut self, customer_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE customer_id = $1 AND NOT is_deleted FOR UPDATE"
        ))
        .bind(customer_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_cart).transpose()
    }

    async fn create_cart(&mut self, customer_id: UserId) -> Result<Cart> {
        let row = sqlx::query(&format!(
            "INSERT INTO carts (id, customer_id) VALUES ($1, $2) RETURNING {CART_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(customer_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        row_to_cart(row)
    }

    async fn get_line_items(&mut self, cart_id: CartId) -> Result<Vec<CartLineItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_line_items WHERE cart_id = $1 AND NOT is_deleted ORDER BY row_id ASC"
        ))
        .bind(cart_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_line).collect()
    }

    async fn get_line_item_by_id(&mut self, id: LineItemId) -> Result<Option<CartLineItem>> {
        let row = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_line_items WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_line).transpose()
    }

    async fn add_line_item(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<CartLineItem> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cart_line_items (id, cart_id, item_id, quantity_in_cart)
            VALUES ($1, $2, $3, $4)
            RETURNING {LINE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(cart_id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        row_to_line(row)
    }

    async fn update_line_item_quantity(&mut self, id: LineItemId, quantity: i32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE cart_line_items SET quantity_in_cart = $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected())
    }

    async fn delete_line_item(&mut self, id: LineItemId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE cart_line_items SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted
            "#,
        )
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserStore for PostgresTransaction {
    async fn get_user_by_id(&mut self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_user).transpose()
    }

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND NOT is_deleted"
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_user).transpose()
    }

    async fn get_active_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND status = $2 AND NOT is_deleted"
        ))
        .bind(email)
        .bind(UserStatus::Active.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_user).transpose()
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, first_name, last_name, email, role, status, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(&user.password_hash)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        row_to_user(row)
    }

    async fn update_user_status(
        &mut self,
        id: UserId,
        status: UserStatus,
        role: Option<UserRole>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users SET status = $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_deleted AND ($3::VARCHAR IS NULL OR role = $3)
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(role.map(|r| r.as_str()))
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }
}
