//! Persistence layer for the cart backend.
//!
//! Records are plain data ([`model`]); access goes through the store traits in
//! [`store`], implemented by [`InMemoryStore`] and [`PostgresStore`]. Every
//! read and write happens inside a [`Transaction`] obtained from
//! [`Store::begin`]; dropping a transaction without committing discards it.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{CartId, ItemId, LineItemId, Money, UserId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use model::{
    Cart, CartLineItem, Item, ItemCategory, NewItem, NewUser, ParseEnumError, User, UserRole,
    UserStatus,
};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use store::{CartStore, InventoryStore, Store, Transaction, UserStore};
