//! Identifier and value types shared across the store, domain and API crates.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CartId, ItemId, LineItemId, UserId};
