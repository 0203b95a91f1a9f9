//! Customer carts and the stock bookkeeping around them.

mod projection;
mod service;

pub use projection::{CartLine, CartProjection};
pub use service::CartService;

use common::{ItemId, LineItemId, UserId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i32 },

    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    #[error("Item is out of stock: {item_id}")]
    OutOfStock { item_id: ItemId },

    #[error("Not enough stock: requested {requested}, available {available}")]
    InsufficientQuantity { requested: i32, available: i32 },

    #[error("Customer not found: {customer_id}")]
    CustomerNotFound { customer_id: UserId },

    /// The caller has no cart, or the addressed line lives in someone else's.
    #[error("No cart found for customer")]
    CartNotFound,

    #[error("Cart item not found: {line_item_id}")]
    CartLineItemNotFound { line_item_id: LineItemId },

    #[error("Not enough quantity in cart: requested {requested}, in cart {in_cart}")]
    InsufficientCartQuantity { requested: i32, in_cart: i32 },

    #[error("Cart total exceeds the largest supported amount")]
    TotalOverflow,
}

impl CartError {
    pub fn code(&self) -> &'static str {
        match self {
            CartError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CartError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            CartError::OutOfStock { .. } => "OUT_OF_STOCK",
            CartError::InsufficientQuantity { .. } => "INSUFFICIENT_QUANTITY",
            CartError::CustomerNotFound { .. } => "CUSTOMER_NOT_FOUND",
            CartError::CartNotFound => "CART_NOT_FOUND",
            CartError::CartLineItemNotFound { .. } => "CART_LINE_ITEM_NOT_FOUND",
            CartError::InsufficientCartQuantity { .. } => "INSUFFICIENT_CART_QUANTITY",
            CartError::TotalOverflow => "CART_TOTAL_OVERFLOW",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::ItemNotFound { .. }
            | CartError::CustomerNotFound { .. }
            | CartError::CartNotFound
            | CartError::CartLineItemNotFound { .. } => ErrorKind::NotFound,
            CartError::InvalidQuantity { .. }
            | CartError::OutOfStock { .. }
            | CartError::InsufficientQuantity { .. }
            | CartError::InsufficientCartQuantity { .. }
            | CartError::TotalOverflow => ErrorKind::Validation,
        }
    }
}
