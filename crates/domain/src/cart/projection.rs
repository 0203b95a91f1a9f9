use common::{CartId, LineItemId, Money, UserId};
use serde::{Deserialize, Serialize};
use store::{Cart, Item};

use super::CartError;

/// One line of a cart together with the item as it is stored right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_item_id: LineItemId,
    pub quantity_in_cart: i32,
    pub item: Item,
}

impl CartLine {
    /// Price times quantity, `None` when it does not fit in `Money`.
    pub fn total_price(&self) -> Option<Money> {
        self.item.price.checked_multiply(self.quantity_in_cart)
    }
}

/// Read shape of a customer's cart returned by every cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProjection {
    pub cart_id: CartId,
    pub customer_id: UserId,
    pub lines: Vec<CartLine>,
    pub total_price: Money,
}

impl CartProjection {
    pub fn new(cart: &Cart, lines: Vec<CartLine>) -> Result<Self, CartError> {
        let total_price = lines
            .iter()
            .try_fold(Money::zero(), |total, line| {
                line.total_price().and_then(|price| total.checked_add(price))
            })
            .ok_or(CartError::TotalOverflow)?;
        Ok(Self {
            cart_id: cart.id,
            customer_id: cart.customer_id,
            lines,
            total_price,
        })
    }

    /// Finds the line holding the given item.
    pub fn line_for(&self, item_id: common::ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item.id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
