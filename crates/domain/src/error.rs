//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::inventory::InventoryError;
use crate::user::UserError;

/// Coarse classification of a failure, used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Unauthorized,
    /// Storage integrity violations and other backend failures.
    Data,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    User(#[from] UserError),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Cart(e) => e.code(),
            DomainError::Inventory(e) => e.code(),
            DomainError::User(e) => e.code(),
            DomainError::Store(_) => "DATA_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Cart(e) => e.kind(),
            DomainError::Inventory(e) => e.kind(),
            DomainError::User(e) => e.kind(),
            DomainError::Store(_) => ErrorKind::Data,
        }
    }

    /// Message safe to show to clients. Backend details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            DomainError::Store(StoreError::CheckViolation { .. })
            | DomainError::Store(StoreError::UniqueViolation { .. }) => {
                "Integrity error for data provided".to_string()
            }
            other if other.kind() == ErrorKind::Data => "Data source error".to_string(),
            other => other.to_string(),
        }
    }
}
