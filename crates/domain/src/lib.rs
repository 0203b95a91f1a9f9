//! Domain layer for the cart backend.
//!
//! This crate provides the services that sit between the HTTP surface and the
//! stores:
//! - [`CartService`]: adds and removes cart quantities while keeping inventory
//!   stock in step, one transaction per call
//! - [`InventoryService`]: item listing and creation with duplicate checks
//! - [`UserService`] and [`CustomerService`]: signup, login, authentication and
//!   customer suspension
//!
//! Every call takes the caller explicitly ([`Caller`] or [`RequestContext`]);
//! there is no ambient request state.

pub mod caller;
pub mod cart;
pub mod envelope;
pub mod error;
pub mod inventory;
pub mod user;

pub use caller::{Caller, RequestContext};
pub use cart::{CartError, CartLine, CartProjection, CartService};
pub use envelope::{Envelope, ErrorBody};
pub use error::{DomainError, ErrorKind};
pub use inventory::{InventoryError, InventoryService};
pub use user::{
    CustomerService, LoginResponse, SignupRequest, TokenIssuer, UserError, UserProfile,
    UserService,
};
