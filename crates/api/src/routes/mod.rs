//! HTTP handlers grouped by resource.

pub mod cart;
pub mod customer;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod user;
