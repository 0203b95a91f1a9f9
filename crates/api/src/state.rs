//! Shared application state.

use std::sync::Arc;

use domain::{CartService, CustomerService, InventoryService, UserService};
use store::Store;

use crate::auth::JwtKeys;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub cart_service: CartService<S>,
    pub inventory_service: InventoryService<S>,
    pub user_service: UserService<S>,
    pub customer_service: CustomerService<S>,
    pub jwt: Arc<JwtKeys>,
    pub store: S,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(store: S, jwt: JwtKeys) -> Self {
        let jwt = Arc::new(jwt);
        Self {
            cart_service: CartService::new(store.clone()),
            inventory_service: InventoryService::new(store.clone()),
            user_service: UserService::new(store.clone(), jwt.clone()),
            customer_service: CustomerService::new(store.clone()),
            jwt,
            store,
        }
    }
}
