//! Cart endpoints for the authenticated customer.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{ItemId, LineItemId};
use domain::{CartProjection, Envelope};
use serde::Deserialize;
use store::Store;

use crate::auth::AuthCaller;
use crate::error::{ApiError, ForRequest};
use crate::rbac::{Action, Resource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i32,
}

/// GET /v1/cart
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
) -> Result<Json<Envelope<CartProjection>>, ApiError> {
    let caller = auth.require(Resource::Cart, Action::Read)?;

    let cart = state
        .cart_service
        .get_cart(&caller)
        .await
        .for_request(&caller.request_id)?;

    Ok(Json(Envelope::data(caller.request_id, cart)))
}

/// POST /v1/cart/items/{item_id}: move units of an item into the cart.
pub async fn add_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
    Path(item_id): Path<String>,
    payload: Result<Json<QuantityRequest>, JsonRejection>,
) -> Result<Json<Envelope<CartProjection>>, ApiError> {
    let caller = auth.require(Resource::Cart, Action::Write)?;
    let item_id = ItemId::parse(&item_id)
        .map_err(|e| ApiError::bad_request(&caller.request_id, format!("Invalid item id: {e}")))?;
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(&caller.request_id, e.body_text()))?;

    let cart = state
        .cart_service
        .add_item(&caller, item_id, request.quantity)
        .await
        .for_request(&caller.request_id)?;

    Ok(Json(Envelope::data(caller.request_id, cart)))
}

/// DELETE /v1/cart/line-items/{line_id}: move units of a line back to inventory.
pub async fn remove_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
    Path(line_id): Path<String>,
    payload: Result<Json<QuantityRequest>, JsonRejection>,
) -> Result<Json<Envelope<CartProjection>>, ApiError> {
    let caller = auth.require(Resource::Cart, Action::Delete)?;
    let line_item_id = LineItemId::parse(&line_id).map_err(|e| {
        ApiError::bad_request(&caller.request_id, format!("Invalid line item id: {e}"))
    })?;
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(&caller.request_id, e.body_text()))?;

    let cart = state
        .cart_service
        .remove_item(&caller, line_item_id, request.quantity)
        .await
        .for_request(&caller.request_id)?;

    Ok(Json(Envelope::data(caller.request_id, cart)))
}
