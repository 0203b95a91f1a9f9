//! Inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ItemId;
use domain::Envelope;
use store::{Item, NewItem, Store};

use crate::auth::AuthCaller;
use crate::error::{ApiError, ForRequest};
use crate::rbac::{Action, Resource};
use crate::state::AppState;

/// GET /v1/inventory/items
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
) -> Result<Json<Envelope<Vec<Item>>>, ApiError> {
    let caller = auth.require(Resource::Inventory, Action::Read)?;

    let items = state
        .inventory_service
        .list_items(&caller)
        .await
        .for_request(&caller.request_id)?;

    Ok(Json(Envelope::data(caller.request_id, items)))
}

/// GET /v1/inventory/items/{id}
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Item>>, ApiError> {
    let caller = auth.require(Resource::Inventory, Action::Read)?;
    let item_id = ItemId::parse(&id)
        .map_err(|e| ApiError::bad_request(&caller.request_id, format!("Invalid item id: {e}")))?;

    let item = state
        .inventory_service
        .get_item(&caller, item_id)
        .await
        .for_request(&caller.request_id)?;

    Ok(Json(Envelope::data(caller.request_id, item)))
}

/// POST /v1/inventory/items
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Item>>), ApiError> {
    let caller = auth.require(Resource::Inventory, Action::Write)?;
    let Json(new_item) =
        payload.map_err(|e| ApiError::bad_request(&caller.request_id, e.body_text()))?;

    let item = state
        .inventory_service
        .add_item(&caller, new_item)
        .await
        .for_request(&caller.request_id)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data_with_message(
            caller.request_id,
            item,
            "Item added to inventory",
        )),
    ))
}
