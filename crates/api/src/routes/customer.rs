//! Admin actions on customer accounts.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::UserId;
use domain::Envelope;
use store::Store;

use crate::auth::AuthCaller;
use crate::error::{ApiError, ForRequest};
use crate::rbac::{Action, Resource};
use crate::state::AppState;

/// DELETE /v1/customer/{id}/suspend
pub async fn suspend<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthCaller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let caller = auth.require(Resource::Customer, Action::Delete)?;
    let customer_id = UserId::parse(&id)
        .map_err(|e| ApiError::bad_request(&caller.request_id, format!("Invalid customer id: {e}")))?;

    state
        .customer_service
        .suspend_customer(&caller, customer_id)
        .await
        .for_request(&caller.request_id)?;

    Ok(Json(Envelope::message(
        caller.request_id,
        "Customer suspended successfully",
    )))
}
