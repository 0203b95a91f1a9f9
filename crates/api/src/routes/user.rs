//! Signup and login endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use domain::{Envelope, LoginResponse, SignupRequest, UserProfile};
use serde::Deserialize;
use store::Store;

use crate::auth::Ctx;
use crate::error::{ApiError, ForRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /v1/user/signup: register a customer.
pub async fn signup<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Ctx(ctx): Ctx,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<UserProfile>>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(&ctx.request_id, e.body_text()))?;

    let profile = state
        .user_service
        .signup(&ctx, request)
        .await
        .for_request(&ctx.request_id)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data_with_message(
            ctx.request_id,
            profile,
            "User created successfully",
        )),
    ))
}

/// POST /v1/user/login: exchange credentials for an access token.
pub async fn login<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Ctx(ctx): Ctx,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Envelope<LoginResponse>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(&ctx.request_id, e.body_text()))?;

    let response = state
        .user_service
        .login(&ctx, &request.email, &request.password)
        .await
        .for_request(&ctx.request_id)?;

    Ok(Json(Envelope::data(ctx.request_id, response)))
}
