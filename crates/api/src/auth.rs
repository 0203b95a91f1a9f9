//! Bearer token issuance and the request extractors that authenticate callers.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use common::UserId;
use domain::{Caller, RequestContext, TokenIssuer, UserError};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use store::{Store, User, UserRole};

use crate::error::{ApiError, ForRequest};
use crate::rbac::{self, Action, Resource};
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: UserRole,
    pub email: String,
    pub exp: i64,
}

/// HS256 keys and token lifetime.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, expire_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            expires_in: Duration::minutes(expire_minutes),
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, UserError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| UserError::Token(e.to_string()))
    }

    /// Verifies the signature and expiry of a token.
    pub fn decode(&self, token: &str) -> Result<Claims, UserError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected access token");
                UserError::Unauthenticated("invalid token")
            })
    }
}

impl TokenIssuer for JwtKeys {
    fn issue(&self, user: &User) -> Result<String, UserError> {
        self.encode(&Claims {
            sub: user.id,
            role: user.role,
            email: user.email.clone(),
            exp: (Utc::now() + self.expires_in).timestamp(),
        })
    }
}

/// Request metadata for every handler: the client's `X-Request-ID` or a fresh id.
pub struct Ctx(pub RequestContext);

fn request_context(parts: &Parts) -> RequestContext {
    parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(RequestContext::with_request_id)
        .unwrap_or_default()
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Ctx(request_context(parts)))
    }
}

/// An authenticated caller. Rejects with 401 when the bearer token is
/// missing or invalid, or the user is gone, changed role or is not active.
pub struct AuthCaller(pub Caller);

impl AuthCaller {
    /// Checks the caller's role against the access table.
    pub fn require(self, resource: Resource, action: Action) -> Result<Caller, ApiError> {
        let caller = self.0;
        if rbac::authorize(resource, action, caller.role) {
            Ok(caller)
        } else {
            tracing::info!(
                request_id = %caller.request_id,
                user_id = %caller.user_id,
                role = %caller.role,
                %resource,
                %action,
                "access denied"
            );
            Err(ApiError::forbidden(caller.request_id, resource, action))
        }
    }
}

impl<S: Store + 'static> FromRequestParts<Arc<AppState<S>>> for AuthCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = request_context(parts);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized(&ctx.request_id, "Missing bearer token"))?;

        let claims = state
            .jwt
            .decode(token.trim())
            .map_err(|e| ApiError::unauthorized(&ctx.request_id, e.to_string()))?;

        let caller = state
            .user_service
            .authenticate(&ctx, claims.sub, claims.role)
            .await
            .for_request(&ctx.request_id)?;

        Ok(AuthCaller(caller))
    }
}
