//! Identity passed explicitly into every service call.

use common::UserId;
use store::UserRole;
use uuid::Uuid;

/// Per-request metadata for calls made before anyone is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Creates a context with a fresh request id.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Creates a context that reuses an id supplied by the client.
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An authenticated user acting on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: UserRole,
    pub request_id: String,
}

impl Caller {
    pub fn new(user_id: UserId, role: UserRole, context: &RequestContext) -> Self {
        Self {
            user_id,
            role,
            request_id: context.request_id.clone(),
        }
    }

    /// A customer caller with a fresh request id.
    pub fn customer(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Customer, &RequestContext::new())
    }

    /// An admin caller with a fresh request id.
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Admin, &RequestContext::new())
    }
}
