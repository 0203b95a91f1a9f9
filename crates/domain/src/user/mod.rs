//! User accounts: signup, login, authentication and customer suspension.

mod password;
mod service;

pub use password::{hash_password, validate_password, verify_password};
pub use service::{CustomerService, UserService};

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use store::{User, UserRole, UserStatus};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid user: {0}")]
    InvalidUser(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Email already registered: {email}")]
    EmailTaken { email: String },

    /// No active user has the email used to log in.
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authenticated: {0}")]
    Unauthenticated(&'static str),

    #[error("Customer not found: {customer_id}")]
    CustomerNotFound { customer_id: UserId },

    #[error("Token error: {0}")]
    Token(String),

    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl UserError {
    pub fn code(&self) -> &'static str {
        match self {
            UserError::InvalidUser(_) => "INVALID_USER",
            UserError::WeakPassword(_) => "WEAK_PASSWORD",
            UserError::EmailTaken { .. } => "EMAIL_TAKEN",
            UserError::UserNotFound => "USER_NOT_FOUND",
            UserError::InvalidCredentials => "INVALID_CREDENTIALS",
            UserError::Unauthenticated(_) => "UNAUTHENTICATED",
            UserError::CustomerNotFound { .. } => "CUSTOMER_NOT_FOUND",
            UserError::Token(_) => "TOKEN_ERROR",
            UserError::PasswordHash(_) => "PASSWORD_HASH_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::InvalidUser(_) | UserError::WeakPassword(_) => ErrorKind::Validation,
            UserError::EmailTaken { .. } => ErrorKind::Conflict,
            UserError::UserNotFound
            | UserError::InvalidCredentials
            | UserError::Unauthenticated(_) => ErrorKind::Unauthorized,
            UserError::CustomerNotFound { .. } => ErrorKind::NotFound,
            UserError::Token(_) | UserError::PasswordHash(_) => ErrorKind::Data,
        }
    }
}

/// Issues access tokens for authenticated users.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<String, UserError>;
}

/// Fields submitted to create an account.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: UserId,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Trims and lowercases an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Accepts `local@domain.tld` shaped addresses.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
