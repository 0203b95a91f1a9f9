//! Uniform response structure for every operation's outcome.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Machine-readable code plus a message for a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Outcome of an operation: data, a message, or an error, tagged with the id
/// of the request that produced it.
///
/// All three payload fields are always serialized, absent ones as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub api_id: String,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn data(api_id: impl Into<String>, data: T) -> Self {
        Self {
            api_id: api_id.into(),
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Success that carries data and a confirmation message.
    pub fn data_with_message(
        api_id: impl Into<String>,
        data: T,
        message: impl Into<String>,
    ) -> Self {
        Self {
            api_id: api_id.into(),
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn message(api_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(
        api_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            api_id: api_id.into(),
            data: None,
            message: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn from_error(api_id: impl Into<String>, err: &DomainError) -> Self {
        Self::failure(api_id, err.code(), err.public_message())
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
