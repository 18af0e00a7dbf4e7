use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::services::{IdentityError, ServiceResponse};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    NotFound(String),

    Conflict(String),

    Unauthorized(String),

    Forbidden(String),

    TooManyRequests(String),

    InternalError(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::TooManyRequests(msg) => write!(f, "Too many requests: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let message = err.public_message();
        match err {
            IdentityError::Validation(_)
            | IdentityError::InvalidCode
            | IdentityError::Expired => Self::ValidationError(message),
            IdentityError::NotFound(_) => Self::NotFound(message),
            IdentityError::Conflict(_) => Self::Conflict(message),
            IdentityError::InvalidCredential | IdentityError::Unauthorized => {
                Self::Unauthorized(message)
            }
            IdentityError::Unverified => Self::Forbidden(message),
            IdentityError::ResendLimitExceeded => Self::TooManyRequests(message),
            IdentityError::Internal(_) => Self::InternalError(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            Self::ValidationError(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::TooManyRequests(msg) => msg,
        };

        (status, Json(ServiceResponse::<()>::fail(message))).into_response()
    }
}
