//! Domain service for account identity and credentials.
//!
//! Covers registration, login, one-time-code verification, password reset,
//! account retirement and manager re-appointment. Every operation returns a
//! typed [`IdentityError`]; [`ServiceResponse`] turns that into the tagged
//! `{ success, message, data }` shape callers hand back to clients.

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::domain::AccountId;
use crate::models::account::{AccountInfo, LoginResult, NewManagerRequest, RegisterRequest};
use crate::services::otp::OtpError;
use crate::services::token::TokenError;

/// Errors specific to identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid password")]
    InvalidCredential,

    #[error("Invalid OTP, please try again")]
    InvalidCode,

    #[error("Your OTP has expired, please request a new one")]
    Expired,

    #[error("Maximum OTP resend limit reached")]
    ResendLimitExceeded,

    #[error("Email is not verified")]
    Unverified,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Message safe to show a client. Internal details are logged instead.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Identity operation failed");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    fn from_db(err: &DbErr) -> Option<Self> {
        match err.sql_err()? {
            SqlErr::UniqueConstraintViolation(_) => {
                Some(Self::conflict("Username or email already exists"))
            }
            SqlErr::ForeignKeyConstraintViolation(_) => {
                Some(Self::not_found("Referenced manager or department not found"))
            }
            _ => None,
        }
    }
}

impl From<DbErr> for IdentityError {
    fn from(err: DbErr) -> Self {
        Self::from_db(&err).unwrap_or_else(|| Self::Internal(err.to_string()))
    }
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db) = err.downcast_ref::<DbErr>()
            && let Some(mapped) = Self::from_db(db)
        {
            return mapped;
        }
        Self::Internal(format!("{err:#}"))
    }
}

impl From<OtpError> for IdentityError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::InvalidCode => Self::InvalidCode,
            OtpError::Expired => Self::Expired,
            OtpError::ResendLimitExceeded => Self::ResendLimitExceeded,
        }
    }
}

impl From<TokenError> for IdentityError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(msg) => Self::Internal(msg),
            TokenError::Expired | TokenError::Invalid(_) => Self::Unauthorized,
        }
    }
}

/// Tagged result handed back across the service boundary.
#[derive(Debug, Serialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_result(result: Result<T, IdentityError>, success_message: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data, success_message),
            Err(err) => Self::fail(err.public_message()),
        }
    }
}

impl<T> From<Result<T, IdentityError>> for ServiceResponse<T> {
    fn from(result: Result<T, IdentityError>) -> Self {
        Self::from_result(result, "Success")
    }
}

/// Domain service trait for identity operations.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates an account and its role profile atomically.
    ///
    /// # Errors
    ///
    /// [`IdentityError::Validation`] for malformed input or the Admin role,
    /// [`IdentityError::Conflict`] for a taken username/email or an occupied
    /// department, [`IdentityError::NotFound`] for an unknown manager or
    /// department.
    async fn register(&self, request: RegisterRequest) -> Result<AccountInfo, IdentityError>;

    /// Checks a password and mints a session token.
    ///
    /// Vacant manager slots fail exactly like unknown usernames.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, IdentityError>;

    /// Consumes the code issued to `email`.
    async fn verify(&self, email: &str, code: &str) -> Result<(), IdentityError>;

    /// Starts a new reset cycle and mails the code. The code is never returned.
    async fn forgot_password(&self, email: &str) -> Result<(), IdentityError>;

    /// Reissues a code within the current cycle, subject to the resend ceiling.
    async fn resend_otp(&self, email: &str) -> Result<(), IdentityError>;

    /// Sets a new password once the account is verified and the window is open.
    async fn reset_password(
        &self,
        email: Option<&str>,
        new_password: &str,
    ) -> Result<(), IdentityError>;

    /// Removes an employee account, or marks a manager's slot vacant.
    async fn delete_account(&self, id: AccountId) -> Result<(), IdentityError>;

    /// Re-credentials an existing manager slot, keeping its account id.
    async fn appoint_new_manager(
        &self,
        manager_id: AccountId,
        request: NewManagerRequest,
    ) -> Result<AccountInfo, IdentityError>;

    async fn get_account(&self, id: AccountId) -> Result<AccountInfo, IdentityError>;

    async fn list_accounts(&self) -> Result<Vec<AccountInfo>, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_masked() {
        let response: ServiceResponse<()> =
            Err(IdentityError::Internal("disk on fire".to_string())).into();
        assert!(!response.success);
        assert_eq!(response.message, "An internal error occurred");
        assert!(response.data.is_none());
    }

    #[test]
    fn domain_errors_keep_their_message() {
        let response: ServiceResponse<()> =
            Err(IdentityError::not_found("User not found")).into();
        assert_eq!(response.message, "User not found");

        let response: ServiceResponse<()> = Err(IdentityError::Expired).into();
        assert_eq!(
            response.message,
            "Your OTP has expired, please request a new one"
        );
    }

    #[test]
    fn success_carries_data() {
        let response = ServiceResponse::from_result(Ok(5), "Done");
        assert!(response.success);
        assert_eq!(response.message, "Done");
        assert_eq!(response.data, Some(5));
    }

    #[test]
    fn otp_errors_map_one_to_one() {
        assert!(matches!(
            IdentityError::from(OtpError::ResendLimitExceeded),
            IdentityError::ResendLimitExceeded
        ));
        assert!(matches!(
            IdentityError::from(OtpError::InvalidCode),
            IdentityError::InvalidCode
        ));
    }

    #[test]
    fn opaque_anyhow_errors_become_internal() {
        let err = IdentityError::from(anyhow::anyhow!("boom"));
        assert!(matches!(err, IdentityError::Internal(_)));
    }
}
