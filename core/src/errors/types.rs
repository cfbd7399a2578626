//! Error taxonomy for refresh token operations
//!
//! `TokenError` is the closed set of outcomes the rotator reports to the
//! authentication layer. Every variant except `StoreUnavailable` means the
//! client has to authenticate again from scratch.

use rt_shared::errors::{error_codes, ErrorResponse};
use thiserror::Error;

/// Refresh token failures surfaced by the session rotator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Value not present; indistinguishable from a value never issued
    #[error("Unknown refresh token")]
    UnknownToken,

    #[error("Refresh token expired")]
    Expired,

    #[error("Refresh token revoked")]
    Revoked,

    /// A token that was already rotated away was presented to `rotate` again
    #[error("Refresh token reuse detected")]
    ReuseDetected,

    #[error("Invalid subject identifier")]
    InvalidSubject,

    /// Transient; never to be treated as an invalid token
    #[error("Token store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl TokenError {
    /// Stable error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::UnknownToken => error_codes::TOKEN_UNKNOWN,
            TokenError::Expired => error_codes::TOKEN_EXPIRED,
            TokenError::Revoked => error_codes::TOKEN_REVOKED,
            TokenError::ReuseDetected => error_codes::TOKEN_REUSE_DETECTED,
            TokenError::InvalidSubject => error_codes::INVALID_SUBJECT,
            TokenError::StoreUnavailable { .. } => error_codes::STORE_UNAVAILABLE,
        }
    }

    /// HTTP status the boundary layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            TokenError::UnknownToken
            | TokenError::Expired
            | TokenError::Revoked
            | TokenError::ReuseDetected => 401,
            TokenError::InvalidSubject => 400,
            TokenError::StoreUnavailable { .. } => 503,
        }
    }

    /// Whether the client must log in again instead of retrying
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            TokenError::UnknownToken
                | TokenError::Expired
                | TokenError::Revoked
                | TokenError::ReuseDetected
        )
    }

    /// Whether the same request may succeed later
    pub fn is_transient(&self) -> bool {
        matches!(self, TokenError::StoreUnavailable { .. })
    }
}

/// Failures reported by a `TokenStore` implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the statement failed
    #[error("Token store unavailable: {0}")]
    Unavailable(String),

    /// Insert violated the token hash uniqueness constraint
    #[error("Duplicate token hash")]
    Duplicate,

    /// A stored row could not be mapped back to a record
    #[error("Corrupt token record: {0}")]
    Corrupt(String),
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        TokenError::StoreUnavailable {
            message: err.to_string(),
        }
    }
}

/// Convert TokenError to ErrorResponse
///
/// Store details stay in the logs; the client only sees the generic message.
impl From<TokenError> for ErrorResponse {
    fn from(err: TokenError) -> Self {
        let message = match &err {
            TokenError::StoreUnavailable { .. } => "Token store unavailable".to_string(),
            other => other.to_string(),
        };

        ErrorResponse::new(err.error_code(), message, err.status_code())
            .add_detail("reauthenticate", err.requires_reauthentication())
    }
}
