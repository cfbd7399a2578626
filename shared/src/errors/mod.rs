//! Shared error response structure handed to the HTTP boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Standard error response structure used by the authentication layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Suggested HTTP status for the boundary layer
    pub status: u16,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,

    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status,
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Add a detail field to the error response
    pub fn add_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let details = self.details.get_or_insert_with(HashMap::new);
        if let Ok(json_value) = serde_json::to_value(value) {
            details.insert(key.into(), json_value);
        }
        self
    }

    /// Whether the status is in the 4xx range
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Error codes used by the refresh token boundary
pub mod error_codes {
    pub const TOKEN_UNKNOWN: &str = "REFRESH_TOKEN_UNKNOWN";
    pub const TOKEN_EXPIRED: &str = "REFRESH_TOKEN_EXPIRED";
    pub const TOKEN_REVOKED: &str = "REFRESH_TOKEN_REVOKED";
    pub const TOKEN_REUSE_DETECTED: &str = "REFRESH_TOKEN_REUSE_DETECTED";
    pub const INVALID_SUBJECT: &str = "INVALID_SUBJECT";
    pub const STORE_UNAVAILABLE: &str = "TOKEN_STORE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
}
