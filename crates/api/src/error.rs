//! API error taxonomy.

use std::collections::HashMap;

use thiserror::Error;

/// Fallback text shown when the backend supplies no usable message
/// (transport failures, HTML error pages, malformed envelopes).
pub const GENERIC_SERVER_ERROR: &str = "Server error, please try again later.";

/// Error produced by the remote API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("API error ({0}): {1}")]
    Status(u16, String),

    /// HTTP 200 but `success: false`: the backend rejected the request and
    /// may attach field-level validation errors.
    #[error("{message}")]
    Rejected {
        message: String,
        errors: HashMap<String, Vec<String>>,
    },

    /// The body did not match the expected envelope (e.g. an HTML error page
    /// where JSON was expected).
    #[error("parse error: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            errors: HashMap::new(),
        }
    }

    /// Text suitable for a user-facing notification: the server's own message
    /// when it sent one, the generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_SERVER_ERROR.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_reaches_the_user() {
        let err = ApiError::rejected("Product already in wishlist");
        assert_eq!(err.user_message(), "Product already in wishlist");
    }

    #[test]
    fn transport_and_parse_failures_fall_back_to_generic_text() {
        assert_eq!(
            ApiError::Network("connection refused".into()).user_message(),
            GENERIC_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Parse("expected value at line 1".into()).user_message(),
            GENERIC_SERVER_ERROR
        );
        assert_eq!(
            ApiError::rejected("   ").user_message(),
            GENERIC_SERVER_ERROR
        );
    }
}
