//! Response envelopes.
//!
//! Success: `{"status":"success", "token"?, "results"?, "message"?, "data"?}`.
//! Failure: `{"status":"fail"|"error", "message", "error"?}` where `fail`
//! marks client errors and `error` server errors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: "success".to_string(),
            token: None,
            results: None,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }
}

impl ApiResponse<()> {
    /// A success envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            token: None,
            results: None,
            message: Some(message.into()),
            data: None,
        }
    }

    /// A bare `{"status":"success"}`.
    pub fn empty() -> Self {
        Self {
            status: "success".to_string(),
            token: None,
            results: None,
            message: None,
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    /// Internal detail; only populated in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Envelope for a response with the given HTTP status code.
    pub fn for_status(code: u16, message: impl Into<String>) -> Self {
        let status = if code >= 500 { "error" } else { "fail" };
        Self {
            status: status.to_string(),
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }
}
