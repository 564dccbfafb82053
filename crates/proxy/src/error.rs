use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dna_ai_model::{ErrorKind, ModelProviderError};
use serde::Serialize;

/// Every way a chat request can fail.
///
/// The `Display` text is exactly what the client receives in the `error`
/// field, so it must never carry upstream payloads or credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// The request body has no usable `message`.
    #[error("Message is required.")]
    BadRequest,
    /// The upstream credential is not configured.
    #[error("Server is not configured: OPENAI_API_KEY is missing.")]
    Configuration,
    /// The upstream answered with a non-success status.
    #[error("AI request failed.")]
    Upstream,
    /// Anything else.
    #[error("Internal server error.")]
    Internal,
}

impl ProxyError {
    /// Returns the HTTP status for this error.
    #[inline]
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest => StatusCode::BAD_REQUEST,
            ProxyError::Configuration
            | ProxyError::Upstream
            | ProxyError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classifies a failure reported by the model provider.
    pub fn from_provider_error(err: &dyn ModelProviderError) -> Self {
        match err.kind() {
            ErrorKind::Rejected | ErrorKind::RateLimitExceeded => {
                ProxyError::Upstream
            }
            ErrorKind::Transport
            | ErrorKind::InvalidResponse
            | ErrorKind::Other => ProxyError::Internal,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Turns a panic inside a handler into a generic internal error.
pub(crate) fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("<non-string panic>");
    error!("handler panicked: {detail}");
    ProxyError::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_status() {
        assert_eq!(ProxyError::BadRequest.to_string(), "Message is required.");
        assert_eq!(ProxyError::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::Upstream.to_string(), "AI request failed.");
        assert_eq!(ProxyError::Internal.to_string(), "Internal server error.");
        assert_eq!(
            ProxyError::Configuration.to_string(),
            "Server is not configured: OPENAI_API_KEY is missing."
        );
        assert_eq!(
            ProxyError::Configuration.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
