//! A model provider for OpenAI-compatible chat completion APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use dna_ai_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use proto::ChatCompletion;

/// Error type for [`OpenAIProvider`].
///
/// The message never contains the raw body returned by the service, which
/// is only written to the log.
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<StatusCode>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status the service answered with, if it answered.
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::ACCEPT, "application/json")
            .json(&openai_req)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("failed to reach upstream: {err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!("upstream answered {status}: {body}");
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Rejected
                };
                return Err(Error::new(format!("upstream answered {status}"), kind)
                    .with_status(status));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let is_json = content_type
                .as_deref()
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype() == mime::JSON)
                .unwrap_or(true);
            if !is_json {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::InvalidResponse,
                )
                .with_status(status));
            }

            // Here we got a successful response.
            let body = resp.bytes().await.map_err(|err| {
                Error::new(
                    format!("failed to read upstream body: {err}"),
                    ErrorKind::Transport,
                )
            })?;
            trace!("got upstream body: {} bytes", body.len());
            let completion = serde_json::from_slice::<ChatCompletion>(&body)
                .map_err(|err| {
                    Error::new(
                        format!("malformed completion: {err}"),
                        ErrorKind::InvalidResponse,
                    )
                    .with_status(status)
                })?;
            Ok(proto::into_model_response(completion))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    type Captured = Arc<Mutex<Option<(HeaderMap, Value)>>>;

    async fn spawn_upstream(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn provider_for(base_url: String) -> OpenAIProvider {
        OpenAIProvider::new(
            OpenAIConfigBuilder::with_api_key("sk-test")
                .with_base_url(base_url)
                .build(),
        )
    }

    #[tokio::test]
    async fn test_completion() {
        async fn handler(
            State(captured): State<Captured>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            *captured.lock().unwrap() = Some((headers, body));
            Json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "  Hello  " },
                    "finish_reason": "stop"
                }]
            }))
        }

        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/chat/completions", post(handler))
            .with_state(Arc::clone(&captured));
        let provider = provider_for(spawn_upstream(router).await);

        let req = ModelRequest::single_turn("policy", "kya haal hai");
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(resp.first_text(), Some("Hello"));

        let (headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-9);
        assert_eq!(
            body["messages"],
            json!([
                { "role": "system", "content": "policy" },
                { "role": "user", "content": "kya haal hai" }
            ])
        );
    }

    #[tokio::test]
    async fn test_rejected() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (StatusCode::UNAUTHORIZED, "Incorrect API key provided: sk-te***")
                    .into_response()
            }),
        );
        let provider = provider_for(spawn_upstream(router).await);

        let req = ModelRequest::single_turn("policy", "hello");
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(!err.message().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { StatusCode::TOO_MANY_REQUESTS }),
        );
        let provider = provider_for(spawn_upstream(router).await);

        let req = ModelRequest::single_turn("policy", "hello");
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                ([(header::CONTENT_TYPE, "application/json")], "{\"choices\": 42}")
            }),
        );
        let provider = provider_for(spawn_upstream(router).await);

        let req = ModelRequest::single_turn("policy", "hello");
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = provider_for(format!("http://{addr}/v1"));
        let req = ModelRequest::single_turn("policy", "hello");
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
    }
}
