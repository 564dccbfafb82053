use std::pin::Pin;
use std::sync::Arc;

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// The body the proxy answers with, on success and on failure alike.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyReply {
    /// The assistant text, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// The error message, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyReply {
    /// Returns the reply text if there is a non-empty one.
    #[inline]
    pub fn reply_text(&self) -> Option<&str> {
        self.reply.as_deref().filter(|r| !r.is_empty())
    }
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    message: &'a str,
}

/// Failures of a chat request that never produced a decodable body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The proxy could not be reached.
    #[error("failed to reach the proxy: {0}")]
    Unreachable(String),
    /// The proxy answered with something that is not a reply body.
    #[error("undecodable proxy response: {0}")]
    Undecodable(String),
    /// The request died before producing any response.
    #[error("chat request aborted: {0}")]
    Aborted(String),
}

/// A channel that carries one user message to the completion proxy.
pub trait ChatTransport: Send + Sync {
    /// Sends `message` and resolves with whatever body the proxy answered.
    ///
    /// Error statuses still resolve to `Ok` as long as the body decodes;
    /// the caller decides what a missing `reply` means.
    fn send_message(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<ProxyReply, TransportError>> + Send + 'static;
}

/// [`ChatTransport`] speaking JSON over HTTP to `POST {base}/api/chat`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: Arc<str>,
}

impl HttpTransport {
    /// Creates a transport for the proxy served at `base_url`.
    pub fn new(base_url: &str) -> Self {
        let endpoint = format!("{}/api/chat", base_url.trim_end_matches('/'));
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Returns the full endpoint URL.
    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatTransport for HttpTransport {
    fn send_message(
        &self,
        message: &str,
    ) -> impl Future<Output = Result<ProxyReply, TransportError>> + Send + 'static
    {
        let resp_fut = self
            .client
            .post(&*self.endpoint)
            .header(header::ACCEPT, "application/json")
            .json(&ProxyRequest { message })
            .send();

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| TransportError::Unreachable(err.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                warn!("proxy answered {status}");
            }
            let body = resp
                .bytes()
                .await
                .map_err(|err| TransportError::Unreachable(err.to_string()))?;
            serde_json::from_slice(&body)
                .map_err(|err| TransportError::Undecodable(err.to_string()))
        }
    }
}

type SendResult = Result<ProxyReply, TransportError>;
type BoxedSendFuture = Pin<Box<dyn Future<Output = SendResult> + Send>>;
type SendFn = Arc<dyn Fn(String) -> BoxedSendFuture + Send + Sync>;

/// Type-erased [`ChatTransport`] held by the client state.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    send_fn: SendFn,
}

impl Dispatcher {
    pub fn new<T: ChatTransport + 'static>(transport: T) -> Self {
        let send_fn: SendFn =
            Arc::new(move |message: String| -> BoxedSendFuture {
                let fut = transport.send_message(&message);
                Box::pin(
                    async move {
                        trace!("sending: {message:?}");
                        let res = fut.await;
                        match &res {
                            Ok(reply) => trace!("got a reply: {reply:?}"),
                            Err(err) => warn!("request failed: {err}"),
                        }
                        res
                    }
                    .instrument(trace_span!("chat req")),
                )
            });
        Self { send_fn }
    }

    #[inline]
    pub fn send(&self, message: String) -> BoxedSendFuture {
        (self.send_fn)(message)
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    use super::*;

    async fn spawn_proxy(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[test]
    fn test_endpoint() {
        let transport = HttpTransport::new("http://localhost:3000/");
        assert_eq!(transport.endpoint(), "http://localhost:3000/api/chat");
    }

    #[tokio::test]
    async fn test_error_body_still_decodes() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"error":"AI request failed."}"#,
                )
            }),
        );
        let transport = HttpTransport::new(&spawn_proxy(router).await);

        let reply = transport.send_message("hello").await.unwrap();
        assert_eq!(reply.reply_text(), None);
        assert_eq!(reply.error.as_deref(), Some("AI request failed."));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let router = Router::new()
            .route("/api/chat", post(|| async { "<html>Bad Gateway</html>" }));
        let transport = HttpTransport::new(&spawn_proxy(router).await);

        let err = transport.send_message("hello").await.unwrap_err();
        assert!(matches!(err, TransportError::Undecodable(_)));
    }

    #[tokio::test]
    async fn test_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&format!("http://{addr}"));
        let err = transport.send_message("hello").await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)));
    }

    #[test]
    fn test_empty_reply_is_missing() {
        let reply: ProxyReply =
            serde_json::from_str(r#"{"reply":""}"#).unwrap();
        assert_eq!(reply.reply_text(), None);
    }
}
