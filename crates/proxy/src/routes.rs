use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use dna_ai_model::ModelProvider;
use dna_ai_openai_model::OpenAIConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::completer::Completer;
use crate::config::ProxyConfig;
use crate::error::{ProxyError, handle_panic};
use crate::policy::{FALLBACK_REPLY, system_prompt};

/// Shared state of the chat route.
///
/// Cloned into every request. Nothing in it is mutable.
#[derive(Clone)]
pub struct AppState {
    completer: Option<Completer>,
    system_prompt: &'static str,
}

impl AppState {
    /// Builds the state from the startup configuration.
    ///
    /// `make_provider` is only invoked when the upstream credential is
    /// configured. Without it, every chat request fails with
    /// [`ProxyError::Configuration`] before anything is sent upstream.
    pub fn from_config<P, F>(config: &ProxyConfig, make_provider: F) -> Self
    where
        P: ModelProvider + 'static,
        F: FnOnce(OpenAIConfig) -> P,
    {
        let completer = config
            .openai_config()
            .map(|openai_config| Completer::new(make_provider(openai_config)));
        Self {
            completer,
            system_prompt: system_prompt(),
        }
    }
}

/// The body of a successful chat response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The assistant's reply text.
    pub reply: String,
}

/// Creates the router serving `POST /api/chat`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatReply>, ProxyError> {
    let message = parse_message(&body)?;

    let Some(completer) = &state.completer else {
        warn!("rejecting chat request, the upstream credential is missing");
        return Err(ProxyError::Configuration);
    };

    trace!("forwarding a message of {} bytes", message.len());
    match completer.complete(state.system_prompt, &message).await {
        Ok(Some(reply)) => Ok(Json(ChatReply { reply })),
        Ok(None) => {
            warn!("upstream answered without usable text");
            Ok(Json(ChatReply {
                reply: FALLBACK_REPLY.to_owned(),
            }))
        }
        Err(err) => {
            error!("upstream request failed ({}): {err}", err.kind());
            Err(ProxyError::from_provider_error(&*err))
        }
    }
}

/// Extracts a non-empty string `message` from the request body.
fn parse_message(body: &[u8]) -> Result<String, ProxyError> {
    let value = serde_json::from_slice::<Value>(body).map_err(|err| {
        debug!("request body is not JSON: {err}");
        ProxyError::BadRequest
    })?;
    match value.get("message") {
        Some(Value::String(message)) if !message.is_empty() => {
            Ok(message.clone())
        }
        _ => Err(ProxyError::BadRequest),
    }
}
