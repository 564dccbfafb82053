use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use dna_ai_openai_model::OpenAIProvider;
use dna_ai_proxy::{AppState, ProxyConfig, router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

const RAW_UPSTREAM_ERROR: &str =
    r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota"}}"#;

async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

async fn proxy_for(upstream: Router) -> Router {
    let config = ProxyConfig::default()
        .with_api_key("sk-test")
        .with_base_url(spawn_upstream(upstream).await);
    router(AppState::from_config(&config, OpenAIProvider::new))
}

async fn post_chat(app: Router, body: Value) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_relays_trimmed_reply() {
    let upstream = Router::new().route(
        "/v1/chat/completions",
        post(|Json(req): Json<Value>| async move {
            assert_eq!(req["messages"][0]["role"], "system");
            assert_eq!(req["messages"][1]["content"], "kya scene hai kal ka bro?");
            Json(json!({
                "id": "chatcmpl-7",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "  Hello  " },
                    "finish_reason": "stop"
                }]
            }))
        }),
    );
    let app = proxy_for(upstream).await;

    let (status, body) =
        post_chat(app, json!({ "message": "kya scene hai kal ka bro?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"reply":"Hello"}"#);
}

#[tokio::test]
async fn test_upstream_failure_is_generic() {
    let upstream = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (StatusCode::TOO_MANY_REQUESTS, RAW_UPSTREAM_ERROR).into_response()
        }),
    );
    let app = proxy_for(upstream).await;

    let (status, body) = post_chat(app, json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"AI request failed."}"#);
    assert!(!body.contains("quota"));
}

#[tokio::test]
async fn test_upstream_server_error() {
    let upstream = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (StatusCode::BAD_GATEWAY, "upstream connect error").into_response()
        }),
    );
    let app = proxy_for(upstream).await;

    let (status, body) = post_chat(app, json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"AI request failed."}"#);
}
