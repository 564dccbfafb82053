//! Serves the DNA AI completion proxy.

#[macro_use]
extern crate tracing;

use std::process::ExitCode;

use dna_ai_openai_model::OpenAIProvider;
use dna_ai_proxy::{API_KEY_VAR, AppState, ProxyConfig, router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    // Load the configuration first, so `RUST_LOG` from `.env` applies.
    let config = ProxyConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("loaded configuration: {config:?}");
    if !config.has_credential() {
        warn!("{API_KEY_VAR} is not set, chat requests will fail until it is");
    }

    let state = AppState::from_config(&config, OpenAIProvider::new);
    let listener = match TcpListener::bind(config.bind_addr()).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {err}", config.bind_addr());
            return ExitCode::FAILURE;
        }
    };
    info!("listening on {}", config.bind_addr());

    if let Err(err) = axum::serve(listener, router(state)).await {
        error!("server stopped: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
