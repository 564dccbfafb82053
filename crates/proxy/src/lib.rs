//! The completion proxy behind the DNA AI chat.
//!
//! It serves a single stateless endpoint, `POST /api/chat`, which takes the
//! latest user message, attaches the fixed persona policy, asks the
//! upstream model for one completion, and relays the reply. No
//! conversation state is kept between requests.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod completer;
mod config;
mod error;
pub mod policy;
mod routes;

pub use completer::Completer;
pub use config::{API_KEY_VAR, ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use routes::{AppState, ChatReply, router};
