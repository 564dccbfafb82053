//! The conversation client of the DNA AI chat.
//!
//! A [`ConversationClient`] owns the transcript of one session, the text
//! being composed, and the per-turn state machine. Each submitted turn is
//! one request to the completion proxy through a [`ChatTransport`]. Speech
//! input and output are optional host capabilities, see [`speech`].
//!
//! Rendering is left to the caller; [`reveal::TypingReveal`] helps with the
//! character-by-character effect.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
mod input;
mod message;
pub mod reveal;
pub mod speech;
mod transport;

pub use client::{ClientBuilder, ClientClosed, ConversationClient, Snapshot};
pub use input::InputBuffer;
pub use message::{
    DEFAULT_GREETING, MISSING_REPLY_FALLBACK, Message, MessageId, Sender,
    Transcript, UNREACHABLE_FALLBACK,
};
pub use transport::{ChatTransport, HttpTransport, ProxyReply, TransportError};
