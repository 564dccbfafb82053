//! A terminal front-end for the DNA AI chat.
//!
//! The crate includes a CLI tool for chatting in the terminal. The pieces
//! it is made of can also be used as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod entry;
pub mod voice;

/// Re-exports of [`dna_ai_client`] crate.
pub mod client {
    pub use dna_ai_client::*;
}
