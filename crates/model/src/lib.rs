//! An abstraction layer for the upstream text-generation service.
//!
//! This crate establishes the protocol the proxy uses to talk to a chat
//! completion API, so that the proxy can be wired to the real service or
//! to a scripted fake without modifying its request handling.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
