//! # torlink-events
//!
//! Lifecycle event definitions for the torlink proxy core.
//!
//! The proxy core reports asynchronous connectivity changes as JSON objects
//! with a `"type"` discriminant and snake_case payload fields. This crate
//! owns the typed model of that stream:
//!
//! - Bootstrap progress (`Bootstrap`)
//! - Connection lifecycle (`NewConnection`, `FailedConnection`,
//!   `ClosedConnection`)
//! - Directory updates (`NewDirectory`)
//!
//! ## Design Principles
//!
//! - Events are immutable records; consumers never mutate a decoded payload
//! - An unknown discriminant is preserved as its raw payload, never guessed at
//! - Decoding is total over well-formed JSON: only malformed input or a
//!   missing discriminant is an error

mod error;
mod types;

pub use error::EventError;
pub use types::*;
