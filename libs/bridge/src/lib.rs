//! # torlink-bridge
//!
//! Bridge line handling for the torlink client: a grammar-driven parser for
//! the supported pluggable transport configuration lines and the policy for
//! choosing among them.
//!
//! Three transports are understood, each with its own line shape:
//!
//! ```text
//! obfs4 <host:port> <fingerprint> [cert=<b64>] [iat-mode=<0-9>]
//! snowflake <host:port> <fingerprint> [url=..] [fronts=a,b] [ice=a,b] ...
//! webtunnel <host:port> [<identity>] [url=..] [ver=..]
//! ```
//!
//! [`parse_batch`] turns free-form multi-line configuration text into one
//! [`TransportConfig`] per transport type; [`select`] breaks the ambiguity
//! when more than one type was supplied, since the proxy core can run only
//! one obfuscation layer at a time.
//!
//! Parsing never launches or supervises a transport process; it ends at a
//! validated configuration value.

mod error;
mod grammar;
mod parser;
mod select;
mod types;

pub use error::ParseError;
pub use grammar::{
    AMP_CACHE, CERT, FINGERPRINT, FRONTS, IAT_MODE, ICE, SQS_CREDS_STR, SQS_QUEUE_URL, URL,
    UTLS_IMITATE, VER,
};
pub use parser::{parse_batch, parse_line};
pub use select::{select, select_with_rng};
pub use types::{BridgeConfig, TransportConfig, TransportType};
