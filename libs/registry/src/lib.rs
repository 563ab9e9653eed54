//! # torlink-registry
//!
//! Tracks open connections through the proxy core per application UID,
//! driven by the lifecycle event stream from `torlink-events`.
//!
//! Two views are maintained with different lifetimes:
//!
//! - **Active connections**: inserted on `NewConnection`, removed on
//!   `ClosedConnection`/`FailedConnection`, queried as de-duplicated
//!   [`CircuitView`]s.
//! - **Country code snapshots**: the hop country codes of the most recent
//!   circuit per app. Overwritten by each new connection and left in place
//!   when connections close, so the UI can show an app's circuit even while
//!   no data happens to be in flight. Until the proxy core signals circuit
//!   creation and dismissal per app, only the latest circuit is retained.
//!
//! A [`ConnectionRegistry`] is an explicitly constructed value. Mutations
//! arrive from a single logical event stream; reads may come from any
//! thread. One `RwLock` over all three internal indices keeps every query
//! a consistent point-in-time snapshot.

mod circuit;
mod error;
mod store;

pub use circuit::{CircuitView, ConnectionKey, CountryCodeSnapshot};
pub use error::RegistryError;
pub use store::ConnectionRegistry;
