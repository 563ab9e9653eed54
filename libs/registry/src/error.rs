//! Error types for registry queries.

use thiserror::Error;

use crate::circuit::ConnectionKey;

/// Errors that can occur when querying the connection registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An app's active-key set names a connection the record index does not
    /// hold. This indicates duplicate or out-of-order event delivery and is
    /// a bug to report, fatal to the affected query only.
    #[error("active connection {key} has no record")]
    Inconsistent { key: ConnectionKey },
}
