//! Event type definitions for the proxy core lifecycle stream.
//!
//! Field names mirror the wire format emitted by the proxy core
//! (snake_case JSON). Optional fields are absent on the wire when unset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Application UID
// =============================================================================

/// The OS-assigned UID of the application owning a connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AppUid(u32);

impl AppUid {
    /// Creates an AppUid from a raw UID value.
    #[must_use]
    pub const fn new(uid: u32) -> Self {
        Self(uid)
    }

    /// Returns the underlying UID value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AppUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AppUid {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}

impl From<AppUid> for u32 {
    fn from(uid: AppUid) -> Self {
        uid.0
    }
}

// =============================================================================
// Relay Hops
// =============================================================================

/// Information about one relay inside a connection's circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayHop {
    /// The RSA identity of the relay, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsa_identity: Option<String>,

    /// The Ed25519 identity of the relay, if it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ed_identity: Option<String>,

    /// The `address:port` combinations this relay is reachable at.
    #[serde(default)]
    pub addresses: Vec<String>,

    /// The 2-letter country code of the relay, if one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Two hops are the same relay if their identities match and they advertise
/// the same address set (order-insensitive, matching cardinality). The
/// country code is derived directory data and takes no part in identity.
impl PartialEq for RelayHop {
    fn eq(&self, other: &Self) -> bool {
        self.rsa_identity == other.rsa_identity
            && self.ed_identity == other.ed_identity
            && self.addresses.len() == other.addresses.len()
            && self.addresses.iter().all(|addr| other.addresses.contains(addr))
    }
}

impl Eq for RelayHop {}

// =============================================================================
// Event Payloads
// =============================================================================

/// An update on the proxy core's bootstrapping status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapEvent {
    /// A vague progress percentage, from 0 to 100.
    #[serde(default)]
    pub bootstrap_percent: i32,

    /// A human-readable string detailing the bootstrap state.
    pub bootstrap_status: String,

    /// If true, the proxy core is ready to pass traffic.
    #[serde(default)]
    pub is_ready_for_traffic: bool,

    /// An optional message detailing why bootstrapping is stuck.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockage_message: Option<String>,
}

/// Notification about a new connection successfully completing.
///
/// Consumers tracking open connections should key on
/// (`proxy_src`, `proxy_dst`) and pair this with a later
/// [`ClosedConnectionEvent`] or [`FailedConnectionEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConnectionEvent {
    /// The source `IP:port` of the connection, on the device side.
    pub proxy_src: String,

    /// The destination `IP:port` on the VPN side, i.e. a fake address the
    /// VPN gave out.
    pub proxy_dst: String,

    /// The actual address (`IP:port` or `hostname:port`) reached over the
    /// Tor network.
    pub tor_dst: String,

    /// The UID of the app that made the connection.
    pub app_id: AppUid,

    /// The relays involved in the connection's circuit, in hop order.
    #[serde(default)]
    pub circuit: Vec<RelayHop>,
}

/// Notification about a connection attempt failing.
///
/// A [`ClosedConnectionEvent`] for the same key may still follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedConnectionEvent {
    /// The source `IP:port` of the connection, on the device side.
    pub proxy_src: String,

    /// The destination `IP:port` on the VPN side.
    pub proxy_dst: String,

    /// The actual address the connection tried to reach over the Tor network.
    pub tor_dst: String,

    /// The UID of the app that made the connection.
    pub app_id: AppUid,

    /// What went wrong.
    pub error: String,
}

/// Notification about a connection having closed, cleanly or uncleanly.
///
/// This may arrive after either a [`NewConnectionEvent`] or a
/// [`FailedConnectionEvent`], but consumers must tolerate it being matched
/// with neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedConnectionEvent {
    /// The source `IP:port` of the connection, on the device side.
    pub proxy_src: String,

    /// The destination `IP:port` on the VPN side.
    pub proxy_dst: String,

    /// None for a clean close, otherwise a human-readable error describing
    /// what went wrong on the connection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A new directory was downloaded.
///
/// Currently only used for relay country code information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDirectoryEvent {
    /// An index of 2-letter country code to number of relays in that country.
    #[serde(default)]
    pub relays_by_country: HashMap<String, u64>,
}

// =============================================================================
// Event Dispatch
// =============================================================================

/// One asynchronous notification from the proxy core.
///
/// Decoded with [`ProxyEvent::from_json`]; consumers dispatch with an
/// exhaustive match. An event type this crate does not understand decodes
/// to [`ProxyEvent::Unknown`] carrying the raw payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ProxyEvent {
    Bootstrap(BootstrapEvent),
    NewConnection(NewConnectionEvent),
    FailedConnection(FailedConnectionEvent),
    ClosedConnection(ClosedConnectionEvent),
    NewDirectory(NewDirectoryEvent),

    /// An event type this version does not understand, kept verbatim.
    #[serde(skip)]
    Unknown { raw: String },
}

impl ProxyEvent {
    /// Decodes one event from its JSON wire form.
    ///
    /// Unknown discriminants are not an error: they decode to
    /// [`ProxyEvent::Unknown`] so callers can log or forward the raw
    /// payload. Malformed JSON and a missing `type` field are errors.
    pub fn from_json(json: &str) -> Result<Self, crate::EventError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let event_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(crate::EventError::MissingType)?
            .to_string();

        match event_type.as_str() {
            "Bootstrap" | "NewConnection" | "FailedConnection" | "ClosedConnection"
            | "NewDirectory" => Ok(serde_json::from_value(value)?),
            other => {
                tracing::debug!(event_type = other, "unknown proxy event type");
                Ok(ProxyEvent::Unknown {
                    raw: json.to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_decoding() {
        let json = r#"{
            "type": "Bootstrap",
            "bootstrap_percent": 85,
            "bootstrap_status": "connecting to the Tor network",
            "is_ready_for_traffic": false,
            "blockage_message": "no directory information"
        }"#;
        let bootstrap = match ProxyEvent::from_json(json).unwrap() {
            ProxyEvent::Bootstrap(bootstrap) => bootstrap,
            other => panic!("expected Bootstrap, got {other:?}"),
        };
        assert_eq!(bootstrap.bootstrap_percent, 85);
        assert!(!bootstrap.is_ready_for_traffic);
        assert_eq!(
            bootstrap.blockage_message.as_deref(),
            Some("no directory information")
        );
    }

    #[test]
    fn test_new_connection_decoding() {
        let json = r#"{
            "type": "NewConnection",
            "proxy_src": "10.0.0.1:1111",
            "proxy_dst": "10.0.0.2:2222",
            "tor_dst": "example.com:443",
            "app_id": 10042,
            "circuit": [
                {"rsa_identity": "AAAA", "addresses": ["1.2.3.4:9001"], "country_code": "US"},
                {"ed_identity": "BBBB", "addresses": ["5.6.7.8:443"]}
            ]
        }"#;
        let conn = match ProxyEvent::from_json(json).unwrap() {
            ProxyEvent::NewConnection(conn) => conn,
            other => panic!("expected NewConnection, got {other:?}"),
        };
        assert_eq!(conn.app_id, AppUid::new(10042));
        assert_eq!(conn.circuit.len(), 2);
        assert_eq!(conn.circuit[0].country_code.as_deref(), Some("US"));
        assert_eq!(conn.circuit[1].country_code, None);
    }

    #[test]
    fn test_closed_connection_without_error() {
        let json = r#"{"type": "ClosedConnection", "proxy_src": "a:1", "proxy_dst": "b:2"}"#;
        let event = ProxyEvent::from_json(json).unwrap();
        assert_eq!(
            event,
            ProxyEvent::ClosedConnection(ClosedConnectionEvent {
                proxy_src: "a:1".to_string(),
                proxy_dst: "b:2".to_string(),
                error: None,
            })
        );
    }

    #[test]
    fn test_new_directory_decoding() {
        let json = r#"{"type": "NewDirectory", "relays_by_country": {"de": 1200, "us": 2400}}"#;
        let dir = match ProxyEvent::from_json(json).unwrap() {
            ProxyEvent::NewDirectory(dir) => dir,
            other => panic!("expected NewDirectory, got {other:?}"),
        };
        assert_eq!(dir.relays_by_country.get("de"), Some(&1200));
    }

    #[test]
    fn test_unknown_discriminant_keeps_raw_payload() {
        let json = r#"{"type": "CircuitRebuilt", "circuit_id": 7}"#;
        let event = ProxyEvent::from_json(json).unwrap();
        assert_eq!(
            event,
            ProxyEvent::Unknown {
                raw: json.to_string()
            }
        );
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let err = ProxyEvent::from_json(r#"{"proxy_src": "a:1"}"#).unwrap_err();
        assert!(matches!(err, crate::EventError::MissingType));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = ProxyEvent::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::EventError::Json(_)));
    }

    #[test]
    fn test_relay_hop_equality_ignores_address_order_and_country() {
        let a = RelayHop {
            rsa_identity: Some("AAAA".to_string()),
            ed_identity: None,
            addresses: vec!["1.2.3.4:9001".to_string(), "[::1]:9001".to_string()],
            country_code: Some("US".to_string()),
        };
        let b = RelayHop {
            rsa_identity: Some("AAAA".to_string()),
            ed_identity: None,
            addresses: vec!["[::1]:9001".to_string(), "1.2.3.4:9001".to_string()],
            country_code: None,
        };
        assert_eq!(a, b);

        let c = RelayHop {
            addresses: vec!["1.2.3.4:9001".to_string()],
            ..a.clone()
        };
        assert_ne!(a, c);
    }
}
