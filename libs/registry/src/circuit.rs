//! Value types derived from connection records.

use torlink_events::{NewConnectionEvent, RelayHop};

/// Identifies one logical connection attempt through the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    proxy_src: String,
    proxy_dst: String,
}

impl ConnectionKey {
    /// Creates a key from the proxy-side endpoint pair.
    #[must_use]
    pub fn new(proxy_src: impl Into<String>, proxy_dst: impl Into<String>) -> Self {
        Self {
            proxy_src: proxy_src.into(),
            proxy_dst: proxy_dst.into(),
        }
    }

    /// The source `IP:port` of the connection, on the device side.
    #[must_use]
    pub fn proxy_src(&self) -> &str {
        &self.proxy_src
    }

    /// The destination `IP:port` on the VPN side.
    #[must_use]
    pub fn proxy_dst(&self) -> &str {
        &self.proxy_dst
    }
}

impl std::fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.proxy_src, self.proxy_dst)
    }
}

impl From<&NewConnectionEvent> for ConnectionKey {
    fn from(event: &NewConnectionEvent) -> Self {
        Self::new(event.proxy_src.clone(), event.proxy_dst.clone())
    }
}

/// A read-only projection of one active connection's circuit.
#[derive(Debug, Clone)]
pub struct CircuitView {
    destination_domain: String,
    hops: Vec<RelayHop>,
}

impl CircuitView {
    pub(crate) fn from_record(record: &NewConnectionEvent) -> Self {
        let destination_domain = match record.tor_dst.split_once(':') {
            Some((host, _port)) => host.to_string(),
            None => record.tor_dst.clone(),
        };
        Self {
            destination_domain,
            hops: record.circuit.clone(),
        }
    }

    /// The host portion of the destination, stripped of its port.
    #[must_use]
    pub fn destination_domain(&self) -> &str {
        &self.destination_domain
    }

    /// The relays of the circuit, in hop order.
    #[must_use]
    pub fn hops(&self) -> &[RelayHop] {
        &self.hops
    }
}

/// Two views describe the same circuit when their destination domains match
/// and they involve the same relays, regardless of hop order.
impl PartialEq for CircuitView {
    fn eq(&self, other: &Self) -> bool {
        self.destination_domain == other.destination_domain
            && self.hops.len() == other.hops.len()
            && self.hops.iter().all(|hop| other.hops.contains(hop))
    }
}

impl Eq for CircuitView {}

/// The hop country codes of the most recent circuit built for one app.
///
/// `None` entries keep the position of hops whose country is unknown.
/// Stored independently of connection lifetimes: closing or failing a
/// connection never discards a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCodeSnapshot {
    codes: Vec<Option<String>>,
}

impl CountryCodeSnapshot {
    pub(crate) fn from_hops(hops: &[RelayHop]) -> Self {
        Self {
            codes: hops.iter().map(|hop| hop.country_code.clone()).collect(),
        }
    }

    /// Per-hop country codes, in hop order.
    #[must_use]
    pub fn codes(&self) -> &[Option<String>] {
        &self.codes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
