//! Parsed bridge configuration values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The pluggable transport a bridge line configures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Obfs4,
    Snowflake,
    Webtunnel,
}

impl TransportType {
    /// The keyword opening a bridge line of this transport.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            TransportType::Obfs4 => "obfs4",
            TransportType::Snowflake => "snowflake",
            TransportType::Webtunnel => "webtunnel",
        }
    }
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// One parsed bridge line. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    raw_line: String,
    host: String,
    identity: Option<String>,
    options: HashMap<String, String>,
}

impl BridgeConfig {
    pub(crate) fn new(
        raw_line: String,
        host: String,
        identity: Option<String>,
        options: HashMap<String, String>,
    ) -> Self {
        Self {
            raw_line,
            host,
            identity,
            options,
        }
    }

    /// The original matched line text, trimmed.
    #[must_use]
    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    /// The bridge host, an `address:port` pair or a domain.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The positional identity field: the fingerprint for obfs4 and
    /// snowflake, the optional identity token for webtunnel.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Looks up a recognized option by key.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// All recognized options on this line.
    #[must_use]
    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }
}

/// All parsed bridge lines of one transport type.
///
/// The selected index always points at a valid entry while the list is
/// non-empty; it only changes through a bounds-checked selection draw.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    transport: TransportType,
    bridges: Vec<BridgeConfig>,
    selected: usize,
    client_port: Option<u16>,
}

impl TransportConfig {
    pub(crate) fn new(transport: TransportType) -> Self {
        Self {
            transport,
            bridges: Vec::new(),
            selected: 0,
            client_port: None,
        }
    }

    pub(crate) fn push(&mut self, bridge: BridgeConfig) {
        self.bridges.push(bridge);
    }

    pub(crate) fn select_bridge(&mut self, index: usize) {
        debug_assert!(index < self.bridges.len());
        if index < self.bridges.len() {
            self.selected = index;
        }
    }

    /// The transport type all bridges in this config share.
    #[must_use]
    pub fn transport(&self) -> TransportType {
        self.transport
    }

    /// The parsed bridge lines, in input order.
    #[must_use]
    pub fn bridges(&self) -> &[BridgeConfig] {
        &self.bridges
    }

    /// The currently selected bridge, or None for an empty config.
    #[must_use]
    pub fn selected_bridge(&self) -> Option<&BridgeConfig> {
        self.bridges.get(self.selected)
    }

    /// The selected bridge's raw line.
    #[must_use]
    pub fn selected_bridge_line(&self) -> Option<&str> {
        self.selected_bridge().map(BridgeConfig::raw_line)
    }

    /// Looks up an option on the selected bridge.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.selected_bridge().and_then(|bridge| bridge.option(key))
    }

    /// The bridge lines to hand to the proxy core.
    ///
    /// The snowflake client handles a single configuration at a time, so
    /// only the selected line is forwarded for snowflake; every other
    /// transport receives all parsed lines as alternates, newline-joined
    /// in input order.
    #[must_use]
    pub fn active_bridge_lines(&self) -> String {
        if self.transport == TransportType::Snowflake {
            return self.selected_bridge_line().unwrap_or_default().to_string();
        }
        let lines: Vec<&str> = self.bridges.iter().map(BridgeConfig::raw_line).collect();
        lines.join("\n").trim_end().to_string()
    }

    /// The client port externally assigned to the transport, if any.
    #[must_use]
    pub fn client_port(&self) -> Option<u16> {
        self.client_port
    }

    /// Records the client port the transport host assigned.
    pub fn set_client_port(&mut self, port: u16) {
        self.client_port = Some(port);
    }
}
