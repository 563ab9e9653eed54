//! Declarative grammar tables for the supported transport line formats.
//!
//! Each transport defines a keyword, a positional-field rule, and the set
//! of `key=value` options it recognizes. The parser consults these tables
//! only; adding a transport means adding a table entry.

use crate::types::TransportType;

// Option keys, shared across transports where the wire format reuses them.
pub const CERT: &str = "cert";
pub const IAT_MODE: &str = "iat-mode";
pub const FINGERPRINT: &str = "fingerprint";
pub const URL: &str = "url";
pub const FRONTS: &str = "fronts";
pub const ICE: &str = "ice";
pub const UTLS_IMITATE: &str = "utls-imitate";
pub const AMP_CACHE: &str = "amp-cache";
pub const SQS_CREDS_STR: &str = "sqs-creds-str";
pub const SQS_QUEUE_URL: &str = "sqs-queue-url";
pub const VER: &str = "ver";

/// How an option's value is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    /// Any non-empty whitespace-free token.
    Opaque,
    /// A single decimal digit.
    Digit,
    /// Comma-joined list of non-empty whitespace-free segments.
    List,
}

/// One recognized `key=value` option.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OptionSpec {
    pub key: &'static str,
    pub kind: ValueKind,
}

const fn opaque(key: &'static str) -> OptionSpec {
    OptionSpec {
        key,
        kind: ValueKind::Opaque,
    }
}

const fn list(key: &'static str) -> OptionSpec {
    OptionSpec {
        key,
        kind: ValueKind::List,
    }
}

/// Rule for the positional field following the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentityRule {
    /// The field is mandatory (obfs4/snowflake fingerprint).
    Required,
    /// The field may be present as an alphanumeric token (webtunnel
    /// identity).
    OptionalAlphanumeric,
}

/// The complete line grammar for one transport type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineGrammar {
    pub transport: TransportType,
    pub identity: IdentityRule,
    pub options: &'static [OptionSpec],
}

impl LineGrammar {
    /// Returns the value kind for a recognized option key, or None for a
    /// key this transport does not understand.
    pub fn option_kind(&self, key: &str) -> Option<ValueKind> {
        self.options
            .iter()
            .find(|spec| spec.key == key)
            .map(|spec| spec.kind)
    }
}

/// Grammars in their fixed matching order. The first structural match wins;
/// keywords keep the grammars disjoint in practice, but the order is part
/// of the compatibility contract.
pub(crate) const GRAMMARS: [LineGrammar; 3] = [
    LineGrammar {
        transport: TransportType::Obfs4,
        identity: IdentityRule::Required,
        options: &[
            opaque(CERT),
            OptionSpec {
                key: IAT_MODE,
                kind: ValueKind::Digit,
            },
        ],
    },
    LineGrammar {
        transport: TransportType::Snowflake,
        identity: IdentityRule::Required,
        options: &[
            opaque(FINGERPRINT),
            opaque(URL),
            list(FRONTS),
            list(ICE),
            opaque(UTLS_IMITATE),
            opaque(AMP_CACHE),
            opaque(SQS_CREDS_STR),
            opaque(SQS_QUEUE_URL),
        ],
    },
    LineGrammar {
        transport: TransportType::Webtunnel,
        identity: IdentityRule::OptionalAlphanumeric,
        options: &[opaque(URL), opaque(VER)],
    },
];
