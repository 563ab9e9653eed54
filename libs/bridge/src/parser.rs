//! Bridge line parsing.
//!
//! A line is whitespace-tokenized and matched against the grammar tables in
//! their fixed order; the first structural match wins. Options may appear
//! in any order and any subset. An option key the matched transport does
//! not recognize is dropped rather than rejected, so configuration text
//! written for a newer client still parses here.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::error::ParseError;
use crate::grammar::{IdentityRule, LineGrammar, ValueKind, GRAMMARS};
use crate::types::{BridgeConfig, TransportConfig, TransportType};

/// Parses one bridge line against the supported transport grammars.
pub fn parse_line(line: &str) -> Result<(TransportType, BridgeConfig), ParseError> {
    let trimmed = line.trim();
    for grammar in &GRAMMARS {
        if let Some(config) = try_match(grammar, trimmed) {
            return Ok((grammar.transport, config));
        }
    }
    Err(ParseError::Unrecognized(trimmed.to_string()))
}

/// Parses newline-separated configuration text into one config per
/// transport type.
///
/// Every non-empty line is parsed independently; a line that matches no
/// grammar is logged and skipped, never aborting the batch. Lines of the
/// same type accumulate in input order.
pub fn parse_batch(text: &str) -> BTreeMap<TransportType, TransportConfig> {
    let mut batch = BTreeMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok((transport, config)) => {
                batch
                    .entry(transport)
                    .or_insert_with(|| TransportConfig::new(transport))
                    .push(config);
            }
            Err(err) => warn!(%err, "skipping bridge line"),
        }
    }
    batch
}

/// Matches one trimmed line against a single grammar.
fn try_match(grammar: &LineGrammar, line: &str) -> Option<BridgeConfig> {
    let mut tokens = line.split_whitespace().peekable();
    if tokens.next()? != grammar.transport.keyword() {
        return None;
    }

    // Positional fields never carry a key=value shape.
    let host = tokens.next().filter(|token| !token.contains('='))?.to_string();

    let identity = match grammar.identity {
        IdentityRule::Required => Some(tokens.next().filter(|token| !token.contains('='))?.to_string()),
        IdentityRule::OptionalAlphanumeric => match tokens.peek() {
            Some(token) if token.chars().all(|c| c.is_ascii_alphanumeric()) => {
                let token = (*token).to_string();
                tokens.next();
                Some(token)
            }
            _ => None,
        },
    };

    let mut options = HashMap::new();
    for token in tokens {
        // A bare token where only options may appear fails the grammar.
        let (key, value) = token.split_once('=')?;
        match grammar.option_kind(key) {
            Some(kind) if value_matches(kind, value) => {
                options.insert(key.to_string(), value.to_string());
            }
            // A recognized key with an invalid value fails the line.
            Some(_) => return None,
            // Unrecognized keys are dropped for forward compatibility.
            None => {}
        }
    }

    Some(BridgeConfig::new(line.to_string(), host, identity, options))
}

fn value_matches(kind: ValueKind, value: &str) -> bool {
    match kind {
        ValueKind::Opaque => !value.is_empty(),
        ValueKind::Digit => value.len() == 1 && value.chars().all(|c| c.is_ascii_digit()),
        ValueKind::List => !value.is_empty() && value.split(',').all(|segment| !segment.is_empty()),
    }
}
