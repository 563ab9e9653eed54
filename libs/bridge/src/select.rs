//! Transport selection policy.
//!
//! The proxy core can run only one obfuscation layer at a time, so a batch
//! spanning several transport types is resolved by a uniformly random draw
//! rather than merged. Snowflake additionally supports only one
//! configuration at a time, so a second draw picks the active line within
//! a snowflake config.

use std::collections::BTreeMap;

use rand::Rng;

use crate::types::{TransportConfig, TransportType};

/// Selects the transport configuration to activate, using the thread-local
/// CSPRNG.
///
/// Returns None for an empty batch. A batch with exactly one transport
/// type is returned unmodified.
pub fn select(batch: BTreeMap<TransportType, TransportConfig>) -> Option<TransportConfig> {
    select_with_rng(batch, &mut rand::rng())
}

/// [`select`] with an injected random source, for deterministic tests.
pub fn select_with_rng<R: Rng + ?Sized>(
    mut batch: BTreeMap<TransportType, TransportConfig>,
    rng: &mut R,
) -> Option<TransportConfig> {
    let transport = if batch.len() > 1 {
        let types: Vec<TransportType> = batch.keys().copied().collect();
        types[rng.random_range(0..types.len())]
    } else {
        *batch.keys().next()?
    };

    let mut config = batch.remove(&transport)?;
    if config.transport() == TransportType::Snowflake && !config.bridges().is_empty() {
        let index = rng.random_range(0..config.bridges().len());
        config.select_bridge(index);
    }
    Some(config)
}
