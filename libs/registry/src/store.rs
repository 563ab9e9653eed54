//! The connection registry and its event-driven state machine.
//!
//! Per connection key the state machine is: absent → active on
//! `NewConnection` → absent on `ClosedConnection` or `FailedConnection`.
//! Close or fail for an absent key is a no-op; a failed key never seen
//! active is logged, a closed one is ignored since the proxy core sends a
//! close after a failure it already reported.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use torlink_events::{AppUid, NewConnectionEvent, ProxyEvent};
use tracing::warn;

use crate::circuit::{CircuitView, ConnectionKey, CountryCodeSnapshot};
use crate::error::RegistryError;

/// The three indices, guarded together so every reader observes a
/// consistent point in time.
///
/// Invariant: every key in an `active` set has an entry in `connections`.
/// Insertions and removals always touch both maps under the write lock.
#[derive(Debug, Default)]
struct Indices {
    /// Active connection keys per app UID.
    active: HashMap<AppUid, HashSet<ConnectionKey>>,
    /// Full connection records by key.
    connections: HashMap<ConnectionKey, Arc<NewConnectionEvent>>,
    /// Last-seen circuit country codes per app UID. Independent lifetime:
    /// close/fail never remove entries here.
    snapshots: HashMap<AppUid, CountryCodeSnapshot>,
}

/// Tracks open proxy connections and last-seen circuits per app UID.
///
/// Construct one instance and hand it to both the event consumer and the
/// reporting side; all methods take `&self` and are safe to call from any
/// thread.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Indices>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one decoded proxy event into the registry.
    ///
    /// Only connection lifecycle events mutate state; bootstrap, directory
    /// and unknown events are not connection-scoped and are ignored here.
    pub fn handle_event(&self, event: &ProxyEvent) {
        match event {
            ProxyEvent::NewConnection(record) => self.on_new_connection(record.clone()),
            ProxyEvent::FailedConnection(failed) => {
                self.on_failed_connection(&ConnectionKey::new(
                    failed.proxy_src.as_str(),
                    failed.proxy_dst.as_str(),
                ));
            }
            ProxyEvent::ClosedConnection(closed) => {
                self.on_closed_connection(&ConnectionKey::new(
                    closed.proxy_src.as_str(),
                    closed.proxy_dst.as_str(),
                ));
            }
            ProxyEvent::Bootstrap(_) | ProxyEvent::NewDirectory(_) | ProxyEvent::Unknown { .. } => {}
        }
    }

    /// Marks a connection active and overwrites its app's country code
    /// snapshot with the new circuit's hops.
    pub fn on_new_connection(&self, record: NewConnectionEvent) {
        let key = ConnectionKey::from(&record);
        let snapshot = CountryCodeSnapshot::from_hops(&record.circuit);
        let app = record.app_id;

        let mut inner = self.write();
        inner.active.entry(app).or_default().insert(key.clone());
        inner.connections.insert(key, Arc::new(record));
        inner.snapshots.insert(app, snapshot);
    }

    /// Removes a connection after a clean or unclean close.
    pub fn on_closed_connection(&self, key: &ConnectionKey) {
        let mut inner = self.write();
        // Commonly a no-op: the record is already gone when a close trails
        // a failure for the same key.
        Self::remove_connection(&mut inner, key);
    }

    /// Removes a connection after a failure.
    pub fn on_failed_connection(&self, key: &ConnectionKey) {
        let mut inner = self.write();
        if !Self::remove_connection(&mut inner, key) {
            warn!(%key, "failed connection event for a connection never seen active");
        }
    }

    /// The de-duplicated circuits of the app's currently active
    /// connections. Empty when the app has none.
    pub fn circuits_for_app(&self, app: AppUid) -> Result<Vec<CircuitView>, RegistryError> {
        let inner = self.read();
        let Some(keys) = inner.active.get(&app) else {
            return Ok(Vec::new());
        };

        let mut circuits: Vec<CircuitView> = Vec::with_capacity(keys.len());
        for key in keys {
            let record = inner
                .connections
                .get(key)
                .ok_or_else(|| RegistryError::Inconsistent { key: key.clone() })?;
            let view = CircuitView::from_record(record);
            if !circuits.contains(&view) {
                circuits.push(view);
            }
        }
        Ok(circuits)
    }

    /// The country codes of the most recent circuit seen for the app, if
    /// any snapshot was recorded and not evicted.
    pub fn country_codes_for_app(&self, app: AppUid) -> Option<CountryCodeSnapshot> {
        self.read().snapshots.get(&app).cloned()
    }

    /// Drops the app's country code snapshot, e.g. when the app leaves
    /// monitoring.
    pub fn evict_country_codes(&self, app: AppUid) {
        self.write().snapshots.remove(&app);
    }

    /// Clears all state. Called on proxy restart.
    pub fn reset(&self) {
        let mut inner = self.write();
        inner.active.clear();
        inner.connections.clear();
        inner.snapshots.clear();
    }

    /// Removes the record and its active-set entry together, keeping the
    /// two indices symmetric. Returns false when the key was not active.
    fn remove_connection(inner: &mut Indices, key: &ConnectionKey) -> bool {
        let Some(record) = inner.connections.remove(key) else {
            return false;
        };
        if let Some(keys) = inner.active.get_mut(&record.app_id) {
            keys.remove(key);
            if keys.is_empty() {
                inner.active.remove(&record.app_id);
            }
        }
        true
    }

    // Lock poisoning cannot leave the indices half-updated: no method
    // panics while holding a guard, so a poisoned lock still holds a
    // consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Indices> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Indices> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torlink_events::RelayHop;

    fn hop(country: Option<&str>) -> RelayHop {
        RelayHop {
            rsa_identity: Some(format!("id-{}", country.unwrap_or("xx"))),
            ed_identity: None,
            addresses: vec!["198.51.100.1:9001".to_string()],
            country_code: country.map(str::to_string),
        }
    }

    fn connection(src: &str, dst: &str, app: u32, countries: &[&str]) -> NewConnectionEvent {
        NewConnectionEvent {
            proxy_src: src.to_string(),
            proxy_dst: dst.to_string(),
            tor_dst: "example.com:443".to_string(),
            app_id: AppUid::new(app),
            circuit: countries.iter().map(|c| hop(Some(c))).collect(),
        }
    }

    fn codes(snapshot: &CountryCodeSnapshot) -> Vec<Option<&str>> {
        snapshot.codes().iter().map(Option::as_deref).collect()
    }

    #[test]
    fn test_new_then_closed_keeps_the_country_snapshot() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(42);
        registry.on_new_connection(connection("10.0.0.1:1111", "10.0.0.2:2222", 42, &["US", "DE"]));

        assert_eq!(registry.circuits_for_app(app).unwrap().len(), 1);
        let snapshot = registry.country_codes_for_app(app).unwrap();
        assert_eq!(codes(&snapshot), vec![Some("US"), Some("DE")]);

        registry.on_closed_connection(&ConnectionKey::new("10.0.0.1:1111", "10.0.0.2:2222"));

        assert!(registry.circuits_for_app(app).unwrap().is_empty());
        let snapshot = registry.country_codes_for_app(app).unwrap();
        assert_eq!(codes(&snapshot), vec![Some("US"), Some("DE")]);
    }

    #[test]
    fn test_failed_event_for_unknown_key_changes_nothing() {
        let registry = ConnectionRegistry::new();
        registry.on_new_connection(connection("a:1", "b:2", 42, &["US"]));

        registry.on_failed_connection(&ConnectionKey::new("z:9", "y:8"));

        assert_eq!(registry.circuits_for_app(AppUid::new(42)).unwrap().len(), 1);
        assert!(registry.country_codes_for_app(AppUid::new(42)).is_some());
    }

    #[test]
    fn test_closed_after_failed_is_a_silent_no_op() {
        let registry = ConnectionRegistry::new();
        registry.on_new_connection(connection("a:1", "b:2", 42, &["US"]));

        let key = ConnectionKey::new("a:1", "b:2");
        registry.on_failed_connection(&key);
        registry.on_closed_connection(&key);

        assert!(registry.circuits_for_app(AppUid::new(42)).unwrap().is_empty());
    }

    #[test]
    fn test_new_connection_overwrites_the_snapshot() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(7);
        registry.on_new_connection(connection("a:1", "b:2", 7, &["US", "DE"]));
        registry.on_new_connection(connection("a:3", "b:4", 7, &["FR", "NL", "SE"]));

        let snapshot = registry.country_codes_for_app(app).unwrap();
        assert_eq!(codes(&snapshot), vec![Some("FR"), Some("NL"), Some("SE")]);
        // Both connections stay active; only the snapshot is replaced.
        assert_eq!(registry.circuits_for_app(app).unwrap().len(), 2);
    }

    #[test]
    fn test_identical_circuits_are_deduplicated() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(7);
        // Same destination and relays, different source ports.
        registry.on_new_connection(connection("a:1", "b:2", 7, &["US", "DE"]));
        registry.on_new_connection(connection("a:5", "b:2", 7, &["US", "DE"]));

        assert_eq!(registry.circuits_for_app(app).unwrap().len(), 1);
    }

    #[test]
    fn test_app_entry_disappears_with_its_last_connection() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(7);
        registry.on_new_connection(connection("a:1", "b:2", 7, &["US"]));
        registry.on_new_connection(connection("a:3", "b:4", 7, &["US"]));

        registry.on_closed_connection(&ConnectionKey::new("a:1", "b:2"));
        assert_eq!(registry.circuits_for_app(app).unwrap().len(), 1);

        registry.on_closed_connection(&ConnectionKey::new("a:3", "b:4"));
        assert!(registry.circuits_for_app(app).unwrap().is_empty());
        assert!(registry.read().active.is_empty());
    }

    #[test]
    fn test_unknown_country_codes_keep_their_hop_position() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(9);
        registry.on_new_connection(NewConnectionEvent {
            circuit: vec![hop(Some("US")), hop(None), hop(Some("DE"))],
            ..connection("a:1", "b:2", 9, &[])
        });

        let snapshot = registry.country_codes_for_app(app).unwrap();
        assert_eq!(codes(&snapshot), vec![Some("US"), None, Some("DE")]);
    }

    #[test]
    fn test_evict_country_codes() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(42);
        registry.on_new_connection(connection("a:1", "b:2", 42, &["US"]));

        registry.evict_country_codes(app);
        assert!(registry.country_codes_for_app(app).is_none());
        // Eviction is snapshot-only; the connection stays active.
        assert_eq!(registry.circuits_for_app(app).unwrap().len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let registry = ConnectionRegistry::new();
        let app = AppUid::new(42);
        registry.on_new_connection(connection("a:1", "b:2", 42, &["US", "DE"]));
        registry.on_closed_connection(&ConnectionKey::new("a:1", "b:2"));

        registry.reset();

        assert!(registry.circuits_for_app(app).unwrap().is_empty());
        assert!(registry.country_codes_for_app(app).is_none());
        let inner = registry.read();
        assert!(inner.active.is_empty());
        assert!(inner.connections.is_empty());
        assert!(inner.snapshots.is_empty());
    }

    #[test]
    fn test_event_routing() {
        let registry = ConnectionRegistry::new();
        let record = connection("10.0.0.1:1111", "10.0.0.2:2222", 42, &["US", "DE"]);
        registry.handle_event(&ProxyEvent::NewConnection(record));
        assert_eq!(registry.circuits_for_app(AppUid::new(42)).unwrap().len(), 1);

        registry.handle_event(&ProxyEvent::Unknown {
            raw: "{\"type\":\"CircuitRebuilt\"}".to_string(),
        });
        assert_eq!(registry.circuits_for_app(AppUid::new(42)).unwrap().len(), 1);

        registry.handle_event(&ProxyEvent::ClosedConnection(
            torlink_events::ClosedConnectionEvent {
                proxy_src: "10.0.0.1:1111".to_string(),
                proxy_dst: "10.0.0.2:2222".to_string(),
                error: None,
            },
        ));
        assert!(registry.circuits_for_app(AppUid::new(42)).unwrap().is_empty());
    }

    #[test]
    fn test_inconsistent_indices_surface_as_an_error() {
        let registry = ConnectionRegistry::new();
        let key = ConnectionKey::new("a:1", "b:2");
        // Simulate the event-delivery bug the invariant guards against: an
        // active key without a record.
        registry
            .write()
            .active
            .entry(AppUid::new(42))
            .or_default()
            .insert(key.clone());

        assert_eq!(
            registry.circuits_for_app(AppUid::new(42)),
            Err(RegistryError::Inconsistent { key })
        );
    }
}
