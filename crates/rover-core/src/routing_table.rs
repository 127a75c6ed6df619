//! Concurrent routing table.
//!
//! Mutated only by [`crate::engine::DistanceVectorEngine`]; read by the
//! control-plane periodic task and the data-plane forwarder/sender. Backed by
//! a `std::sync::RwLock`-guarded `HashMap` — a full concurrent map isn't
//! warranted because no critical section here ever crosses an `.await`.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use rover_proto::{PrivateAddress, PublicAddress, RouteRecord, INFINITY};

/// Shared, thread-safe routing table.
///
/// Clones share the same underlying map (cheap `Arc` clone).
#[derive(Clone)]
pub struct RoutingTable {
    inner: Arc<RwLock<HashMap<PrivateAddress, RouteRecord>>>,
    self_private: PrivateAddress,
}

impl RoutingTable {
    /// Create a table pre-populated with the local rover's own self-route
    /// (metric 1, next-hop its own public address). The self-route is never
    /// advertised to peers (see [`Self::snapshot_for_advertisement`] and the
    /// split-horizon-for-self rule in the per-record update).
    #[must_use]
    pub fn new(self_private: PrivateAddress, self_public: PublicAddress) -> Self {
        let mut map = HashMap::new();
        map.insert(self_private, RouteRecord::new(self_private, 24, self_public, 1));
        Self { inner: Arc::new(RwLock::new(map)), self_private }
    }

    /// The local rover's own self-route record, installed at construction
    /// and never removed by any mutator.
    #[must_use]
    pub fn self_route(&self) -> RouteRecord {
        #[allow(clippy::unwrap_used, reason = "the self-route is installed at construction and never removed")]
        self.get(self.self_private).unwrap()
    }

    /// Look up the current record for `dest`.
    #[must_use]
    pub fn get(&self, dest: PrivateAddress) -> Option<RouteRecord> {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.inner.read().unwrap().get(&dest).copied()
    }

    /// Whether a record exists for `dest` (including unreachable entries).
    #[must_use]
    pub fn has(&self, dest: PrivateAddress) -> bool {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.inner.read().unwrap().contains_key(&dest)
    }

    /// Resolve the next-hop public address to reach `dest`, if known.
    #[must_use]
    pub fn next_hop(&self, dest: PrivateAddress) -> Option<PublicAddress> {
        self.get(dest).map(|record| record.next_hop)
    }

    /// Current metric to `dest`, if known.
    #[must_use]
    pub fn metric(&self, dest: PrivateAddress) -> Option<u8> {
        self.get(dest).map(|record| record.metric)
    }

    /// Insert or overwrite the record for `dest.destination`.
    pub fn put(&self, record: RouteRecord) {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.inner.write().unwrap().insert(record.destination, record);
    }

    /// Set the metric of an existing record to `metric`, leaving the rest
    /// unchanged. No-op if `dest` is not present.
    pub fn set_metric(&self, dest: PrivateAddress, metric: u8) {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        if let Some(record) = self.inner.write().unwrap().get_mut(&dest) {
            record.metric = metric.min(INFINITY);
        }
    }

    /// Set the metric to `INFINITY` for every record whose next-hop equals
    /// `dead_public`. Used by [`crate::engine::DistanceVectorEngine::on_neighbor_death`].
    pub fn poison_via(&self, dead_public: PublicAddress) {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        let mut guard = self.inner.write().unwrap();
        for record in guard.values_mut() {
            if record.next_hop == dead_public {
                record.metric = INFINITY;
            }
        }
    }

    /// Snapshot all current records (clone under a read lock). Used to build
    /// an outgoing advertisement; safe under concurrent mutation but may
    /// include or exclude a concurrently-inserted record.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RouteRecord> {
        #[allow(clippy::unwrap_used, reason = "lock poisoning is an unrecoverable bug")]
        self.inner.read().unwrap().values().copied().collect()
    }

    /// Snapshot every record except the local rover's own self-route, for
    /// wire-encoding an outgoing advertisement. A rover never advertises
    /// itself as reachable through itself — the receiving peer installs that
    /// route directly from the packet's source address instead.
    #[must_use]
    pub fn snapshot_for_advertisement(&self) -> Vec<RouteRecord> {
        let self_destination = self.self_route().destination;
        self.snapshot().into_iter().filter(|record| record.destination != self_destination).collect()
    }

    /// A canonical, destination-sorted textual rendering of the table, used
    /// to detect whether an update changed anything.
    #[must_use]
    pub fn snapshot_signature(&self) -> String {
        let mut records = self.snapshot();
        records.sort_by_key(|r| r.destination.to_octets());

        let mut signature = String::with_capacity(records.len() * 32);
        for record in records {
            signature.push_str(&format!(
                "{}/{}-{}-{}\n",
                record.destination, record.mask, record.next_hop, record.metric
            ));
        }
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: u8) -> PrivateAddress {
        PrivateAddress::for_rover(id)
    }

    fn public(last: u8) -> PublicAddress {
        PublicAddress::new(std::net::Ipv4Addr::new(192, 168, 1, last))
    }

    #[test]
    fn new_table_has_self_route() {
        let table = RoutingTable::new(addr(1), public(1));
        let record = table.get(addr(1)).unwrap();
        assert_eq!(record.metric, 1);
        assert_eq!(record.next_hop, public(1));
    }

    #[test]
    fn put_and_get() {
        let table = RoutingTable::new(addr(1), public(1));
        table.put(RouteRecord::new(addr(2), 24, public(2), 1));
        assert!(table.has(addr(2)));
        assert_eq!(table.metric(addr(2)), Some(1));
    }

    #[test]
    fn set_metric_is_noop_for_missing_dest() {
        let table = RoutingTable::new(addr(1), public(1));
        table.set_metric(addr(99), 16);
        assert!(!table.has(addr(99)));
    }

    #[test]
    fn poison_via_sets_matching_next_hops_to_infinity() {
        let table = RoutingTable::new(addr(1), public(1));
        table.put(RouteRecord::new(addr(2), 24, public(2), 1));
        table.put(RouteRecord::new(addr(3), 24, public(2), 2));
        table.put(RouteRecord::new(addr(4), 24, public(3), 2));

        table.poison_via(public(2));

        assert_eq!(table.metric(addr(2)), Some(INFINITY));
        assert_eq!(table.metric(addr(3)), Some(INFINITY));
        assert_eq!(table.metric(addr(4)), Some(2));
    }

    #[test]
    fn snapshot_signature_is_order_independent() {
        let table_a = RoutingTable::new(addr(1), public(1));
        table_a.put(RouteRecord::new(addr(2), 24, public(2), 1));
        table_a.put(RouteRecord::new(addr(3), 24, public(3), 1));

        let table_b = RoutingTable::new(addr(1), public(1));
        table_b.put(RouteRecord::new(addr(3), 24, public(3), 1));
        table_b.put(RouteRecord::new(addr(2), 24, public(2), 1));

        assert_eq!(table_a.snapshot_signature(), table_b.snapshot_signature());
    }

    #[test]
    fn snapshot_signature_changes_on_metric_update() {
        let table = RoutingTable::new(addr(1), public(1));
        table.put(RouteRecord::new(addr(2), 24, public(2), 1));
        let before = table.snapshot_signature();

        table.set_metric(addr(2), 16);
        let after = table.snapshot_signature();

        assert_ne!(before, after);
    }
}
