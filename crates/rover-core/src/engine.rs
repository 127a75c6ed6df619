//! Distance-vector update engine.
//!
//! Sans-IO: every method here takes a decoded advertisement (or a derived
//! death event) and returns a `Vec<RoverAction>` describing what the caller
//! must do next (typically: emit an advertisement). No socket is touched in
//! this module, which is what makes the convergence and death-handling
//! scenarios testable without any networking.

use rover_proto::{AdvertisementFrame, Command, PrivateAddress, PublicAddress, RouteRecord, INFINITY};

use crate::{neighbor::NeighborCache, routing_table::RoutingTable};

/// Side effect the caller must perform after a `DistanceVectorEngine` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoverAction {
    /// Emit a full-table advertisement on the control plane now (a triggered
    /// update, in addition to the periodic cadence).
    EmitAdvertisement(AdvertisementFrame),
}

/// The distance-vector update rule, routing table mutation, and
/// triggered-update decision, decoupled from sockets and timers.
pub struct DistanceVectorEngine {
    my_id: u8,
    my_private: PrivateAddress,
    my_public: PublicAddress,
    table: RoutingTable,
    cache: NeighborCache,
}

impl DistanceVectorEngine {
    /// Build an engine for rover `my_id`, sharing `table` with the rest of
    /// the process.
    #[must_use]
    pub fn new(my_id: u8, my_public: PublicAddress, table: RoutingTable) -> Self {
        Self {
            my_id,
            my_private: PrivateAddress::for_rover(my_id),
            my_public,
            table,
            cache: NeighborCache::new(),
        }
    }

    /// The shared routing table this engine mutates.
    #[must_use]
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// The neighbor cache this engine populates (unused by the death path;
    /// see [`crate::neighbor::NeighborCache`]).
    #[must_use]
    pub fn cache(&self) -> &NeighborCache {
        &self.cache
    }

    /// This rover's private address.
    #[must_use]
    pub fn my_private(&self) -> PrivateAddress {
        self.my_private
    }

    /// Build a full-table advertisement, excluding the local rover's own
    /// self-route (used for both the periodic cadence and triggered
    /// updates).
    #[must_use]
    pub fn build_advertisement(&self, command: Command) -> AdvertisementFrame {
        AdvertisementFrame::new(command, self.my_id, self.table.snapshot_for_advertisement())
    }

    /// Process one decoded advertisement: self-reject, neighbor install,
    /// per-record update, and triggered-update decision.
    ///
    /// Returns `None` if `frame` is our own multicast echo. Otherwise returns
    /// the sending neighbor's private address (the caller must call
    /// `NeighborTimers::touch` with it to arm/refresh the heartbeat timer —
    /// that lives in `rover-net` since it needs the `Environment`/channel
    /// wiring this crate doesn't own) plus any actions to perform.
    pub fn on_advertisement(
        &self,
        source_public: PublicAddress,
        frame: &AdvertisementFrame,
    ) -> Option<(PrivateAddress, Vec<RoverAction>)> {
        if frame.rover_id == self.my_id {
            return None;
        }

        let neighbor_private = PrivateAddress::for_rover(frame.rover_id);

        // Captured before the neighbor install so a brand-new neighbor
        // showing up for the first time counts as a change in its own
        // right, not just a side effect of whatever records follow.
        let before = self.table.snapshot_signature();

        // Neighbor install: unconditional, overwrites any prior record.
        self.table.put(RouteRecord::new(neighbor_private, 24, source_public, 1));

        self.cache.record(neighbor_private, source_public, frame.clone());

        for entry in &frame.records {
            if entry.destination == self.my_private {
                continue; // split-horizon for self
            }
            self.apply_update_rule(entry, source_public);
        }

        let after = self.table.snapshot_signature();
        let changed = before != after;

        let mut actions = Vec::new();
        if changed || frame.command == Command::Request {
            actions.push(RoverAction::EmitAdvertisement(self.build_advertisement(Command::Update)));
        }

        Some((neighbor_private, actions))
    }

    /// Apply the update rule for a single inbound record.
    fn apply_update_rule(&self, entry: &RouteRecord, source_public: PublicAddress) {
        let v = if entry.next_hop == self.my_public { INFINITY } else { entry.metric };
        let new_metric = (1u16 + u16::from(v)).min(u16::from(INFINITY)) as u8;

        match self.table.get(entry.destination) {
            None => {
                self.table.put(RouteRecord::new(entry.destination, entry.mask, source_public, new_metric));
            },
            Some(current) => {
                if current.next_hop == source_public || current.metric > 1 + v.min(INFINITY - 1) {
                    self.table.put(RouteRecord::new(entry.destination, entry.mask, source_public, new_metric));
                }
            },
        }
    }

    /// Neighbor death: poison the neighbor's own route and every
    /// route whose next-hop is the dead neighbor, then emit a triggered
    /// update. Cache entries for the dead neighbor are retained.
    pub fn on_neighbor_death(&self, dead_private: PrivateAddress, dead_public: PublicAddress) -> Vec<RoverAction> {
        self.table.set_metric(dead_private, INFINITY);
        self.table.poison_via(dead_public);

        vec![RoverAction::EmitAdvertisement(self.build_advertisement(Command::Update))]
    }
}
