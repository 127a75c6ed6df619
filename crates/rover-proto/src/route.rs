//! Route records: the unit the routing table stores and advertisements carry.

use crate::address::{PrivateAddress, PublicAddress};

/// Hop count to a destination. `16` means unreachable ("infinity").
///
/// Represented as `u8` and always kept in `1..=16`; the wire format writes it
/// as the low byte of a 4-byte field.
pub const INFINITY: u8 = 16;

/// Fixed subnet mask prefix length used by every record in this system.
pub const MASK_PREFIX_LEN: u8 = 24;

/// A single routing table entry: how to reach `destination`.
///
/// # Invariants
///
/// - `metric` is always in `1..=16`.
/// - `destination` matches the key the record is stored under in the routing
///   table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRecord {
    /// Destination private address (the routing table key).
    pub destination: PrivateAddress,
    /// Subnet mask prefix length; fixed at 24 in this system.
    pub mask: u8,
    /// Next-hop public address used to reach `destination`.
    pub next_hop: PublicAddress,
    /// Hop count; `16` denotes unreachable.
    pub metric: u8,
}

impl RouteRecord {
    /// Build a record, clamping `metric` into `1..=16`.
    #[must_use]
    pub fn new(destination: PrivateAddress, mask: u8, next_hop: PublicAddress, metric: u8) -> Self {
        Self { destination, mask, next_hop, metric: metric.clamp(1, INFINITY) }
    }

    /// Whether this destination is currently unreachable.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        self.metric >= INFINITY
    }
}
