//! Routing table, neighbor liveness, and the sans-IO distance-vector engine.
//!
//! `rover-net` drives this crate from sockets; `rover-harness` drives it from
//! a `turmoil` simulation; this crate's own tests drive it directly.

pub mod engine;
pub mod env;
pub mod error;
pub mod neighbor;
pub mod routing_table;

#[cfg(test)]
mod test_env;

pub use engine::{DistanceVectorEngine, RoverAction};
pub use env::Environment;
pub use error::EngineError;
pub use neighbor::{NeighborCache, NeighborEvent, NeighborTimers};
pub use routing_table::RoutingTable;
