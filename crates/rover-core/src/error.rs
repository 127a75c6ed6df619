//! Defensive error type for invariants the engine never expects to violate
//! in correct code — kept separate from [`rover_proto::ProtocolError`] and
//! `rover_net::NetError`, one error type per layer.

use rover_proto::PrivateAddress;
use thiserror::Error;

/// An invariant violation inside [`crate::engine::DistanceVectorEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// A route was looked up for a destination that should already have had
    /// a self-route or neighbor-install entry created for it.
    #[error("missing routing table entry for {0}")]
    MissingRoute(PrivateAddress),
}
