//! Socket ownership for the rover protocol: the multicast control plane and
//! the unicast data plane, wiring `rover-core`'s engine and routing table to
//! real UDP sockets.

pub mod control_plane;
pub mod data_plane;
mod error;

pub use control_plane::ControlPlaneIO;
pub use data_plane::{DataPlaneIO, ReceiverOutcome, SenderOutcome};
pub use error::NetError;
