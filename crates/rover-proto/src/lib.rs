//! Wire codecs and data model for the rover distance-vector routing protocol.
//!
//! This crate is pure: no I/O, no async, no clock. It exists so the framing
//! logic can be fuzzed and property-tested in isolation from sockets and
//! timers, the way `lockframe-proto` is kept separate from `lockframe-server`.

mod address;
mod advertisement;
mod data_frame;
mod error;
mod route;

pub use address::{PrivateAddress, PublicAddress};
pub use advertisement::{AdvertisementFrame, Command};
pub use data_frame::{DataFlag, DataFrame, FLAG_ACK, FLAG_NORMAL, FLAG_SYN, HEADER_LEN as DATA_FRAME_HEADER_LEN};
pub use error::{ProtocolError, Result};
pub use route::{RouteRecord, INFINITY, MASK_PREFIX_LEN};

/// Fixed unicast data port every rover listens on.
pub const DATA_PORT: u16 = 6161;

/// Fixed unicast ACK port every rover listens on.
pub const ACK_PORT: u16 = 5454;

/// Heartbeat dead-interval: a neighbor not heard from for this long is
/// declared dead.
pub const DEAD_INTERVAL: std::time::Duration = std::time::Duration::from_secs(7);

/// Periodic advertisement cadence.
pub const ADVERTISEMENT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Sender chunk size in bytes.
pub const CHUNK_SIZE: usize = 5000;

/// Sender startup delay before polling the routing table.
pub const SENDER_STARTUP_DELAY: std::time::Duration = std::time::Duration::from_secs(3);

/// Sleep between route-table polls while a destination is absent.
pub const SENDER_ROUTE_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// Sender's bounded ACK wait before retransmitting.
pub const ACK_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(1000);

/// Fixed output filename the receiver writes to.
pub const OUTPUT_FILE: &str = "OUTPUT_FILE";
