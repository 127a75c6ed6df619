//! Network-layer errors.

use thiserror::Error;

/// Errors surfaced by [`crate::control_plane::ControlPlaneIO`] and
/// [`crate::data_plane::DataPlaneIO`].
#[derive(Debug, Error)]
pub enum NetError {
    /// No route exists to the requested destination. Transient: the
    /// forwarder drops the frame, the sender keeps polling.
    #[error("no route to destination")]
    NoRouteToDestination,

    /// An ACK was not received within the retransmission timeout. Recovered
    /// locally by retransmitting the same sequence number; not a retry cap.
    #[error("timed out waiting for ack")]
    AckTimeout,

    /// Socket or filesystem failure. Terminates the process via the
    /// `Supervisor`.
    #[error("fatal I/O error: {0}")]
    Fatal(#[from] std::io::Error),
}
