//! Self public-address discovery.

use std::net::Ipv4Addr;

use crate::error::RoverError;

/// An arbitrary public address used only to make the kernel pick an
/// outbound route; no packet is ever sent there. Not the multicast group —
/// that address is configurable and may not be externally routable.
const PROBE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// Discover this host's outbound interface address via the
/// connect-then-`local_addr` trick: UDP `connect` never sends a packet, it
/// only picks the kernel route that would be used, so this is instant and
/// side-effect free.
pub async fn discover_public_address() -> Result<Ipv4Addr, RoverError> {
    let socket = tokio::net::UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(PROBE_TARGET).await?;
    match socket.local_addr()? {
        std::net::SocketAddr::V4(v4) => Ok(*v4.ip()),
        std::net::SocketAddr::V6(_) => {
            Err(RoverError::Config("connect-then-local_addr resolved to an IPv6 address".into()))
        },
    }
}
