//! Multicast control-plane socket: advertisement emission and reception.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use rover_proto::{AdvertisementFrame, PublicAddress};
use socket2::{Domain, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::NetError;

/// Receive buffer size; an advertisement for a table of dozens of routes
/// comfortably fits (`8 + N * 16` bytes per [`rover_proto::AdvertisementFrame`]).
const RECV_BUFFER_LEN: usize = 1024;

/// Owns the multicast socket shared by every rover on the control plane.
///
/// `emit` sends to the group; the receive loop (driven by repeated calls to
/// `recv_one`) hands decoded advertisements, tagged with their source, to the
/// caller. Decode failures are logged and do not terminate the loop; only an
/// `std::io::Error` from the socket itself is fatal.
pub struct ControlPlaneIO {
    socket: UdpSocket,
    group: SocketAddrV4,
}

impl ControlPlaneIO {
    /// Bind a UDP socket on `port`, join `group` on the interface reachable
    /// via `local_interface`, and set it up for multicast send/receive.
    ///
    /// Binds with `SO_REUSEADDR` so several rovers can share one multicast
    /// port on the same host (production runs one rover per host, but tests
    /// and local demos run several on loopback).
    pub async fn bind(group: Ipv4Addr, port: u16, local_interface: Ipv4Addr) -> Result<Self, NetError> {
        let raw = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
        raw.set_reuse_address(true)?;
        raw.set_nonblocking(true)?;
        raw.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into())?;

        let socket = UdpSocket::from_std(std::net::UdpSocket::from(raw))?;
        socket.join_multicast_v4(group, local_interface)?;
        socket.set_multicast_loop_v4(true)?;

        tracing::info!(%group, port, "control plane bound and joined multicast group");

        Ok(Self { socket, group: SocketAddrV4::new(group, port) })
    }

    /// Send one advertisement to the multicast group.
    pub async fn emit(&self, frame: &AdvertisementFrame) -> Result<(), NetError> {
        let wire = frame.encode();
        self.socket.send_to(&wire, self.group).await?;
        Ok(())
    }

    /// Receive and decode the next advertisement. Loops internally past
    /// malformed datagrams (logged at `tracing::warn!`); only socket I/O
    /// errors are returned.
    pub async fn recv_one(&self) -> Result<(PublicAddress, AdvertisementFrame), NetError> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        loop {
            let (len, source) = self.socket.recv_from(&mut buf).await?;

            match AdvertisementFrame::decode(&buf[..len]) {
                Ok(frame) => {
                    let source_public = match source {
                        SocketAddr::V4(v4) => PublicAddress::new(*v4.ip()),
                        SocketAddr::V6(_) => {
                            tracing::warn!(%source, "ignoring advertisement from IPv6 peer");
                            continue;
                        },
                    };
                    return Ok((source_public, frame));
                },
                Err(err) => {
                    tracing::warn!(%source, %err, "discarding malformed advertisement");
                },
            }
        }
    }
}
