//! Unicast data plane: stop-and-wait file transfer sender, and the shared
//! receiver/forwarder loop.

use std::net::Ipv4Addr;

use bytes::Bytes;
use rover_core::{Environment, RoutingTable};
use rover_proto::{
    DataFlag, DataFrame, PrivateAddress, PublicAddress, ACK_PORT, ACK_TIMEOUT, CHUNK_SIZE,
    DATA_FRAME_HEADER_LEN, DATA_PORT, SENDER_ROUTE_POLL_INTERVAL, SENDER_STARTUP_DELAY,
};
use socket2::{Domain, Socket, Type};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
    net::UdpSocket,
};

use crate::error::NetError;

const RECV_BUFFER_LEN: usize = CHUNK_SIZE + 256;

/// How the sender's file transfer concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderOutcome {
    /// Every chunk was sent and acknowledged.
    Done,
}

/// How a single received datagram was disposed of, or how the transfer we're
/// the final destination of concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverOutcome {
    /// The datagram was forwarded toward its destination; the transfer
    /// continues.
    Forwarded,
    /// The datagram was for us and accepted, but the transfer isn't done.
    Accepted,
    /// The datagram was dropped (no route, duplicate, or out-of-order).
    Dropped,
    /// We were the destination and the last byte of the file has arrived.
    Complete,
}

/// Bind a UDP socket with `SO_REUSEADDR` to `addr:port`.
///
/// Binding to the rover's own interface address rather than the wildcard
/// address is what lets several rovers share one host's loopback range in
/// local demos and tests (each on its own `127.0.0.x`); production rovers
/// running one per real host could equally bind the wildcard address, but
/// binding the known interface address works in both cases.
fn bind_reusable(addr: Ipv4Addr, port: u16) -> Result<UdpSocket, NetError> {
    let raw = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    raw.set_reuse_address(true)?;
    raw.set_nonblocking(true)?;
    raw.bind(&std::net::SocketAddrV4::new(addr, port).into())?;
    Ok(UdpSocket::from_std(std::net::UdpSocket::from(raw))?)
}

/// Owns the data port and ACK port, and the routing table used to resolve
/// next hops.
pub struct DataPlaneIO {
    data_socket: UdpSocket,
    ack_socket: UdpSocket,
    table: RoutingTable,
    my_private: PrivateAddress,
}

impl DataPlaneIO {
    /// Bind both fixed-port sockets to `bind_addr` (this rover's own
    /// interface address).
    pub fn bind(bind_addr: Ipv4Addr, my_private: PrivateAddress, table: RoutingTable) -> Result<Self, NetError> {
        let data_socket = bind_reusable(bind_addr, DATA_PORT)?;
        let ack_socket = bind_reusable(bind_addr, ACK_PORT)?;
        Ok(Self { data_socket, ack_socket, table, my_private })
    }

    /// Run the sender side of a file transfer to `destination`.
    ///
    /// Waits [`rover_proto::SENDER_STARTUP_DELAY`] to let routes converge,
    /// then polls the routing table every
    /// [`rover_proto::SENDER_ROUTE_POLL_INTERVAL`] until a route to
    /// `destination` appears. Reads `file` in
    /// [`rover_proto::CHUNK_SIZE`]-byte chunks, sending each as stop-and-wait
    /// over the data port and waiting for its ACK on the ACK port.
    pub async fn run_sender<E: Environment>(
        &self,
        env: &E,
        destination: PrivateAddress,
        mut file: File,
        total_size: u32,
    ) -> Result<SenderOutcome, NetError> {
        env.sleep(SENDER_STARTUP_DELAY).await;

        let next_hop = loop {
            if let Some(hop) = self.table.next_hop(destination) {
                break hop;
            }
            tracing::info!(%destination, "no route yet, waiting for convergence");
            env.sleep(SENDER_ROUTE_POLL_INTERVAL).await;
        };

        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut seqno = 0u32;
        let mut first = true;

        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }

            let payload = Bytes::copy_from_slice(&chunk[..read]);
            let frame = if first {
                first = false;
                DataFrame::syn(destination, self.my_private, total_size, payload)
            } else {
                seqno += 1;
                DataFrame::normal(destination, self.my_private, seqno, payload)
            };
            let expected_ack = frame.seqno + 1;

            self.send_and_await_ack(&frame, next_hop, expected_ack, env).await?;
        }

        Ok(SenderOutcome::Done)
    }

    /// Send `frame` to `next_hop` on the data port, retransmitting on
    /// [`rover_proto::ACK_TIMEOUT`] until an ACK with `ack_number ==
    /// expected_ack` arrives on the ACK port.
    async fn send_and_await_ack<E: Environment>(
        &self,
        frame: &DataFrame,
        next_hop: PublicAddress,
        expected_ack: u32,
        env: &E,
    ) -> Result<(), NetError> {
        let wire = frame.encode();
        let mut ack_buf = [0u8; DATA_FRAME_HEADER_LEN];

        loop {
            self.data_socket.send_to(&wire, (next_hop.as_ipv4(), DATA_PORT)).await?;

            let deadline = env.now();
            loop {
                let elapsed = env.now() - deadline;
                if elapsed >= ACK_TIMEOUT {
                    tracing::debug!(seqno = frame.seqno, "ack timeout, retransmitting");
                    break;
                }

                let remaining = ACK_TIMEOUT - elapsed;
                let recv = tokio::time::timeout(remaining, self.ack_socket.recv_from(&mut ack_buf)).await;
                let Ok(recv) = recv else {
                    break;
                };
                let (len, _source) = recv?;

                let Ok(ack) = DataFrame::decode(&ack_buf[..len]) else {
                    continue;
                };
                if ack.is_ack() && ack.ackno == expected_ack {
                    return Ok(());
                }
            }
        }
    }

    /// Run the shared receiver/forwarder loop on the data port until this
    /// rover is the final destination of a transfer that completes.
    pub async fn run_receiver_forwarder(&self) -> Result<ReceiverOutcome, NetError> {
        let mut receiving = ReceivingState::new();
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        loop {
            let (len, _source) = self.data_socket.recv_from(&mut buf).await?;

            let frame = match DataFrame::decode(&buf[..len]) {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::warn!(%err, "discarding malformed data frame");
                    continue;
                },
            };

            if frame.destination != self.my_private {
                self.forward(&frame).await;
                continue;
            }

            match self.accept_for_self(&frame, &mut receiving).await {
                Ok(ReceiverOutcome::Complete) => return Ok(ReceiverOutcome::Complete),
                Ok(_) | Err(_) => {},
            }
        }
    }

    /// Forward a frame not addressed to us toward its destination. Drops it
    /// if no route exists.
    async fn forward(&self, frame: &DataFrame) {
        let Some(next_hop) = self.table.next_hop(frame.destination) else {
            tracing::debug!(destination = %frame.destination, "dropping frame, no route");
            return;
        };

        // The final hop toward the frame's source (an ACK travelling back)
        // goes to the ACK port; everything else goes to the data port.
        let is_final_ack_hop = frame.is_ack() && self.table.metric(frame.destination) == Some(1);
        let port = if is_final_ack_hop { ACK_PORT } else { DATA_PORT };

        if let Err(err) = self.data_socket.send_to(&frame.encode(), (next_hop.as_ipv4(), port)).await {
            tracing::warn!(%err, "forward send failed");
        }
    }

    /// Apply the drop rules and, if accepted, append to the output sink and
    /// ACK back toward the source.
    async fn accept_for_self(
        &self,
        frame: &DataFrame,
        receiving: &mut ReceivingState,
    ) -> Result<ReceiverOutcome, NetError> {
        match frame.flag {
            DataFlag::Normal if frame.seqno != receiving.expected_seqno => {
                tracing::debug!(seqno = frame.seqno, expected = receiving.expected_seqno, "dropping out-of-order frame");
                return Ok(ReceiverOutcome::Dropped);
            },
            DataFlag::Syn if receiving.expected_seqno != 0 => {
                tracing::debug!("dropping duplicate syn, transfer already in progress");
                return Ok(ReceiverOutcome::Dropped);
            },
            DataFlag::Ack => {
                return Ok(ReceiverOutcome::Dropped);
            },
            _ => {},
        }

        if frame.flag == DataFlag::Syn {
            receiving.remaining = frame.total_size.saturating_sub(frame.payload.len() as u32);
            receiving.sink = Some(File::create(rover_proto::OUTPUT_FILE).await?);
        } else {
            receiving.remaining = receiving.remaining.saturating_sub(frame.payload.len() as u32);
        }

        if let Some(sink) = receiving.sink.as_mut() {
            sink.write_all(&frame.payload).await?;
        }

        self.send_ack(frame).await?;
        receiving.expected_seqno += 1;

        if receiving.remaining == 0 {
            if let Some(mut sink) = receiving.sink.take() {
                sink.flush().await?;
            }
            return Ok(ReceiverOutcome::Complete);
        }

        Ok(ReceiverOutcome::Accepted)
    }

    /// Build and send an ACK for `frame`, per the construction rule:
    /// destination is the frame's source, ack number is `seqno + 1`, routed
    /// to the ACK port when the source is a direct neighbor, else the data
    /// port (so it gets relayed like any other data-plane frame).
    async fn send_ack(&self, frame: &DataFrame) -> Result<(), NetError> {
        let Some(next_hop) = self.table.next_hop(frame.source) else {
            tracing::debug!(source = %frame.source, "cannot ack, no return route");
            return Ok(());
        };

        let ack = DataFrame::ack(frame.source, self.my_private, frame.seqno + 1);
        let direct_neighbor = self.table.metric(frame.source) == Some(1);
        let port = if direct_neighbor { ACK_PORT } else { DATA_PORT };

        self.data_socket.send_to(&ack.encode(), (next_hop.as_ipv4(), port)).await?;
        Ok(())
    }
}

/// Receiver state machine: `{Idle, Receiving, Done}`, collapsed into a
/// single mutable struct since the receiver/forwarder loop only ever tracks
/// one in-flight transfer destined for us at a time.
struct ReceivingState {
    expected_seqno: u32,
    remaining: u32,
    sink: Option<File>,
}

impl ReceivingState {
    fn new() -> Self {
        Self { expected_seqno: 0, remaining: 0, sink: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiving_state_starts_idle() {
        let state = ReceivingState::new();
        assert_eq!(state.expected_seqno, 0);
        assert_eq!(state.remaining, 0);
        assert!(state.sink.is_none());
    }
}
