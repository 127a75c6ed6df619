//! Advertisement (control-plane) frame: a RIPv2-inspired header plus N route
//! records.
//!
//! Wire layout:
//!
//! ```text
//! Header (8 bytes):  [command, version=2, rover_id, 0, 0, address_family=2, 0, 0]
//! Record (16 bytes):  [ip(4), pad(3), mask(1), next_hop(4), pad(3), metric(1)]
//! ```
//!
//! `command`/`version`/`rover_id` live in the first three header bytes; the
//! rest of the header is reserved and written as zero. Record count is
//! derived from `(length - HEADER_LEN) / RECORD_LEN` on decode.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    error::{ProtocolError, Result},
    route::RouteRecord,
    PrivateAddress, PublicAddress,
};

const HEADER_LEN: usize = 8;
const RECORD_LEN: usize = 16;
const VERSION: u8 = 2;
const ADDRESS_FAMILY: u8 = 2;

/// Whether an advertisement asks for a reply (`Request`) or simply reports
/// the sender's table (`Update`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the recipient to send back its full table.
    Request,
    /// Unsolicited report of the sender's full table.
    Update,
}

impl Command {
    fn to_wire(self) -> u8 {
        match self {
            Self::Request => 1,
            Self::Update => 2,
        }
    }

    fn from_wire(byte: u8) -> Self {
        match byte {
            1 => Self::Request,
            // Any other value is treated as an update; unknown command bytes
            // are not rejected, only malformed lengths are.
            _ => Self::Update,
        }
    }
}

/// A decoded control-plane advertisement: who sent it and what it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementFrame {
    /// Request or update.
    pub command: Command,
    /// Source rover id, carried in header byte 2.
    pub rover_id: u8,
    /// The sender's route records.
    pub records: Vec<RouteRecord>,
}

impl AdvertisementFrame {
    /// Build a new advertisement frame.
    #[must_use]
    pub fn new(command: Command, rover_id: u8, records: Vec<RouteRecord>) -> Self {
        Self { command, rover_id, records }
    }

    /// Encode into wire bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.records.len() * RECORD_LEN);

        buf.put_u8(self.command.to_wire());
        buf.put_u8(VERSION);
        buf.put_u8(self.rover_id);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u8(ADDRESS_FAMILY);
        buf.put_u8(0);
        buf.put_u8(0);

        for record in &self.records {
            buf.put_slice(&record.destination.to_octets());
            buf.put_bytes(0, 3);
            buf.put_u8(record.mask);
            buf.put_slice(&record.next_hop.to_octets());
            buf.put_bytes(0, 3);
            buf.put_u8(record.metric.min(16));
        }

        buf.freeze()
    }

    /// Decode from wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedAdvertisement`] if `bytes.len()` is
    /// not `HEADER_LEN + n * RECORD_LEN` for some `n >= 0`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || (bytes.len() - HEADER_LEN) % RECORD_LEN != 0 {
            return Err(ProtocolError::MalformedAdvertisement { length: bytes.len() });
        }

        let mut buf = bytes;
        let command = Command::from_wire(buf.get_u8());
        let _version = buf.get_u8();
        let rover_id = buf.get_u8();
        let _reserved = buf.get_u16();
        let _address_family = buf.get_u8();
        let _reserved = buf.get_u16();

        let record_count = (bytes.len() - HEADER_LEN) / RECORD_LEN;
        let mut records = Vec::with_capacity(record_count);
        for _ in 0..record_count {
            let mut ip = [0u8; 4];
            buf.copy_to_slice(&mut ip);
            let _pad = buf.get_uint(3);
            let mask = buf.get_u8();
            let mut next_hop = [0u8; 4];
            buf.copy_to_slice(&mut next_hop);
            let _pad = buf.get_uint(3);
            let metric = buf.get_u8();

            records.push(RouteRecord {
                destination: PrivateAddress::from_octets(ip),
                mask,
                next_hop: PublicAddress::from_octets(next_hop),
                metric,
            });
        }

        Ok(Self { command, rover_id, records })
    }
}
