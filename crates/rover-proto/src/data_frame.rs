//! Data-plane frame: the stop-and-wait transport's wire format.
//!
//! Wire layout, all multi-byte fields big-endian:
//!
//! ```text
//! destination (4) | source (4) | seqno (4) | ackno (4) | flags (1) | total_size (4) | payload (..)
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    address::{PrivateAddress, PublicAddress},
    error::{ProtocolError, Result},
};

/// Size of the fixed data-frame header, in bytes.
pub const HEADER_LEN: usize = 21;

/// SYN: first frame of a transfer, carries `total_size`.
pub const FLAG_SYN: u8 = 0b0000_0001;
/// NORMAL: a data-bearing frame after the SYN.
pub const FLAG_NORMAL: u8 = 0b0000_0010;
/// ACK: acknowledgement, never carries a payload.
pub const FLAG_ACK: u8 = 0b0000_0100;

/// Which of {SYN, NORMAL, ACK} a data frame carries. Exactly one is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFlag {
    /// First frame of a transfer.
    Syn,
    /// Subsequent data-bearing frame.
    Normal,
    /// Acknowledgement frame.
    Ack,
}

impl DataFlag {
    fn to_wire(self) -> u8 {
        match self {
            Self::Syn => FLAG_SYN,
            Self::Normal => FLAG_NORMAL,
            Self::Ack => FLAG_ACK,
        }
    }

    fn from_wire(byte: u8) -> Result<Self> {
        match byte {
            FLAG_SYN => Ok(Self::Syn),
            FLAG_NORMAL => Ok(Self::Normal),
            FLAG_ACK => Ok(Self::Ack),
            other => Err(ProtocolError::InvalidFlags { flags: other }),
        }
    }
}

/// A decoded data-plane frame.
///
/// # Invariants
///
/// - `payload` is empty iff `flag` is [`DataFlag::Ack`].
/// - `total_size` is only meaningful when `flag` is [`DataFlag::Syn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Destination private address.
    pub destination: PrivateAddress,
    /// Source private address (the transfer's originator, not necessarily the
    /// sender of this particular unicast datagram across a relay hop).
    pub source: PrivateAddress,
    /// Sequence number (meaningful on SYN/NORMAL).
    pub seqno: u32,
    /// Acknowledgement number (meaningful on ACK).
    pub ackno: u32,
    /// Which of SYN/NORMAL/ACK this frame is.
    pub flag: DataFlag,
    /// Total file size in bytes; only meaningful when `flag` is `Syn`.
    pub total_size: u32,
    /// Payload bytes; empty on ACK frames.
    pub payload: Bytes,
}

impl DataFrame {
    /// Build a SYN frame carrying the first chunk of a transfer.
    #[must_use]
    pub fn syn(
        destination: PrivateAddress,
        source: PrivateAddress,
        total_size: u32,
        payload: Bytes,
    ) -> Self {
        Self { destination, source, seqno: 0, ackno: 0, flag: DataFlag::Syn, total_size, payload }
    }

    /// Build a NORMAL frame carrying a subsequent chunk.
    #[must_use]
    pub fn normal(
        destination: PrivateAddress,
        source: PrivateAddress,
        seqno: u32,
        payload: Bytes,
    ) -> Self {
        Self { destination, source, seqno, ackno: 0, flag: DataFlag::Normal, total_size: 0, payload }
    }

    /// Build an ACK frame for `ack_number`.
    #[must_use]
    pub fn ack(destination: PrivateAddress, source: PrivateAddress, ack_number: u32) -> Self {
        Self {
            destination,
            source,
            seqno: 0,
            ackno: ack_number,
            flag: DataFlag::Ack,
            total_size: 0,
            payload: Bytes::new(),
        }
    }

    /// Whether this is an ACK frame.
    #[must_use]
    pub fn is_ack(&self) -> bool {
        matches!(self.flag, DataFlag::Ack)
    }

    /// Encode into wire bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        buf.put_slice(&self.destination.to_octets());
        buf.put_slice(&self.source.to_octets());
        buf.put_u32(self.seqno);
        buf.put_u32(self.ackno);
        buf.put_u8(self.flag.to_wire());
        buf.put_u32(self.total_size);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decode from wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedDataFrame`] if shorter than
    /// [`HEADER_LEN`], or [`ProtocolError::InvalidFlags`] if the flags byte is
    /// not exactly one of SYN/NORMAL/ACK.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::MalformedDataFrame { length: bytes.len(), expected: HEADER_LEN });
        }

        let mut buf = bytes;
        let mut dest = [0u8; 4];
        buf.copy_to_slice(&mut dest);
        let mut src = [0u8; 4];
        buf.copy_to_slice(&mut src);
        let seqno = buf.get_u32();
        let ackno = buf.get_u32();
        let flag = DataFlag::from_wire(buf.get_u8())?;
        let total_size = buf.get_u32();
        let payload = Bytes::copy_from_slice(buf);

        Ok(Self {
            destination: PrivateAddress::from_octets(dest),
            source: PrivateAddress::from_octets(src),
            seqno,
            ackno,
            flag,
            total_size,
            payload,
        })
    }
}

/// Public address wrapper re-export so callers of this module don't need a
/// separate `use` for the next-hop type when building ACK/forward logic.
pub type NextHop = PublicAddress;
