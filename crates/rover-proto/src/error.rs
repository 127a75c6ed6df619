//! Wire codec errors.

use thiserror::Error;

/// Errors that can occur while decoding a frame off the wire.
///
/// All variants are recoverable from the caller's perspective: the offending
/// datagram is discarded and logged, the task that received it keeps running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// An advertisement frame's length is not `8 + 16 * n` for any `n`.
    #[error("malformed advertisement frame: length {length} is not a valid header+records size")]
    MalformedAdvertisement {
        /// Length of the buffer that was rejected.
        length: usize,
    },

    /// A data frame's buffer is shorter than the fixed 21-byte header.
    #[error("malformed data frame: length {length} is shorter than the {expected}-byte header")]
    MalformedDataFrame {
        /// Length of the buffer that was rejected.
        length: usize,
        /// Minimum length a data frame header requires.
        expected: usize,
    },

    /// A data frame did not have exactly one of {SYN, NORMAL, ACK} set.
    #[error("malformed data frame: flags byte {flags:#04x} does not set exactly one of SYN/NORMAL/ACK")]
    InvalidFlags {
        /// The raw flags byte that was rejected.
        flags: u8,
    },
}

/// Convenience alias for results returned by the codec layer.
pub type Result<T> = std::result::Result<T, ProtocolError>;
