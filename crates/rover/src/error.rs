//! Top-level binary error type.

use std::fmt;

use rover_net::NetError;

/// Errors that can occur while running the `rover` binary.
#[derive(Debug)]
pub enum RoverError {
    /// Invalid CLI configuration (bad address, missing required pairing of
    /// `--send-file`/`--dest`, etc.). Fatal, fix configuration and restart.
    Config(String),

    /// Socket or filesystem failure from the control or data plane.
    Net(NetError),
}

impl fmt::Display for RoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Net(err) => write!(f, "network error: {err}"),
        }
    }
}

impl std::error::Error for RoverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Net(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<NetError> for RoverError {
    fn from(err: NetError) -> Self {
        Self::Net(err)
    }
}

impl From<std::io::Error> for RoverError {
    fn from(err: std::io::Error) -> Self {
        Self::Net(NetError::Fatal(err))
    }
}
