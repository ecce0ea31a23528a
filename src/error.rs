//! Error types shared by the codec and the oracle adapters.

use std::fmt;

/// Failure to decode an encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The string ended in the middle of a value (continuation bit still set).
    Truncated { position: usize },
    /// A latitude delta was not followed by a longitude delta.
    MissingLongitude { position: usize },
    /// A byte outside the polyline alphabet (`?`..`~`).
    InvalidByte { position: usize, byte: u8 },
    /// The accumulated value no longer fits the coordinate range.
    Overflow { position: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { position } => {
                write!(f, "polyline truncated at byte {}", position)
            }
            DecodeError::MissingLongitude { position } => {
                write!(f, "polyline has a latitude without longitude at byte {}", position)
            }
            DecodeError::InvalidByte { position, byte } => {
                write!(f, "invalid polyline byte 0x{:02x} at {}", byte, position)
            }
            DecodeError::Overflow { position } => {
                write!(f, "polyline value overflows at byte {}", position)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Failure talking to an external routing, geocoding or roads service.
#[derive(Debug)]
pub enum OracleError {
    /// Transport failure, timeout or non-2xx status.
    Http(reqwest::Error),
    /// The response parsed but lacked the fields the caller needs.
    DataShape(String),
    /// The response carried a polyline that could not be decoded.
    Decode(DecodeError),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Http(err) => write!(f, "oracle request failed: {}", err),
            OracleError::DataShape(msg) => write!(f, "unexpected oracle response: {}", msg),
            OracleError::Decode(err) => write!(f, "oracle returned bad polyline: {}", err),
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OracleError::Http(err) => Some(err),
            OracleError::Decode(err) => Some(err),
            OracleError::DataShape(_) => None,
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Http(err)
    }
}

impl From<DecodeError> for OracleError {
    fn from(err: DecodeError) -> Self {
        OracleError::Decode(err)
    }
}
