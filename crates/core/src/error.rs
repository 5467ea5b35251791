//! Error types for scanning and codec operations.

use thiserror::Error;

/// Outcome of a scan that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The scan was cancelled before it produced every finding.
    ///
    /// This is never equivalent to an empty result.
    #[error("incompatible character scan was cancelled")]
    Cancelled,
}

/// Failures reported by a [`Codec`](crate::Codec).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unknown encoding label '{0}'")]
    UnknownLabel(String),

    /// The label names an encoding that cannot be written.
    #[error("encoding label '{0}' is decode-only and cannot be saved to")]
    Unsupported(String),

    /// The lossily encoded bytes could not be decoded again.
    ///
    /// A conforming codec never returns this from a round trip.
    #[error("{encoding} could not decode its own lossy output")]
    Undecodable { encoding: String },
}
