//! Unified error types for the link driver.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! caller's error handling uniform. No variant is fatal to the session:
//! timeouts, validation failures and corrupt frames are all surfaced as
//! values and the session stays usable.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No response (or no frame terminator) arrived within the deadline.
    Timeout,
    /// A frame could not be encoded or decoded.
    Frame(FrameError),
    /// Operation rejected before any I/O (e.g. AT command while paired).
    IllegalState(&'static str),
    /// The underlying byte channel reported an I/O failure.
    Channel(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::IllegalState(msg) => write!(f, "illegal state: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Framing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Outgoing payload contains a reserved marker byte.
    MarkerInPayload,
    /// Outgoing payload exceeds the maximum frame payload size.
    PayloadTooLarge,
    /// No start marker observed before the read timeout elapsed.
    StartTimeout,
    /// A frame began but its end marker never arrived in time.
    AccumulationTimeout,
    /// A frame began but grew past the accumulation byte cap.
    Overrun,
    /// Frame ended without a payload/checksum separator.
    MissingSeparator,
    /// The checksum field is not 8 hex digits.
    BadChecksumField,
    /// Recomputed CRC-32 does not match the received checksum.
    ChecksumMismatch,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerInPayload => write!(f, "payload contains reserved marker byte"),
            Self::PayloadTooLarge => write!(f, "payload exceeds maximum frame size"),
            Self::StartTimeout => write!(f, "no start marker before timeout"),
            Self::AccumulationTimeout => write!(f, "frame unterminated before timeout"),
            Self::Overrun => write!(f, "frame exceeds accumulation cap"),
            Self::MissingSeparator => write!(f, "missing checksum separator"),
            Self::BadChecksumField => write!(f, "malformed checksum field"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
