//! Byte channel abstraction — any duplex serial stream.
//!
//! Concrete implementations:
//! - UART to the radio module (ESP-IDF, see [`crate::adapters`])
//! - in-memory scripted channels for host tests
//!
//! The monitor, command controller and framer are generic over
//! `ByteChannel`, so porting to a new serial backend requires zero
//! changes to the protocol logic.

use crate::error::Result;

/// Duplex byte stream with a non-blocking availability query.
///
/// A session owns exactly one channel; no concurrent readers or writers
/// are supported.
pub trait ByteChannel {
    /// Whether at least one byte can be read without blocking.
    fn available(&self) -> bool;

    /// Read a single byte. Returns `Ok(None)` if nothing is buffered.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Write all of `bytes` to the channel.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

/// A null channel that discards all writes and never reads.
/// Useful as a stand-in before a real port is opened.
pub struct NullChannel;

impl ByteChannel for NullChannel {
    fn available(&self) -> bool {
        false
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(None)
    }

    fn write_all(&mut self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}
