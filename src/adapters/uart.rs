//! UART byte channel for the HM-10 module (ESP-IDF).
//!
//! Wraps an `esp-idf-hal` UART driver in the [`ByteChannel`] trait.
//! Reads are non-blocking: the driver's RX FIFO query backs
//! `available()`, and `read_byte` asks for a single byte with a zero
//! tick timeout.

use crate::channel::ByteChannel;
use crate::error::{Error, Result};
use esp_idf_hal::uart::UartDriver;
use log::warn;

pub struct UartChannel<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartChannel<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }

    /// Release the underlying driver.
    pub fn into_inner(self) -> UartDriver<'d> {
        self.uart
    }
}

impl ByteChannel for UartChannel<'_> {
    fn available(&self) -> bool {
        match self.uart.remaining_read() {
            Ok(n) => n > 0,
            Err(e) => {
                warn!("uart rx query failed: {e}");
                false
            }
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.uart.read(&mut buf, 0) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(_) => Err(Error::Channel("uart read failed")),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let written = self
                .uart
                .write(remaining)
                .map_err(|_| Error::Channel("uart write failed"))?;
            remaining = &remaining[written..];
        }
        Ok(())
    }
}
