//! Platform adapters.
//!
//! Everything outside this module is host-testable pure logic; the
//! ESP-IDF glue lives here and is compiled only for the target.
//!
//! The status line needs no dedicated adapter: an `esp-idf-hal`
//! `PinDriver` in input mode implements `embedded_hal::digital::InputPin`
//! and plugs straight into
//! [`HalStatusLine`](crate::monitor::HalStatusLine).

#[cfg(target_os = "espidf")]
pub mod uart;
