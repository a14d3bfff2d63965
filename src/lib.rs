//! HM-10 BLE transparent-UART link driver.
//!
//! Drives a point-to-point serial link between two peer devices through
//! an HM-10-style BLE module:
//!
//! - [`monitor`] — classifies the module's blinking status line as
//!   paired/unpaired over a bounded sampling window.
//! - [`command`] — synchronous AT command setup with timeout and
//!   substring success criteria.
//! - [`frame`] — marker-delimited, CRC-32-checked packet framing over
//!   the raw byte stream.
//! - [`session`] — composition root tying channel, monitor, commands
//!   and framing into one role-parameterized link session.
//!
//! All waiting is deadline-based polling against an injected [`clock`],
//! so the whole crate tests deterministically on the host. ESP-IDF glue
//! is confined to [`adapters`].

#![deny(unused_must_use)]

pub mod channel;
pub mod clock;
pub mod command;
pub mod config;
pub mod frame;
pub mod monitor;
pub mod session;

pub mod adapters;
mod error;

pub use error::{Error, FrameError, Result};
