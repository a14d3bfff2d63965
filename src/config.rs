//! Link configuration parameters.
//!
//! All tunables for one link session, folded into a single immutable value
//! passed at construction. Values can be overridden by the integrator
//! (e.g. loaded from NVS or a provisioning channel).

use serde::{Deserialize, Serialize};

/// Which end of the link this module plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Initiates pairing (`AT+ROLE1`), connects to the stored peer MAC.
    Master,
    /// Waits to be paired (`AT+ROLE0`).
    Slave,
}

impl Role {
    /// Digit used in the `AT+ROLE` command.
    pub const fn at_digit(self) -> char {
        match self {
            Self::Master => '1',
            Self::Slave => '0',
        }
    }

    /// Human-readable label for log lines.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Slave => "slave",
        }
    }
}

/// Core link session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    // --- Identity ---
    /// Role this module takes during AT setup.
    pub role: Role,
    /// Advertised device name (`AT+NAME`).
    pub device_name: String,
    /// Peer MAC address for master-side `AT+CON`. Empty = don't connect.
    pub peer_mac: String,

    // --- Status polling ---
    /// Number of status-line samples per classification window.
    pub status_samples: u32,
    /// Interval between status-line samples (milliseconds).
    pub status_interval_ms: u64,

    // --- AT commands ---
    /// How long to wait for the first byte of an AT reply (milliseconds).
    pub at_timeout_ms: u64,
    /// Settle delay after the first reply byte, letting the module finish
    /// transmitting before the reply is drained (milliseconds).
    pub at_settle_ms: u64,

    // --- Framing ---
    /// Give up searching for a start marker after this long with no new
    /// byte (milliseconds).
    pub frame_start_timeout_ms: u64,
    /// Maximum time between a start marker and its end marker
    /// (milliseconds).
    pub frame_accum_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            // Identity
            role: Role::Slave,
            device_name: String::from("UnoComms"),
            peer_mac: String::new(),

            // Status polling: 10 samples x 100 ms covers at least one low
            // phase of the HM-10's 500 ms unpaired blink.
            status_samples: 10,
            status_interval_ms: 100,

            // AT commands
            at_timeout_ms: 2000,
            at_settle_ms: 150,

            // Framing
            frame_start_timeout_ms: 3000,
            frame_accum_timeout_ms: 3000,
        }
    }
}
