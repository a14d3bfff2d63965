//! Synchronous AT command execution with timeout and reply validation.
//!
//! The HM-10 is configured over the same serial stream that later carries
//! payload frames. A command is only legal while the module is unpaired;
//! a paired module interprets the bytes as payload and forwards them to
//! the peer, so the gate is enforced here before any I/O.
//!
//! Replies are validated against a set of required substrings — ALL must
//! be present, in any order (e.g. `AT+ROLE1` succeeds on any reply
//! containing "OK", "Set" and "1").

use crate::channel::ByteChannel;
use crate::clock::{Clock, Deadline};
use crate::config::Role;
use crate::error::{Error, Result};
use crate::monitor::LinkStatus;
use log::{info, warn};

/// One textual configuration command plus its success criteria.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    command: String,
    success_flags: Vec<String>,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, success_flags: &[&str]) -> Self {
        Self {
            command: command.into(),
            success_flags: success_flags.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// `AT+ROLE{0|1}` — make the module a master or slave.
    pub fn set_role(role: Role) -> Self {
        let digit = role.at_digit();
        Self {
            command: format!("AT+ROLE{digit}"),
            success_flags: vec!["OK".into(), "Set".into(), digit.to_string()],
        }
    }

    /// `AT+NAME{name}` — set the advertised device name.
    pub fn set_name(name: &str) -> Self {
        Self {
            command: format!("AT+NAME{name}"),
            success_flags: vec!["OK".into(), "Set".into(), name.to_string()],
        }
    }

    /// `AT+CON{mac}` — connect to the stored peer MAC (master only).
    /// The module only echoes "OK" here; the actual connection result
    /// shows up later on the status line.
    pub fn connect_peer(mac: &str) -> Self {
        Self {
            command: format!("AT+CON{mac}"),
            success_flags: vec!["OK".into()],
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Terminal result of one command execution. Never retried automatically;
/// retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Reply contained every required substring.
    Success,
    /// Reply arrived but is missing at least one required substring.
    /// Carries the raw reply for diagnostics.
    Failure(String),
    /// No reply byte within the deadline.
    Timeout,
}

/// Issues AT commands and validates their replies.
pub struct CommandController {
    timeout_ms: u64,
    settle_ms: u64,
}

impl CommandController {
    pub fn new(timeout_ms: u64, settle_ms: u64) -> Self {
        Self {
            timeout_ms,
            settle_ms,
        }
    }

    /// Execute one command and classify the reply.
    ///
    /// `status` is the caller's current link classification; a paired
    /// module rejects with [`Error::IllegalState`] before any channel I/O.
    pub fn execute(
        &self,
        channel: &mut impl ByteChannel,
        clock: &impl Clock,
        status: LinkStatus,
        request: &CommandRequest,
    ) -> Result<CommandOutcome> {
        if status == LinkStatus::Paired {
            warn!("module is paired, refusing AT command {}", request.command);
            return Err(Error::IllegalState(
                "AT commands require an unpaired module",
            ));
        }

        channel.write_all(request.command.as_bytes())?;

        // Poll for the first reply byte.
        let deadline = Deadline::after(clock, self.timeout_ms);
        while !channel.available() {
            if deadline.expired(clock) {
                warn!("command timeout: {}", request.command);
                return Ok(CommandOutcome::Timeout);
            }
        }

        // Hold a settle window so the module finishes transmitting the
        // full reply before it is drained.
        let settle = Deadline::after(clock, self.settle_ms);
        while !settle.expired(clock) {}

        let mut reply = String::new();
        while channel.available() {
            if let Some(byte) = channel.read_byte()? {
                reply.push(char::from(byte));
            }
        }

        let matched = request
            .success_flags
            .iter()
            .all(|flag| reply.contains(flag.as_str()));

        if matched {
            info!("command ok: {}", request.command);
            Ok(CommandOutcome::Success)
        } else {
            warn!("command reply missing flags: {} -> {:?}", request.command, reply);
            Ok(CommandOutcome::Failure(reply))
        }
    }
}
