//! Link session — composition root.
//!
//! Owns the byte channel, the status line, the clock and the three
//! protocol components, replacing the per-board driver classes of the
//! original firmware with one role-parameterized type.
//!
//! ```text
//!  Idle ──configure()──▶ Configuring ──▶ Ready ⇄ (Sending | Receiving)
//!                (only while unpaired)
//! ```
//!
//! Configuration is best-effort: a failed or timed-out AT command is
//! logged and the sequence continues, and the session enters `Ready`
//! regardless. Transmission failures are returned to the caller, who
//! owns any retry policy.

use crate::channel::ByteChannel;
use crate::clock::Clock;
use crate::command::{CommandController, CommandOutcome, CommandRequest};
use crate::config::{LinkConfig, Role};
use crate::error::{Error, Result};
use crate::frame::{self, PacketFramer};
use crate::monitor::{LinkStateMonitor, LinkStatus, StatusLine};
use log::{info, warn};

/// Lifecycle state of a [`LinkSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, not yet configured.
    Idle,
    /// AT setup sequence in progress.
    Configuring,
    /// Configured (best-effort); payload transfer allowed.
    Ready,
    /// A send is in progress.
    Sending,
    /// A receive is in progress.
    Receiving,
}

/// One point-to-point link over one exclusively-owned byte channel.
pub struct LinkSession<C, S, K>
where
    C: ByteChannel,
    S: StatusLine,
    K: Clock,
{
    channel: C,
    status_line: S,
    clock: K,
    config: LinkConfig,
    monitor: LinkStateMonitor,
    controller: CommandController,
    framer: PacketFramer,
    state: SessionState,
}

impl<C, S, K> LinkSession<C, S, K>
where
    C: ByteChannel,
    S: StatusLine,
    K: Clock,
{
    pub fn new(channel: C, status_line: S, clock: K, config: LinkConfig) -> Self {
        let monitor = LinkStateMonitor::new(&config);
        let controller = CommandController::new(config.at_timeout_ms, config.at_settle_ms);
        let framer = PacketFramer::new(&config);
        Self {
            channel,
            status_line,
            clock,
            config,
            monitor,
            controller,
            framer,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Classify the current paired state from a fresh sampling window.
    pub fn link_status(&mut self) -> LinkStatus {
        self.monitor.poll(&mut self.status_line, &self.clock)
    }

    /// Run the AT setup sequence: role, name, and (master with a stored
    /// peer MAC) connect-to-peer.
    ///
    /// Only enters `Configuring` while the module is unpaired; a paired
    /// module skips setup entirely. Either way the session ends `Ready`.
    /// Returns the number of commands that succeeded.
    pub fn configure(&mut self) -> usize {
        let status = self.link_status();
        if status == LinkStatus::Paired {
            warn!("module already paired, skipping AT setup");
            self.state = SessionState::Ready;
            return 0;
        }

        self.state = SessionState::Configuring;
        info!(
            "configuring as {} ({})",
            self.config.role.label(),
            self.config.device_name
        );

        let mut requests = vec![
            CommandRequest::set_role(self.config.role),
            CommandRequest::set_name(&self.config.device_name),
        ];
        if self.config.role == Role::Master && !self.config.peer_mac.is_empty() {
            requests.push(CommandRequest::connect_peer(&self.config.peer_mac));
        }

        let mut succeeded = 0;
        for request in &requests {
            match self
                .controller
                .execute(&mut self.channel, &self.clock, status, request)
            {
                Ok(CommandOutcome::Success) => succeeded += 1,
                Ok(CommandOutcome::Failure(reply)) => {
                    warn!("setup command {} rejected: {reply:?}", request.command());
                }
                Ok(CommandOutcome::Timeout) => {
                    warn!("setup command {} timed out", request.command());
                }
                Err(e) => {
                    warn!("setup command {} failed: {e}", request.command());
                }
            }
        }

        info!(
            "setup finished: {succeeded}/{} commands ok, session ready",
            requests.len()
        );
        self.state = SessionState::Ready;
        succeeded
    }

    /// Frame `payload` and write it to the channel.
    ///
    /// Success means the channel write succeeded; delivery is only ever
    /// confirmed by the receiver's out-of-band acknowledgement, which
    /// this layer does not wait for.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.require_ready("send")?;
        self.state = SessionState::Sending;

        let result = frame::encode(payload).and_then(|bytes| self.channel.write_all(&bytes));

        self.state = SessionState::Ready;
        match &result {
            Ok(()) => info!("sent {} payload bytes", payload.len()),
            Err(e) => warn!("send failed: {e}"),
        }
        result
    }

    /// Read one framed payload from the channel.
    ///
    /// Blocks (poll-driven) until the framer yields a terminal result:
    /// a verified payload, or a malformed/timeout error for the caller
    /// to act on. The decision to request retransmission is the
    /// caller's.
    pub fn receive(&mut self) -> Result<Vec<u8>> {
        self.require_ready("receive")?;
        self.state = SessionState::Receiving;

        let result = self.framer.read_frame(&mut self.channel, &self.clock);

        self.state = SessionState::Ready;
        match &result {
            Ok(payload) => info!("received {} payload bytes", payload.len()),
            Err(e) => warn!("receive failed: {e}"),
        }
        result
    }

    fn require_ready(&self, op: &'static str) -> Result<()> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            warn!("{op} requires a configured session");
            Err(Error::IllegalState("session is not ready"))
        }
    }
}
