//! Marker-delimited, CRC-checked packet framing.
//!
//! Wire format:
//! ```text
//! ┌───────┬───────────────┬───────┬──────────────────┬───────┐
//! │ '<'   │ payload (N B) │ '%'   │ CRC-32, 8 hex    │ '>'   │
//! │ start │               │ sep   │ ASCII digits     │ end   │
//! └───────┴───────────────┴───────┴──────────────────┴───────┘
//! ```
//!
//! The CRC-32 (ISO-HDLC polynomial) is computed over the raw payload and
//! transmitted as a fixed-width field of 8 uppercase hex digits. Hex
//! digits can never collide with a marker byte, so the end-marker scan
//! cannot truncate the checksum field.
//!
//! Payloads must not contain any marker byte; [`encode`] rejects them.
//! Escaping is deliberately not implemented — the integrator either
//! pre-encodes binary payloads (hex/base64) or restricts them to
//! marker-free text.
//!
//! The decoder is an incremental state machine fed one byte at a time,
//! which handles partial, delayed or garbage input gracefully. A stream
//! that opens a frame and never closes it is bounded both by the
//! accumulation byte cap and by the pull loop's accumulation deadline.

use crate::channel::ByteChannel;
use crate::clock::{Clock, Deadline};
use crate::config::LinkConfig;
use crate::error::{FrameError, Result};
use crc::{CRC_32_ISO_HDLC, Crc};
use log::{debug, warn};

/// Start-of-frame marker.
pub const MARKER_START: u8 = b'<';
/// End-of-frame marker.
pub const MARKER_END: u8 = b'>';
/// Separator between payload and checksum field.
pub const MARKER_SEP: u8 = b'%';
/// Courtesy acknowledgement byte, written after a verified frame.
/// Fire-and-forget: the sender never waits for it.
pub const ACK: u8 = 0x06;

/// Maximum payload bytes per frame.
pub const MAX_PAYLOAD: usize = 512;

/// Checksum field width (CRC-32 as hex digits).
const CRC_HEX_LEN: usize = 8;

/// Accumulation cap: payload + separator + checksum field.
const MAX_BODY: usize = MAX_PAYLOAD + 1 + CRC_HEX_LEN;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Whether `byte` is one of the reserved marker values.
pub const fn is_marker(byte: u8) -> bool {
    matches!(byte, MARKER_START | MARKER_END | MARKER_SEP)
}

/// Encode `payload` into a complete frame.
///
/// Rejects payloads containing a reserved marker byte or exceeding
/// [`MAX_PAYLOAD`].
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge.into());
    }
    if payload.iter().copied().any(is_marker) {
        return Err(FrameError::MarkerInPayload.into());
    }

    let crc = CRC32.checksum(payload);
    let mut out = Vec::with_capacity(payload.len() + 3 + CRC_HEX_LEN);
    out.push(MARKER_START);
    out.extend_from_slice(payload);
    out.push(MARKER_SEP);
    out.extend_from_slice(format!("{crc:08X}").as_bytes());
    out.push(MARKER_END);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Incremental decoder
// ---------------------------------------------------------------------------

/// Decoder state machine.
enum DecoderState {
    /// Discarding bytes until a start marker.
    Seeking,
    /// Start marker seen, collecting body bytes until the end marker.
    Accumulating,
}

/// Streaming frame decoder.
///
/// Feed bytes one at a time; a complete, checksum-verified payload is
/// returned when the end marker arrives. Malformed frames reset the
/// decoder back to marker search, so a corrupt frame never poisons the
/// next one.
pub struct FrameDecoder {
    state: DecoderState,
    body: heapless::Vec<u8, MAX_BODY>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Seeking,
            body: heapless::Vec::new(),
        }
    }

    /// Whether a start marker has been seen and the body is filling.
    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, DecoderState::Accumulating)
    }

    /// Drop any partial frame and return to marker search.
    pub fn reset(&mut self) {
        self.state = DecoderState::Seeking;
        self.body.clear();
    }

    /// Feed one byte.
    ///
    /// Returns `Ok(Some(payload))` when a verified frame completes,
    /// `Ok(None)` while incomplete, and `Err` for a malformed frame
    /// (after which the decoder has already resynchronized).
    pub fn feed(&mut self, byte: u8) -> core::result::Result<Option<Vec<u8>>, FrameError> {
        match self.state {
            DecoderState::Seeking => {
                if byte == MARKER_START {
                    self.body.clear();
                    self.state = DecoderState::Accumulating;
                }
                Ok(None)
            }
            DecoderState::Accumulating => match byte {
                // A fresh start marker mid-frame means the previous frame
                // was cut short; resynchronize on the new one.
                MARKER_START => {
                    debug!("start marker inside frame, resyncing");
                    self.body.clear();
                    Ok(None)
                }
                MARKER_END => {
                    let result = Self::finalize(&self.body);
                    self.reset();
                    result.map(Some)
                }
                other => {
                    if self.body.push(other).is_err() {
                        self.reset();
                        return Err(FrameError::Overrun);
                    }
                    Ok(None)
                }
            },
        }
    }

    /// Split body into payload and checksum field, verify the CRC.
    fn finalize(body: &[u8]) -> core::result::Result<Vec<u8>, FrameError> {
        let sep = body
            .iter()
            .rposition(|&b| b == MARKER_SEP)
            .ok_or(FrameError::MissingSeparator)?;
        let (payload, field) = (&body[..sep], &body[sep + 1..]);

        if field.len() != CRC_HEX_LEN {
            return Err(FrameError::BadChecksumField);
        }
        let text = core::str::from_utf8(field).map_err(|_| FrameError::BadChecksumField)?;
        let received = u32::from_str_radix(text, 16).map_err(|_| FrameError::BadChecksumField)?;

        let computed = CRC32.checksum(payload);
        if computed != received {
            warn!(
                "checksum mismatch: computed {computed:08X}, received {received:08X}"
            );
            return Err(FrameError::ChecksumMismatch);
        }
        Ok(payload.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Pull-side framer
// ---------------------------------------------------------------------------

/// Drives the decoder from a byte channel under deadline control.
pub struct PacketFramer {
    decoder: FrameDecoder,
    start_timeout_ms: u64,
    accum_timeout_ms: u64,
}

impl PacketFramer {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            start_timeout_ms: config.frame_start_timeout_ms,
            accum_timeout_ms: config.frame_accum_timeout_ms,
        }
    }

    /// Read one frame from the channel.
    ///
    /// Discards bytes until a start marker; gives up with
    /// [`FrameError::StartTimeout`] after `frame_start_timeout_ms` with no
    /// new byte. Once a frame opens, the end marker must arrive within
    /// `frame_accum_timeout_ms` or the partial frame is dropped with
    /// [`FrameError::AccumulationTimeout`].
    ///
    /// On a verified frame a single [`ACK`] byte is written back on the
    /// channel, fire-and-forget.
    pub fn read_frame(
        &mut self,
        channel: &mut impl ByteChannel,
        clock: &impl Clock,
    ) -> Result<Vec<u8>> {
        self.decoder.reset();
        let mut last_byte_ms = clock.now_ms();
        let mut accum_deadline: Option<Deadline> = None;

        loop {
            if let Some(deadline) = accum_deadline {
                if deadline.expired(clock) {
                    self.decoder.reset();
                    return Err(FrameError::AccumulationTimeout.into());
                }
            }

            if !channel.available() {
                if accum_deadline.is_none()
                    && clock.now_ms().wrapping_sub(last_byte_ms) >= self.start_timeout_ms
                {
                    return Err(FrameError::StartTimeout.into());
                }
                continue;
            }

            let Some(byte) = channel.read_byte()? else {
                continue;
            };
            last_byte_ms = clock.now_ms();

            match self.decoder.feed(byte) {
                Ok(Some(payload)) => {
                    if channel.write_all(&[ACK]).is_err() {
                        warn!("ack write failed, ignoring");
                    }
                    return Ok(payload);
                }
                Ok(None) => {
                    if self.decoder.is_accumulating() && accum_deadline.is_none() {
                        accum_deadline = Some(Deadline::after(clock, self.accum_timeout_ms));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use core::cell::Cell;
    use std::collections::VecDeque;

    struct SteppingClock(Cell<u64>);

    impl SteppingClock {
        fn new() -> Self {
            Self(Cell::new(0))
        }
    }

    impl Clock for SteppingClock {
        fn now_ms(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }
    }

    struct ScriptChannel {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl ScriptChannel {
        fn with_bytes(bytes: &[u8]) -> Self {
            Self {
                rx: bytes.iter().copied().collect(),
                tx: Vec::new(),
            }
        }
    }

    impl ByteChannel for ScriptChannel {
        fn available(&self) -> bool {
            !self.rx.is_empty()
        }

        fn read_byte(&mut self) -> Result<Option<u8>> {
            Ok(self.rx.pop_front())
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
            self.tx.extend_from_slice(bytes);
            Ok(())
        }
    }

    fn decode_all(bytes: &[u8]) -> core::result::Result<Option<Vec<u8>>, FrameError> {
        let mut decoder = FrameDecoder::new();
        for &b in bytes {
            match decoder.feed(b) {
                Ok(Some(p)) => return Ok(Some(p)),
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    #[test]
    fn encode_decode_roundtrip() {
        let frame = encode(b"hello").unwrap();
        assert_eq!(frame[0], MARKER_START);
        assert_eq!(*frame.last().unwrap(), MARKER_END);
        assert_eq!(decode_all(&frame).unwrap().unwrap(), b"hello");
    }

    #[test]
    fn empty_payload_roundtrips() {
        let frame = encode(b"").unwrap();
        assert_eq!(decode_all(&frame).unwrap().unwrap(), b"");
    }

    #[test]
    fn marker_bytes_in_payload_are_rejected() {
        for payload in [&b"a<b"[..], b"a>b", b"a%b"] {
            assert_eq!(
                encode(payload).unwrap_err(),
                Error::Frame(FrameError::MarkerInPayload)
            );
        }
    }

    #[test]
    fn oversize_payload_is_rejected() {
        let payload = vec![b'x'; MAX_PAYLOAD + 1];
        assert_eq!(
            encode(&payload).unwrap_err(),
            Error::Frame(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn corrupted_crc_is_detected() {
        let mut frame = encode(b"hello").unwrap();
        // Flip one hex digit of the CRC field (second-to-last byte).
        let idx = frame.len() - 2;
        frame[idx] = if frame[idx] == b'0' { b'1' } else { b'0' };
        assert_eq!(decode_all(&frame).unwrap_err(), FrameError::ChecksumMismatch);
    }

    #[test]
    fn corrupted_payload_is_detected() {
        let mut frame = encode(b"hello").unwrap();
        frame[2] ^= 0x01; // inside the payload
        assert_eq!(decode_all(&frame).unwrap_err(), FrameError::ChecksumMismatch);
    }

    #[test]
    fn garbage_before_frame_is_discarded() {
        let mut bytes = b"noise!!".to_vec();
        bytes.extend_from_slice(&encode(b"payload").unwrap());
        assert_eq!(decode_all(&bytes).unwrap().unwrap(), b"payload");
    }

    #[test]
    fn decoder_recovers_after_malformed_frame() {
        let mut decoder = FrameDecoder::new();
        for &b in b"<junk>" {
            let _ = decoder.feed(b); // missing separator -> error, resync
        }
        let frame = encode(b"next").unwrap();
        let mut out = None;
        for &b in &frame {
            if let Ok(Some(p)) = decoder.feed(b) {
                out = Some(p);
            }
        }
        assert_eq!(out.unwrap(), b"next");
    }

    #[test]
    fn truncated_frame_resyncs_on_next_start() {
        let mut bytes = b"<partial".to_vec();
        bytes.extend_from_slice(&encode(b"whole").unwrap());
        assert_eq!(decode_all(&bytes).unwrap().unwrap(), b"whole");
    }

    #[test]
    fn missing_separator_is_malformed() {
        assert_eq!(
            decode_all(b"<AABBCCDD>").unwrap_err(),
            FrameError::MissingSeparator
        );
    }

    #[test]
    fn short_checksum_field_is_malformed() {
        assert_eq!(
            decode_all(b"<data%AB12>").unwrap_err(),
            FrameError::BadChecksumField
        );
    }

    #[test]
    fn unterminated_frame_hits_the_byte_cap() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(MARKER_START), Ok(None));
        let mut result = Ok(None);
        for _ in 0..=MAX_BODY {
            result = decoder.feed(b'x');
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result.unwrap_err(), FrameError::Overrun);
        assert!(!decoder.is_accumulating());
    }

    #[test]
    fn read_frame_acks_verified_frames() {
        let clock = SteppingClock::new();
        let mut ch = ScriptChannel::with_bytes(&encode(b"data").unwrap());
        let mut framer = PacketFramer::new(&LinkConfig::default());

        let payload = framer.read_frame(&mut ch, &clock).unwrap();
        assert_eq!(payload, b"data");
        assert_eq!(ch.tx, [ACK]);
    }

    #[test]
    fn silent_channel_times_out_searching_for_start() {
        let clock = SteppingClock::new();
        let mut ch = ScriptChannel::with_bytes(&[]);
        let mut framer = PacketFramer::new(&LinkConfig::default());

        let err = framer.read_frame(&mut ch, &clock).unwrap_err();
        assert_eq!(err, Error::Frame(FrameError::StartTimeout));
        assert!(clock.0.get() >= 3000, "gave up early at {} ms", clock.0.get());
    }

    #[test]
    fn open_frame_with_no_end_marker_times_out() {
        let clock = SteppingClock::new();
        let mut ch = ScriptChannel::with_bytes(b"<started-but-never-finished");
        let mut framer = PacketFramer::new(&LinkConfig::default());

        let err = framer.read_frame(&mut ch, &clock).unwrap_err();
        assert_eq!(err, Error::Frame(FrameError::AccumulationTimeout));
    }

    #[test]
    fn crc_field_is_fixed_width_hex() {
        // A payload whose CRC has leading zero nibbles must still emit
        // exactly 8 hex digits.
        let frame = encode(b"9").unwrap();
        let body = &frame[1..frame.len() - 1];
        let sep = body.iter().rposition(|&b| b == MARKER_SEP).unwrap();
        let field = &body[sep + 1..];
        assert_eq!(field.len(), 8);
        assert!(field.iter().all(u8::is_ascii_hexdigit));
    }
}
