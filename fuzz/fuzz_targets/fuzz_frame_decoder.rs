//! Fuzz target: `FrameDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming frame decoder and
//! asserts that it never panics, never yields an oversized payload, and
//! accepts input cleanly again after a reset.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use btlink::frame::{FrameDecoder, MAX_PAYLOAD};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();

    for &byte in data {
        if let Ok(Some(payload)) = decoder.feed(byte) {
            assert!(payload.len() <= MAX_PAYLOAD, "payload exceeds MAX_PAYLOAD");
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    for &byte in data {
        let _ = decoder.feed(byte);
    }
});
