//! Paired-state classification from the module's status line.
//!
//! The HM-10 idles its state pin HIGH when paired and blinks it (low
//! phase every ~500 ms) when unpaired. A single instantaneous read
//! cannot tell "paired" from "unpaired, currently in the high phase",
//! so classification samples the pin at a fixed interval over a window
//! long enough to catch at least one low phase.
//!
//! The interval is enforced by elapsed-time comparison against the
//! injected clock — never by sleeping — so the routine stays
//! cooperative when embedded in a larger poll loop.

use crate::clock::Clock;
use crate::config::LinkConfig;
use log::debug;

/// Paired state of the radio module. Recomputed on demand, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Paired,
    Unpaired,
}

/// Boolean-valued digital input carrying the module's status signal.
pub trait StatusLine {
    /// Sample the line. `true` = high.
    fn is_high(&mut self) -> bool;
}

/// Adapter from any `embedded-hal` input pin to [`StatusLine`].
///
/// A pin read error is reported as low, which classifies the link as
/// unpaired — the conservative answer, since it keeps AT setup reachable.
pub struct HalStatusLine<P>(pub P);

impl<P: embedded_hal::digital::InputPin> StatusLine for HalStatusLine<P> {
    fn is_high(&mut self) -> bool {
        self.0.is_high().unwrap_or(false)
    }
}

/// Polls the status line and classifies the link state.
pub struct LinkStateMonitor {
    samples: u32,
    interval_ms: u64,
}

impl LinkStateMonitor {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            samples: config.status_samples,
            interval_ms: config.status_interval_ms,
        }
    }

    /// Classify the link state from a bounded sampling window.
    ///
    /// Any low sample returns [`LinkStatus::Unpaired`] immediately; the
    /// full window of high samples returns [`LinkStatus::Paired`]. Never
    /// runs longer than `samples * interval_ms`.
    pub fn poll(&self, line: &mut impl StatusLine, clock: &impl Clock) -> LinkStatus {
        let mut taken = 0u32;
        let mut prev_ms = clock.now_ms();

        while taken < self.samples {
            let elapsed = clock.now_ms().wrapping_sub(prev_ms);
            if elapsed >= self.interval_ms {
                if !line.is_high() {
                    debug!("status line low at sample {}: unpaired", taken + 1);
                    return LinkStatus::Unpaired;
                }
                prev_ms = clock.now_ms();
                taken += 1;
            }
        }

        debug!("status line high for {} samples: paired", self.samples);
        LinkStatus::Paired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Steps 1 ms per query so poll loops terminate deterministically.
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

    /// Replays a fixed sample sequence, then holds the last value.
    struct ScriptedLine {
        samples: Vec<bool>,
        next: usize,
    }

    impl ScriptedLine {
        fn new(samples: &[bool]) -> Self {
            Self {
                samples: samples.to_vec(),
                next: 0,
            }
        }

        fn samples_read(&self) -> usize {
            self.next
        }
    }

    impl StatusLine for ScriptedLine {
        fn is_high(&mut self) -> bool {
            let v = self.samples.get(self.next).copied().unwrap_or(true);
            self.next += 1;
            v
        }
    }

    fn monitor() -> LinkStateMonitor {
        LinkStateMonitor::new(&LinkConfig::default())
    }

    #[test]
    fn all_high_window_is_paired() {
        let clock = SteppingClock::new();
        let mut line = ScriptedLine::new(&[true; 10]);
        assert_eq!(monitor().poll(&mut line, &clock), LinkStatus::Paired);
        assert_eq!(line.samples_read(), 10);
    }

    #[test]
    fn single_low_sample_is_unpaired() {
        let clock = SteppingClock::new();
        let mut line = ScriptedLine::new(&[true, true, false, true, true]);
        assert_eq!(monitor().poll(&mut line, &clock), LinkStatus::Unpaired);
    }

    #[test]
    fn low_sample_short_circuits_the_window() {
        // [1,1,1,0,1,1,1,1,1,1] must classify unpaired at the 4th sample
        // without reading the rest of the window.
        let clock = SteppingClock::new();
        let mut line = ScriptedLine::new(&[
            true, true, true, false, true, true, true, true, true, true,
        ]);
        assert_eq!(monitor().poll(&mut line, &clock), LinkStatus::Unpaired);
        assert_eq!(line.samples_read(), 4);
    }

    #[test]
    fn poll_is_bounded_by_window_length() {
        let clock = SteppingClock::new();
        let start = clock.0.get();
        let mut line = ScriptedLine::new(&[true; 10]);
        monitor().poll(&mut line, &clock);
        let elapsed = clock.0.get() - start;
        // 10 samples x 100 ms, plus the clock queries themselves.
        assert!(elapsed <= 10 * 100 + 50, "poll ran too long: {elapsed} ms");
    }
}
