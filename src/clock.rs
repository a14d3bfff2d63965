//! Monotonic time source.
//!
//! Every wait in the driver (status polling, AT response wait, frame
//! accumulation) is a bounded poll loop comparing elapsed time against a
//! deadline — nothing sleeps. The clock is injected so tests can step time
//! deterministically without real delays.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` (microsecond
//!   precision, monotonic).
//! - **elsewhere** — uses `std::time::Instant`.

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since some fixed origin (boot or clock creation).
    fn now_ms(&self) -> u64;
}

/// A point in time after which an operation must give up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    end_ms: u64,
}

impl Deadline {
    /// Deadline `budget_ms` from now.
    pub fn after(clock: &impl Clock, budget_ms: u64) -> Self {
        Self {
            end_ms: clock.now_ms().saturating_add(budget_ms),
        }
    }

    /// Whether the deadline has passed.
    pub fn expired(&self, clock: &impl Clock) -> bool {
        clock.now_ms() >= self.end_ms
    }
}

/// Default clock for the current platform.
pub struct StdClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
