//! # Clock
//!
//! A frequency-gated timer for the processor's execute loop. The clock fires
//! when at least `1e9 / frequency` nanoseconds have elapsed since the last
//! fire. Gating is non-blocking: the caller busy-polls [`Clock::fire`],
//! trading CPU efficiency for timing precision.
//!
//! Frequency is validated to `[1, 1_000_000_000]` Hz at construction and on
//! [`Clock::set_frequency`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::ExecutionError;

const MAX_FREQUENCY_HZ: u64 = 1_000_000_000;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Sentinel for "never fired": the next poll fires unconditionally.
const NEVER: u64 = u64::MAX;

/// Monotonic-time gate firing at a configurable frequency.
///
/// Shareable across threads: the worker polls while a controller may change
/// the frequency.
pub struct Clock {
    /// Anchor for monotonic elapsed-nanosecond readings.
    epoch: Instant,
    /// Period between fires, in nanoseconds.
    period_ns: AtomicU64,
    /// Elapsed-nanosecond timestamp of the last fire.
    last_fire: AtomicU64,
    frequency: AtomicU64,
}

impl Clock {
    /// Creates a clock firing `hz` times per second.
    pub fn new(hz: u64) -> Result<Self, ExecutionError> {
        Self::check_frequency(hz)?;
        Ok(Self {
            epoch: Instant::now(),
            period_ns: AtomicU64::new(NANOS_PER_SECOND / hz),
            last_fire: AtomicU64::new(NEVER),
            frequency: AtomicU64::new(hz),
        })
    }

    fn check_frequency(hz: u64) -> Result<(), ExecutionError> {
        if (1..=MAX_FREQUENCY_HZ).contains(&hz) {
            Ok(())
        } else {
            Err(ExecutionError::InvalidFrequency { hz })
        }
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> u64 {
        self.frequency.load(Ordering::SeqCst)
    }

    /// Changes the frequency, validated to `[1, 1_000_000_000]` Hz.
    pub fn set_frequency(&self, hz: u64) -> Result<(), ExecutionError> {
        Self::check_frequency(hz)?;
        self.frequency.store(hz, Ordering::SeqCst);
        self.period_ns.store(NANOS_PER_SECOND / hz, Ordering::SeqCst);
        Ok(())
    }

    /// Returns true once per period; non-blocking.
    ///
    /// Callers poll this in a loop and execute one instruction per `true`.
    pub fn fire(&self) -> bool {
        let now = self.epoch.elapsed().as_nanos() as u64;
        let last = self.last_fire.load(Ordering::SeqCst);
        if last == NEVER || now.saturating_sub(last) >= self.period_ns.load(Ordering::SeqCst) {
            self.last_fire.store(now, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Resets the gate so the next poll fires immediately.
    pub fn restart(&self) {
        self.last_fire.store(NEVER, Ordering::SeqCst);
    }
}
