//! Outbound ports (driven side - SPI)

use crate::domain::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Port: wall-clock source used to stamp blocks.
///
/// Production uses [`SystemTimeSource`]; tests substitute
/// [`ManualTimeSource`] to make block hashes reproducible.
pub trait TimeSource: Send + Sync {
    /// Current time in nanoseconds since the Unix epoch
    fn now(&self) -> Timestamp;
}

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic time source that advances by a fixed step on every read.
#[derive(Debug)]
pub struct ManualTimeSource {
    current: AtomicU64,
    step: u64,
}

impl ManualTimeSource {
    /// Start at `start` and advance by `step` nanoseconds per call
    pub fn new(start: Timestamp, step: u64) -> Self {
        Self {
            current: AtomicU64::new(start),
            step,
        }
    }

    /// Move the clock without reading it
    pub fn advance(&self, nanos: u64) {
        self.current.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.current.fetch_add(self.step, Ordering::SeqCst)
    }
}
