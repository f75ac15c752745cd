//! Time provider abstraction
//!
//! Record timestamps and message keys are derived from a [`Clock`] so that
//! tests can drive time explicitly while production uses system time.
//!
//! # Example
//!
//! ```
//! use parley::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! assert!(clock.now_millis() > 0);
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::atomic::{AtomicU64, Ordering};

/// A time provider for record and message timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock that advances by a fixed step on every read.
///
/// A step of zero freezes the clock, which is how tests reproduce two writes
/// landing in the same millisecond.
///
/// ```
/// use parley::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// assert_eq!(clock.now_millis(), 1000);
/// assert_eq!(clock.now_millis(), 1001);
///
/// let frozen = FixedClock::frozen(5);
/// assert_eq!(frozen.now_millis(), frozen.now_millis());
/// ```
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicU64,
    step: u64,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Clock starting at `millis` that advances by one on each read.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
            step: 1,
        }
    }

    /// Clock that never advances on its own.
    pub fn frozen(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
            step: 0,
        }
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.millis.store(ms, Ordering::SeqCst);
    }

    /// Current value, without advancing.
    pub fn get(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.millis.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1704067200000)
    }
}
