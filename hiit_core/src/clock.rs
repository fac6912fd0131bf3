//! Monotonic time sources and the manual-set stopwatch.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source, injected so tests can control elapsed time
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by `Instant`
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

/// Pausable stopwatch measuring active time.
///
/// Time from earlier running windows is kept in `baseline`; `anchor` marks the
/// start of the current running window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stopwatch {
    baseline: Duration,
    anchor: Option<Duration>,
}

impl Stopwatch {
    /// Zero the stopwatch and start measuring from `now`
    pub fn restart(&mut self, now: Duration) {
        self.baseline = Duration::ZERO;
        self.anchor = Some(now);
    }

    /// Fold the current window into the baseline and stop measuring
    pub fn pause(&mut self, now: Duration) {
        if let Some(anchor) = self.anchor.take() {
            self.baseline += now.saturating_sub(anchor);
        }
    }

    /// Start a new running window if stopped
    pub fn resume(&mut self, now: Duration) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        match self.anchor {
            Some(anchor) => self.baseline + now.saturating_sub(anchor),
            None => self.baseline,
        }
    }
}
