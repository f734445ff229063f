use std::time::{Duration, Instant};

/// Leading + trailing rate limiter driven by caller-supplied timestamps
///
/// The first call in a quiet period fires immediately. Calls inside the
/// window collapse into one trailing fire at the end of the window, which
/// the owner picks up through [`Throttle::poll`].
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
    trailing_at: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            trailing_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if the action should run now
    pub fn call(&mut self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.trailing_at = Some(last + self.interval);
                false
            }
            _ => {
                self.last_fired = Some(now);
                self.trailing_at = None;
                true
            }
        }
    }

    /// Returns true if a deferred trailing fire is due
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.trailing_at {
            Some(at) if now >= at => {
                self.trailing_at = None;
                self.last_fired = Some(now);
                true
            }
            _ => false,
        }
    }

    /// When the pending trailing fire becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.trailing_at
    }
}
