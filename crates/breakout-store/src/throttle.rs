use std::time::{Duration, Instant};

/// Leading + trailing throttle for the store's expensive stages.
///
/// The first request after a quiet period runs immediately. Requests that
/// arrive within `interval` of the last run are coalesced: they mark the
/// throttle dirty, and a single trailing run fires once the interval has
/// elapsed. The trailing run is never dropped, only delayed.
#[derive(Debug)]
pub(crate) struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
    dirty: bool,
}

impl Throttle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            dirty: false,
        }
    }

    fn is_ready(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last_run| now.duration_since(last_run) >= self.interval)
    }

    /// Records a change. Returns whether it must run now (leading edge).
    pub(crate) fn request(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.last_run = Some(now);
            self.dirty = false;
            return true;
        }
        self.dirty = true;
        false
    }

    /// Returns whether the trailing run is due.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        if self.dirty && self.is_ready(now) {
            self.last_run = Some(now);
            self.dirty = false;
            return true;
        }
        false
    }

    /// Returns when the pending trailing run is due, if any.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        let last_run = self.last_run?;
        self.dirty.then(|| last_run + self.interval)
    }

    pub(crate) fn cancel(&mut self) {
        self.dirty = false;
    }
}
