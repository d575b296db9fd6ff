use std::time::{Duration, Instant};

/// Coalesces a burst of notifications into a single payload delivered once
/// the burst has been quiet for `window`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Records `payload`, replacing any pending one and restarting the timer.
    pub fn notify(&mut self, payload: T, now: Instant) {
        self.pending = Some((payload, now + self.window));
    }

    /// Returns the pending payload if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = matches!(self.deadline(), Some(deadline) if now >= deadline);
        if ready {
            self.flush()
        } else {
            None
        }
    }

    /// Returns the pending payload regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(payload, _)| payload)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
