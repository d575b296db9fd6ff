use std::time::{Duration, Instant};

/// Shortest duration a transition may run; keeps the progress division finite.
const MIN_DURATION: Duration = Duration::from_millis(1);

/// One of the two texture slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::First, Slot::Second];

    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }

    pub fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// The duration is latched when the transition starts, so edits made
    /// mid-flight only affect the next transition.
    Animating {
        started_at: Instant,
        duration: Duration,
    },
}

/// Snapshot handed to the frame renderer after the per-frame update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub progress: f32,
    pub current: Slot,
    pub next: Slot,
    /// The in-flight transition reached full progress this frame and will be
    /// committed once the frame has been drawn.
    pub complete: bool,
}

/// Two-slot transition machine driven by a monotonic clock.
///
/// ```text
///   Idle ──trigger()──▶ Animating ──update()──▶ Animating
///     ▲                     │
///     └──commit_if_complete() once progress reaches 1.0
/// ```
///
/// The next slot is always derived from the current one, so the two can never
/// point at the same texture.
#[derive(Debug, Clone)]
pub struct TransitionState {
    current: Slot,
    progress: f32,
    phase: Phase,
    duration: Duration,
}

impl TransitionState {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: Slot::First,
            progress: 0.0,
            phase: Phase::Idle,
            duration: duration.max(MIN_DURATION),
        }
    }

    pub fn current(&self) -> Slot {
        self.current
    }

    pub fn next(&self) -> Slot {
        self.current.other()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Animating { .. })
    }

    /// Duration the next transition will run for.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration.max(MIN_DURATION);
    }

    /// Starts a transition towards the other slot. Returns `false` and leaves
    /// the state untouched when one is already in flight.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.is_animating() {
            return false;
        }
        self.phase = Phase::Animating {
            started_at: now,
            duration: self.duration,
        };
        self.progress = 0.0;
        true
    }

    /// Recomputes progress from the absolute elapsed time since the trigger.
    ///
    /// The result does not depend on how often this is called, which also
    /// makes stopping and restarting the render loop safe.
    pub fn update(&mut self, now: Instant) -> FrameSample {
        if let Phase::Animating {
            started_at,
            duration,
        } = self.phase
        {
            let elapsed = now.saturating_duration_since(started_at);
            let ratio = (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0) as f32;
            self.progress = self.progress.max(ratio);
        }
        self.sample()
    }

    pub fn sample(&self) -> FrameSample {
        FrameSample {
            progress: self.progress,
            current: self.current,
            next: self.next(),
            complete: self.is_animating() && self.progress >= 1.0,
        }
    }

    /// Swaps slots once a finished transition has been drawn at full
    /// progress. Returns `true` only on the frame that commits.
    pub fn commit_if_complete(&mut self) -> bool {
        if !(self.is_animating() && self.progress >= 1.0) {
            return false;
        }
        self.current = self.current.other();
        self.progress = 0.0;
        self.phase = Phase::Idle;
        true
    }
}
