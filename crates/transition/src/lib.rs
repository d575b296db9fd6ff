//! Time-driven logic behind the stripe-wipe effect, kept free of GPU and
//! windowing types so it can be exercised with synthetic clocks:
//!
//! - `state` owns the two-slot [`TransitionState`] machine.
//! - `debounce` coalesces bursts of events into one delayed payload.
//! - `surface` tracks the backing-buffer size derived from display metrics.

mod debounce;
mod state;
mod surface;

pub use debounce::Debouncer;
pub use state::{FrameSample, Phase, Slot, TransitionState};
pub use surface::{DisplayMetrics, SurfaceManager, SurfaceSize};
