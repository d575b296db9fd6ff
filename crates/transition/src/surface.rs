use std::time::{Duration, Instant};

use crate::debounce::Debouncer;

/// Backing buffer size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Displayed size in logical units together with the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub logical_width: f64,
    pub logical_height: f64,
    pub scale_factor: f64,
}

impl DisplayMetrics {
    pub fn new(logical_width: f64, logical_height: f64, scale_factor: f64) -> Self {
        Self {
            logical_width,
            logical_height,
            scale_factor,
        }
    }

    /// Builds metrics from a physical size the windowing layer already scaled.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = sanitize_scale(scale_factor);
        Self::new(f64::from(width) / scale, f64::from(height) / scale, scale)
    }

    /// `floor(logical × scale)` per axis.
    pub fn backing_size(&self) -> SurfaceSize {
        let scale = sanitize_scale(self.scale_factor);
        SurfaceSize {
            width: backing_extent(self.logical_width, scale),
            height: backing_extent(self.logical_height, scale),
        }
    }
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn backing_extent(logical: f64, scale: f64) -> u32 {
    if !logical.is_finite() || logical <= 0.0 {
        return 0;
    }
    let physical = logical * scale;
    // Undo float noise from the logical/physical round trip before flooring.
    let nearest = physical.round();
    let snapped = if (physical - nearest).abs() < 1e-4 {
        nearest
    } else {
        physical.floor()
    };
    snapped.min(f64::from(u32::MAX)) as u32
}

/// Keeps the backing size in step with the displayed size, applying bursts of
/// resize notifications once they quiesce and only when the size differs.
#[derive(Debug, Clone)]
pub struct SurfaceManager {
    current: SurfaceSize,
    pending: Debouncer<DisplayMetrics>,
}

impl SurfaceManager {
    pub fn new(initial: SurfaceSize, debounce: Duration) -> Self {
        Self {
            current: initial,
            pending: Debouncer::new(debounce),
        }
    }

    pub fn current(&self) -> SurfaceSize {
        self.current
    }

    pub fn notify(&mut self, metrics: DisplayMetrics, now: Instant) {
        tracing::trace!(
            width = metrics.logical_width,
            height = metrics.logical_height,
            scale = metrics.scale_factor,
            "resize notification"
        );
        self.pending.notify(metrics, now);
    }

    /// Applies the latest notification once its quiet period has elapsed.
    /// Returns the new size only when it differs from the current one.
    pub fn poll(&mut self, now: Instant) -> Option<SurfaceSize> {
        let metrics = self.pending.poll(now)?;
        self.apply(metrics)
    }

    /// Applies any pending notification immediately.
    pub fn flush(&mut self) -> Option<SurfaceSize> {
        let metrics = self.pending.flush()?;
        self.apply(metrics)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    pub fn apply(&mut self, metrics: DisplayMetrics) -> Option<SurfaceSize> {
        let size = metrics.backing_size();
        if size == self.current || size.is_empty() {
            return None;
        }
        tracing::debug!(width = size.width, height = size.height, "surface resized");
        self.current = size;
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_size_floors_scaled_extent() {
        let metrics = DisplayMetrics::new(100.5, 50.2, 2.0);
        assert_eq!(metrics.backing_size(), SurfaceSize::new(201, 100));

        let fractional = DisplayMetrics::new(333.0, 200.0, 1.5);
        assert_eq!(fractional.backing_size(), SurfaceSize::new(499, 300));
    }

    #[test]
    fn physical_round_trip_keeps_exact_size() {
        for scale in [1.0, 1.25, 1.5, 1.75, 2.0, 3.0] {
            let metrics = DisplayMetrics::from_physical(1917, 1083, scale);
            assert_eq!(
                metrics.backing_size(),
                SurfaceSize::new(1917, 1083),
                "scale {scale}"
            );
        }
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        let metrics = DisplayMetrics::new(640.0, 480.0, 0.0);
        assert_eq!(metrics.backing_size(), SurfaceSize::new(640, 480));
    }

    #[test]
    fn burst_of_resizes_applies_last_once() {
        let start = Instant::now();
        let window = Duration::from_millis(100);
        let mut manager = SurfaceManager::new(SurfaceSize::new(800, 600), window);
        let mut applied = Vec::new();

        for step in 0..8u32 {
            let now = start + Duration::from_millis(u64::from(step) * 10);
            manager.notify(DisplayMetrics::new(f64::from(900 + step), 700.0, 1.0), now);
            applied.extend(manager.poll(now));
        }
        let quiet = start + Duration::from_millis(70) + window;
        applied.extend(manager.poll(quiet));
        applied.extend(manager.poll(quiet + window));

        assert_eq!(applied, vec![SurfaceSize::new(907, 700)]);
        assert_eq!(manager.current(), SurfaceSize::new(907, 700));
    }

    #[test]
    fn unchanged_size_is_not_reapplied() {
        let start = Instant::now();
        let window = Duration::from_millis(100);
        let mut manager = SurfaceManager::new(SurfaceSize::new(800, 600), window);
        manager.notify(DisplayMetrics::new(800.4, 600.9, 1.0), start);
        assert_eq!(manager.poll(start + Duration::from_millis(100)), None);
        assert_eq!(manager.deadline(), None);
    }

    #[test]
    fn flush_applies_pending_without_waiting() {
        let start = Instant::now();
        let mut manager = SurfaceManager::new(SurfaceSize::new(800, 600), Duration::from_secs(5));
        manager.notify(DisplayMetrics::new(512.0, 384.0, 2.0), start);
        assert!(manager.deadline().is_some());
        assert_eq!(manager.flush(), Some(SurfaceSize::new(1024, 768)));
        assert_eq!(manager.flush(), None);
    }

    #[test]
    fn empty_size_is_ignored() {
        let window = Duration::from_millis(100);
        let mut manager = SurfaceManager::new(SurfaceSize::new(800, 600), window);
        assert_eq!(manager.apply(DisplayMetrics::new(0.0, 600.0, 1.0)), None);
        assert_eq!(manager.current(), SurfaceSize::new(800, 600));
    }
}
