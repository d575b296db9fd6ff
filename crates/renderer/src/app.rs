//! Application state and the event dispatch table.
//!
//! Every input (click, resize, key, timer tick) is turned into an
//! [`AppEvent`] and run through [`AppState::dispatch`], which performs the
//! pure state transition and reports the GPU-side work the caller still has
//! to do as a [`SideEffect`]. Nothing here touches wgpu or winit, so the whole
//! table can be driven with a synthetic clock in tests.

use std::time::{Duration, Instant};

use effectconfig::{
    effect_panel, EffectSettings, PanelError, ParamValue, ParameterPanel, WrapMode,
    ANIMATION_DURATION, WRAPPING,
};
use tracing::{debug, info};
use transition::{DisplayMetrics, FrameSample, Slot, SurfaceManager, SurfaceSize, TransitionState};

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Pointer activation on the surface; starts a transition when idle.
    Activate,
    /// The window reported a new displayed size or pixel ratio.
    Resized(DisplayMetrics),
    /// Applies a pending resize whose quiet period has elapsed.
    Tick,
    /// Applies a pending resize immediately.
    FlushResize,
    Edit { name: String, value: ParamValue },
    Nudge { name: &'static str, steps: i32 },
    ToggleRunning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SideEffect {
    /// Reconfigure the surface and push resolution uniforms now.
    ResizeSurface(SurfaceSize),
    RebuildSamplers(WrapMode),
    RequestRedraw,
}

pub struct AppState {
    transition: TransitionState,
    settings: EffectSettings,
    panel: ParameterPanel<EffectSettings>,
    surface: SurfaceManager,
    running: bool,
}

impl AppState {
    pub fn new(
        settings: EffectSettings,
        initial_size: SurfaceSize,
        resize_debounce: Duration,
    ) -> Result<Self, PanelError> {
        let panel = effect_panel(&settings)?;
        Ok(Self {
            transition: TransitionState::new(settings.animation_duration),
            settings,
            panel,
            surface: SurfaceManager::new(initial_size, resize_debounce),
            running: true,
        })
    }

    pub fn transition(&self) -> &TransitionState {
        &self.transition
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.surface.current()
    }

    pub fn current_slot(&self) -> Slot {
        self.transition.current()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Earliest instant a pending resize becomes due.
    pub fn resize_deadline(&self) -> Option<Instant> {
        self.surface.deadline()
    }

    pub fn dispatch(
        &mut self,
        event: AppEvent,
        now: Instant,
    ) -> Result<Option<SideEffect>, PanelError> {
        let effect = match event {
            AppEvent::Activate => {
                if self.transition.trigger(now) {
                    debug!(
                        from = self.transition.current().index(),
                        to = self.transition.next().index(),
                        duration_ms = self.transition.duration().as_millis() as u64,
                        "transition started"
                    );
                    Some(SideEffect::RequestRedraw)
                } else {
                    debug!("activation ignored; transition already running");
                    None
                }
            }
            AppEvent::Resized(metrics) => {
                self.surface.notify(metrics, now);
                None
            }
            AppEvent::Tick => self.surface.poll(now).map(SideEffect::ResizeSurface),
            AppEvent::FlushResize => self.surface.flush().map(SideEffect::ResizeSurface),
            AppEvent::Edit { name, value } => {
                let changed = self.panel.set(&mut self.settings, &name, value)?;
                changed.map(|value| self.after_edit(&name, &value))
            }
            AppEvent::Nudge { name, steps } => {
                let changed = self.panel.nudge(&mut self.settings, name, steps)?;
                changed.map(|value| self.after_edit(name, &value))
            }
            AppEvent::ToggleRunning => {
                self.running = !self.running;
                info!(running = self.running, "render loop toggled");
                self.running.then_some(SideEffect::RequestRedraw)
            }
        };
        Ok(effect)
    }

    fn after_edit(&mut self, name: &str, value: &ParamValue) -> SideEffect {
        info!(parameter = name, %value, "parameter changed");
        if name == ANIMATION_DURATION {
            self.transition.set_duration(self.settings.animation_duration);
        }
        if name == WRAPPING {
            SideEffect::RebuildSamplers(self.settings.parameters.wrap_mode)
        } else {
            SideEffect::RequestRedraw
        }
    }

    /// Advances the transition for a frame that is about to be drawn.
    pub fn begin_frame(&mut self, now: Instant) -> FrameSample {
        self.transition.update(now)
    }

    /// Commits a completed transition once its final frame has been drawn.
    pub fn finish_frame(&mut self, sample: &FrameSample) {
        if sample.complete && self.transition.commit_if_complete() {
            debug!(
                current = self.transition.current().index(),
                "transition committed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::TransitionUniforms;
    use effectconfig::{COUNT, SMOOTHNESS};

    fn app() -> AppState {
        let settings = EffectSettings {
            animation_duration: Duration::from_millis(1800),
            ..EffectSettings::default()
        };
        AppState::new(settings, SurfaceSize::new(800, 600), Duration::from_millis(100))
            .expect("panel builds")
    }

    fn edit(name: &str, value: ParamValue) -> AppEvent {
        AppEvent::Edit {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn activate_starts_transition_once() {
        let mut app = app();
        let now = Instant::now();
        assert_eq!(
            app.dispatch(AppEvent::Activate, now).unwrap(),
            Some(SideEffect::RequestRedraw)
        );
        assert!(app.transition().is_animating());
        assert_eq!(app.dispatch(AppEvent::Activate, now).unwrap(), None);
    }

    #[test]
    fn frames_commit_after_final_draw() {
        let mut app = app();
        let t0 = Instant::now();
        app.dispatch(AppEvent::Activate, t0).unwrap();

        let mid = app.begin_frame(t0 + Duration::from_millis(900));
        app.finish_frame(&mid);
        assert!((mid.progress - 0.5).abs() < 1e-6);
        assert_eq!(app.current_slot(), Slot::First);

        let last = app.begin_frame(t0 + Duration::from_millis(1800));
        assert_eq!(last.progress, 1.0);
        assert_eq!(last.current, Slot::First);
        app.finish_frame(&last);
        assert_eq!(app.current_slot(), Slot::Second);
        assert!(!app.transition().is_animating());

        let idle = app.begin_frame(t0 + Duration::from_millis(1900));
        app.finish_frame(&idle);
        assert_eq!(app.current_slot(), Slot::Second);
    }

    #[test]
    fn resize_burst_yields_single_surface_update() {
        let mut app = app();
        let start = Instant::now();
        for step in 0..5u32 {
            let now = start + Duration::from_millis(u64::from(step) * 20);
            let metrics = DisplayMetrics::new(f64::from(1000 + step), 500.0, 2.0);
            assert_eq!(app.dispatch(AppEvent::Resized(metrics), now).unwrap(), None);
            assert_eq!(app.dispatch(AppEvent::Tick, now).unwrap(), None);
        }
        let due = app.resize_deadline().expect("resize pending");
        assert_eq!(
            app.dispatch(AppEvent::Tick, due).unwrap(),
            Some(SideEffect::ResizeSurface(SurfaceSize::new(2008, 1000)))
        );
        assert_eq!(app.dispatch(AppEvent::Tick, due).unwrap(), None);
        assert_eq!(app.surface_size(), SurfaceSize::new(2008, 1000));
    }

    #[test]
    fn flush_applies_pending_resize() {
        let mut app = app();
        let now = Instant::now();
        app.dispatch(
            AppEvent::Resized(DisplayMetrics::new(640.0, 480.0, 1.0)),
            now,
        )
        .unwrap();
        assert_eq!(
            app.dispatch(AppEvent::FlushResize, now).unwrap(),
            Some(SideEffect::ResizeSurface(SurfaceSize::new(640, 480)))
        );
    }

    #[test]
    fn panel_edits_reach_frame_parameters() {
        let mut app = app();
        let now = Instant::now();
        app.dispatch(edit(COUNT, ParamValue::Number(10.0)), now)
            .unwrap();
        app.dispatch(edit(SMOOTHNESS, ParamValue::Number(0.3)), now)
            .unwrap();
        assert_eq!(app.settings().parameters.stripe_count, 10.0);
        assert_eq!(app.settings().parameters.smoothness, 0.3);
    }

    #[test]
    fn panel_edit_shows_up_in_next_frame_uniforms() {
        let mut app = app();
        let now = Instant::now();
        app.dispatch(edit(COUNT, ParamValue::Number(10.0)), now)
            .unwrap();
        app.dispatch(edit(SMOOTHNESS, ParamValue::Number(0.3)), now)
            .unwrap();

        let sample = app.begin_frame(now + Duration::from_millis(16));
        let mut uniforms = TransitionUniforms::new(app.surface_size());
        uniforms.apply_frame(&sample, &app.settings().parameters);
        assert_eq!(uniforms.count, 10.0);
        assert_eq!(uniforms.smoothness, 0.3);
        assert_eq!(uniforms.progress, 0.0);
        assert_eq!(uniforms.texture1, 0);
        assert_eq!(uniforms.texture2, 1);
    }

    #[test]
    fn non_finite_edit_leaves_parameters_untouched() {
        let mut app = app();
        let before = *app.settings();
        for name in [COUNT, SMOOTHNESS, ANIMATION_DURATION] {
            let err = app
                .dispatch(edit(name, ParamValue::Number(f64::NAN)), Instant::now())
                .unwrap_err();
            assert_eq!(err, PanelError::NotFinite(name.to_string()));
        }
        assert_eq!(*app.settings(), before);
        assert_eq!(app.transition().duration(), before.animation_duration);
    }

    #[test]
    fn wrapping_edit_rebuilds_samplers() {
        let mut app = app();
        let effect = app
            .dispatch(
                edit(WRAPPING, ParamValue::Choice("REPEAT".to_string())),
                Instant::now(),
            )
            .unwrap();
        assert_eq!(effect, Some(SideEffect::RebuildSamplers(WrapMode::Repeat)));
    }

    #[test]
    fn duration_edit_applies_to_next_transition() {
        let mut app = app();
        let t0 = Instant::now();
        app.dispatch(AppEvent::Activate, t0).unwrap();
        app.dispatch(
            AppEvent::Nudge {
                name: ANIMATION_DURATION,
                steps: 2,
            },
            t0,
        )
        .unwrap();
        assert_eq!(app.settings().animation_duration, Duration::from_millis(2000));
        assert_eq!(app.transition().duration(), Duration::from_millis(2000));

        let sample = app.begin_frame(t0 + Duration::from_millis(1800));
        assert_eq!(sample.progress, 1.0);
    }

    #[test]
    fn unchanged_edit_has_no_effect() {
        let mut app = app();
        let count = app.settings().parameters.stripe_count;
        let effect = app
            .dispatch(edit(COUNT, ParamValue::Number(f64::from(count))), Instant::now())
            .unwrap();
        assert_eq!(effect, None);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut app = app();
        let err = app
            .dispatch(edit("speed", ParamValue::Number(1.0)), Instant::now())
            .unwrap_err();
        assert_eq!(err, PanelError::UnknownField("speed".to_string()));
    }

    #[test]
    fn stopping_freezes_progress_until_restart() {
        let mut app = app();
        let t0 = Instant::now();
        app.dispatch(AppEvent::Activate, t0).unwrap();
        app.begin_frame(t0 + Duration::from_millis(450));

        assert_eq!(app.dispatch(AppEvent::ToggleRunning, t0).unwrap(), None);
        assert!(!app.is_running());
        assert_eq!(
            app.dispatch(AppEvent::ToggleRunning, t0).unwrap(),
            Some(SideEffect::RequestRedraw)
        );

        let resumed = app.begin_frame(t0 + Duration::from_millis(1350));
        assert!((resumed.progress - 0.75).abs() < 1e-6);
    }
}
