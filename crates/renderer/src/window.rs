use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use effectconfig::{ANIMATION_DURATION, COUNT, SMOOTHNESS, WRAPPING};
use tracing::{error, info, trace, warn};
use transition::{DisplayMetrics, SurfaceSize};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::app::{AppEvent, AppState, SideEffect};
use crate::assets::{AssetRequest, PendingAssets};
use crate::error::{SetupError, StartupError};
use crate::gpu::GpuState;
use crate::RendererConfig;

/// What a key press asks the application to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum KeyAction {
    Dispatch(AppEvent),
    Exit,
}

/// Maps pressed keys onto panel nudges and loop control.
pub(crate) fn key_action(key: &Key) -> Option<KeyAction> {
    let nudge = |name: &'static str, steps: i32| {
        Some(KeyAction::Dispatch(AppEvent::Nudge { name, steps }))
    };
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Exit),
        Key::Named(NamedKey::Space) => Some(KeyAction::Dispatch(AppEvent::ToggleRunning)),
        Key::Named(NamedKey::ArrowUp) => nudge(COUNT, 1),
        Key::Named(NamedKey::ArrowDown) => nudge(COUNT, -1),
        Key::Named(NamedKey::ArrowRight) => nudge(SMOOTHNESS, 1),
        Key::Named(NamedKey::ArrowLeft) => nudge(SMOOTHNESS, -1),
        Key::Character(value) => match value.as_str() {
            "p" | "P" => Some(KeyAction::Dispatch(AppEvent::ToggleRunning)),
            "]" => nudge(ANIMATION_DURATION, 1),
            "[" => nudge(ANIMATION_DURATION, -1),
            "w" | "W" => nudge(WRAPPING, 1),
            _ => None,
        },
        _ => None,
    }
}

/// Window plus everything drawn into it. Field order matters: the GPU state
/// holds a surface created from the window's raw handle and must drop first.
struct WindowState {
    gpu: GpuState,
    app: AppState,
    window: Arc<Window>,
}

impl WindowState {
    fn dispatch(&mut self, event: AppEvent) {
        match self.app.dispatch(event, Instant::now()) {
            Ok(Some(effect)) => self.apply(effect),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "parameter edit rejected"),
        }
    }

    fn apply(&mut self, effect: SideEffect) {
        match effect {
            SideEffect::ResizeSurface(size) => {
                self.gpu.resize(size, self.app.current_slot());
                info!(width = size.width, height = size.height, "surface resized");
                self.window.request_redraw();
            }
            SideEffect::RebuildSamplers(mode) => {
                self.gpu.set_wrap_mode(mode);
                self.window.request_redraw();
            }
            SideEffect::RequestRedraw => self.window.request_redraw(),
        }
    }

    fn notify_resize(&mut self, size: PhysicalSize<u32>) {
        let scale = self.window.scale_factor();
        let metrics = DisplayMetrics::from_physical(size.width, size.height, scale);
        self.dispatch(AppEvent::Resized(metrics));
    }

    fn handle_key(&mut self, event: &KeyEvent, elwt: &EventLoopWindowTarget<()>) {
        if event.state != ElementState::Pressed {
            return;
        }
        match key_action(&event.logical_key) {
            Some(KeyAction::Exit) => elwt.exit(),
            // Held keys keep nudging, but should not flicker the loop on and off.
            Some(KeyAction::Dispatch(AppEvent::ToggleRunning)) if event.repeat => {}
            Some(KeyAction::Dispatch(app_event)) => self.dispatch(app_event),
            None => {}
        }
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<()>) {
        match self.gpu.render_frame(&mut self.app, Instant::now()) {
            Ok(Some(sample)) => {
                trace!(
                    progress = sample.progress,
                    current = sample.current.index(),
                    "frame presented"
                );
            }
            Ok(None) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // A pending resize is the likely cause, so apply it now.
                match self.app.dispatch(AppEvent::FlushResize, Instant::now()) {
                    Ok(Some(effect)) => self.apply(effect),
                    _ => self.gpu.reconfigure(),
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting");
                elwt.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(other) => {
                warn!(error = ?other, "surface error; retrying next frame");
            }
        }
    }

    fn schedule(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let now = Instant::now();
        self.dispatch(AppEvent::Tick);

        if self.app.is_running() {
            // FIFO presentation paces these to the display refresh.
            self.window.request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        } else if let Some(deadline) = self.app.resize_deadline() {
            let ms = deadline.saturating_duration_since(now).as_millis();
            trace!(deadline_ms = ms, "stopped; waiting for pending resize");
            elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            elwt.set_control_flow(ControlFlow::Wait);
        }
    }
}

pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let pending = PendingAssets::spawn(AssetRequest {
        images: config.images.clone(),
        vertex_shader: config.vertex_shader.clone(),
        fragment_shader: config.fragment_shader.clone(),
    })
    .map_err(StartupError::from)?;

    let event_loop = EventLoop::new()
        .map_err(|err| StartupError::from(SetupError::EventLoop(err.to_string())))?;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(
            config.surface_size.0,
            config.surface_size.1,
        ))
        .build(&event_loop)
        .map_err(|err| StartupError::from(SetupError::Window(err.to_string())))?;
    let window = Arc::new(window);

    let assets = pending.wait().map_err(StartupError::from)?;

    let inner = window.inner_size();
    let initial_size = SurfaceSize::new(inner.width, inner.height);
    let gpu = GpuState::new(
        window.as_ref(),
        initial_size,
        assets,
        config.settings.parameters.wrap_mode,
    )?;
    let app = AppState::new(config.settings, gpu.size(), config.resize_debounce)
        .context("failed to build parameter panel")?;
    info!(
        width = gpu.size().width,
        height = gpu.size().height,
        count = config.settings.parameters.stripe_count,
        smoothness = config.settings.parameters.smoothness,
        "renderer ready; click to transition"
    );

    let mut state = WindowState { gpu, app, window };
    state.window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } => state.handle_key(&event, elwt),
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => state.dispatch(AppEvent::Activate),
                    WindowEvent::Resized(new_size) => state.notify_resize(new_size),
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = state.window.inner_size();
                        state.notify_resize(size);
                    }
                    WindowEvent::RedrawRequested => state.redraw(elwt),
                    _ => {}
                }
            }
            Event::AboutToWait => state.schedule(elwt),
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
