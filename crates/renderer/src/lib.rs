//! Renderer crate for stripewipe.
//!
//! Glues the winit window, the `wgpu` pipeline, and the pure transition logic
//! together. The overall flow is:
//!
//! ```text
//!   stripewipe CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ PendingAssets (worker threads)
//!          │                 │ LoadedAssets
//!          ▼                 ▼
//!   winit event loop ──▶ AppState::dispatch ──▶ SideEffect ──▶ GpuState
//!          │
//!          └─▶ RedrawRequested ──▶ GpuState::render_frame()
//!                                    acquire ─▶ update ─▶ uniforms ─▶ draw ─▶ commit
//! ```
//!
//! `GpuState` owns all GPU resources (surface, device, pipeline, uniforms,
//! texture slots) while `AppState` owns the transition machine, the effect
//! settings and their parameter panel, and the debounced surface size.

mod app;
mod assets;
mod compile;
mod error;
mod gpu;
mod window;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use effectconfig::EffectSettings;

pub use app::{AppEvent, AppState, SideEffect};
pub use assets::{
    decode_image, load_shader_pair, AssetRequest, DecodedImage, LoadedAssets, PendingAssets,
    ShaderOrigin, ShaderPair, ShaderSource,
};
pub use compile::{validate_glsl, BUILTIN_FRAGMENT_SHADER, BUILTIN_VERTEX_SHADER};
pub use error::{AssetLoadError, CompileError, SetupError, ShaderStageKind, StartupError};
pub use gpu::TransitionUniforms;

/// Parameters that control how the renderer initialises.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    /// Images shown in slot 0 and slot 1.
    pub images: [PathBuf; 2],
    /// Optional shader overrides; `None` selects the built-in stage.
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
    pub settings: EffectSettings,
    /// Quiet period before a burst of resize events is applied.
    pub resize_debounce: Duration,
}

/// Entry point that owns the configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Loads assets, opens the window and drives the event loop until the
    /// window closes. Any startup failure is returned before a frame is drawn.
    pub fn run(&mut self) -> Result<()> {
        window::run(&self.config)
    }
}
