//! GPU side of the transition.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain when the backing size changes.
//! - `geometry` builds the static fullscreen quad.
//! - `uniforms` mirrors the `TransitionParams` std140 block.
//! - `textures` uploads the two image slots and owns their samplers.
//! - `pipeline` links the compiled shader pair into a render pipeline.
//! - `state` glues everything together and draws one frame at a time.

mod context;
mod geometry;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::GpuState;
pub use uniforms::TransitionUniforms;
