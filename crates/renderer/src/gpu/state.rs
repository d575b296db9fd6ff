use std::time::Instant;

use effectconfig::WrapMode;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::trace;
use transition::{FrameSample, Slot, SurfaceSize};

use crate::app::AppState;
use crate::assets::LoadedAssets;
use crate::compile::compile_program;
use crate::error::StartupError;

use super::context::GpuContext;
use super::geometry::QuadGeometry;
use super::pipeline::{create_pipeline, create_uniform_layout};
use super::textures::{SlotTextures, TextureSlot};
use super::uniforms::TransitionUniforms;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.3,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

/// Owns every GPU resource the transition needs. Created once all assets have
/// resolved; after that, drawing a frame cannot fail except for presentation.
pub(crate) struct GpuState {
    context: GpuContext,
    geometry: QuadGeometry,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: TransitionUniforms,
    textures: SlotTextures,
    pipeline: wgpu::RenderPipeline,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: SurfaceSize,
        assets: LoadedAssets,
        wrap_mode: WrapMode,
    ) -> Result<Self, StartupError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let device = &context.device;

        let program = compile_program(device, &assets.shaders)?;

        let [first, second] = &assets.images;
        let slots = [
            TextureSlot::upload(
                device,
                &context.queue,
                first,
                Slot::First,
                context.max_texture_dimension,
            )?,
            TextureSlot::upload(
                device,
                &context.queue,
                second,
                Slot::Second,
                context.max_texture_dimension,
            )?,
        ];
        let textures = SlotTextures::new(device, slots, wrap_mode);

        let uniform_layout = create_uniform_layout(device);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: std::mem::size_of::<TransitionUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = create_pipeline(
            device,
            &program,
            &uniform_layout,
            &textures.layout,
            context.surface_format,
        )?;
        let geometry = QuadGeometry::new(device);

        let mut state = Self {
            uniforms: TransitionUniforms::new(context.size),
            context,
            geometry,
            uniform_buffer,
            uniform_bind_group,
            textures,
            pipeline,
        };
        state.refresh_surface_uniforms(Slot::First);
        Ok(state)
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.context.size
    }

    /// Reallocates the swapchain and pushes the new resolution right away.
    pub(crate) fn resize(&mut self, new_size: SurfaceSize, current: Slot) {
        self.context.resize(new_size);
        self.refresh_surface_uniforms(current);
    }

    pub(crate) fn reconfigure(&self) {
        self.context.reconfigure();
    }

    pub(crate) fn set_wrap_mode(&mut self, wrap_mode: WrapMode) {
        self.textures.set_wrap_mode(&self.context.device, wrap_mode);
    }

    /// Draws one frame. The surface texture is acquired before the transition
    /// advances so a presentation error leaves the state machine untouched.
    /// A transition that reached full progress is committed only after the
    /// frame showing it has been submitted.
    pub(crate) fn render_frame(
        &mut self,
        app: &mut AppState,
        now: Instant,
    ) -> Result<Option<FrameSample>, wgpu::SurfaceError> {
        if !app.is_running() {
            trace!("render loop stopped; skipping frame");
            return Ok(None);
        }

        let frame = self.context.surface.get_current_texture()?;

        let sample = app.begin_frame(now);
        let active = self.textures.slot(sample.current);
        self.uniforms.set_resolution(self.context.size);
        self.uniforms.set_tex_resolution(active.width, active.height);
        self.uniforms
            .apply_frame(&sample, &app.settings().parameters);
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        self.encode_draw(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        app.finish_frame(&sample);
        Ok(Some(sample))
    }

    fn refresh_surface_uniforms(&mut self, current: Slot) {
        let active = self.textures.slot(current);
        self.uniforms.set_resolution(self.context.size);
        self.uniforms.set_tex_resolution(active.width, active.height);
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);
    }

    fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.textures.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.geometry.vertex_buffer.slice(..));
        render_pass.set_index_buffer(
            self.geometry.index_buffer.slice(..),
            wgpu::IndexFormat::Uint16,
        );
        render_pass.draw_indexed(0..self.geometry.index_count, 0, 0..1);
    }

    fn write_uniforms(
        queue: &wgpu::Queue,
        buffer: &wgpu::Buffer,
        uniforms: &TransitionUniforms,
    ) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
    }
}
