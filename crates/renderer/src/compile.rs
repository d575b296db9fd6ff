use std::borrow::Cow;

use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::ShaderStage;

use crate::assets::{ShaderPair, ShaderSource};
use crate::error::{CompileError, ShaderStageKind};

/// Vertex stage for the fullscreen quad. Declares the `TransitionParams`
/// block whose layout mirrors `TransitionUniforms`.
pub const BUILTIN_VERTEX_SHADER: &str = include_str!("../shaders/main.vert");

/// Stripe-wipe fragment stage sampling the two texture slots.
pub const BUILTIN_FRAGMENT_SHADER: &str = include_str!("../shaders/main.frag");

pub(crate) struct CompiledProgram {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub label: String,
}

/// Parses and validates GLSL on the CPU so errors carry naga's diagnostics
/// instead of a device-lost style failure later on.
pub fn validate_glsl(source: &ShaderSource, stage: ShaderStageKind) -> Result<(), CompileError> {
    let naga_stage = match stage {
        ShaderStageKind::Vertex => ShaderStage::Vertex,
        ShaderStageKind::Fragment | ShaderStageKind::Link => ShaderStage::Fragment,
    };
    let fail = |message: String| CompileError {
        stage,
        origin: source.origin.to_string(),
        message,
    };

    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(naga_stage), &source.code)
        .map_err(|err| fail(err.to_string()))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| fail(err.to_string()))?;
    Ok(())
}

pub(crate) fn compile_program(
    device: &wgpu::Device,
    shaders: &ShaderPair,
) -> Result<CompiledProgram, CompileError> {
    validate_glsl(&shaders.vertex, ShaderStageKind::Vertex)?;
    validate_glsl(&shaders.fragment, ShaderStageKind::Fragment)?;

    let vertex = create_module(device, &shaders.vertex, ShaderStageKind::Vertex)?;
    let fragment = create_module(device, &shaders.fragment, ShaderStageKind::Fragment)?;
    tracing::debug!(
        vertex = %shaders.vertex.origin,
        fragment = %shaders.fragment.origin,
        "compiled shader pair"
    );

    Ok(CompiledProgram {
        vertex,
        fragment,
        label: format!("{} + {}", shaders.vertex.origin, shaders.fragment.origin),
    })
}

fn create_module(
    device: &wgpu::Device,
    source: &ShaderSource,
    stage: ShaderStageKind,
) -> Result<wgpu::ShaderModule, CompileError> {
    let naga_stage = match stage {
        ShaderStageKind::Vertex => ShaderStage::Vertex,
        ShaderStageKind::Fragment | ShaderStageKind::Link => ShaderStage::Fragment,
    };
    let label = format!("stripewipe {stage}");

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(&source.code),
            stage: naga_stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(CompileError {
            stage,
            origin: source.origin.to_string(),
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}
