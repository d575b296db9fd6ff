use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The windowing system or GPU could not provide what rendering needs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to create event loop: {0}")]
    EventLoop(String),
    #[error("failed to create window: {0}")]
    Window(String),
    #[error("failed to acquire {kind} handle: {message}")]
    Handle { kind: &'static str, message: String },
    #[error("failed to create rendering surface")]
    Surface(#[source] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable GPU adapter")]
    Adapter(#[source] wgpu::RequestAdapterError),
    #[error("failed to create GPU device")]
    Device(#[source] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("GPU max texture dimension is {max}, requested {what} is {width}x{height}")]
    TooLarge {
        what: String,
        width: u32,
        height: u32,
        max: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShaderStageKind::Vertex => "vertex",
            ShaderStageKind::Fragment => "fragment",
            ShaderStageKind::Link => "link",
        };
        f.write_str(label)
    }
}

/// A shader stage failed to parse, validate, or link into a pipeline.
#[derive(Debug, Error)]
#[error("{stage} shader from {origin} failed to compile: {message}")]
pub struct CompileError {
    pub stage: ShaderStageKind,
    pub origin: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to start asset worker")]
    Spawn(#[source] io::Error),
    #[error("asset worker exited before delivering its result")]
    WorkerDisconnected,
}

/// Everything that can stop the transition from ever reaching its first frame.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
}
