//! Background loading of the two images and the shader pair.
//!
//! Each asset is read on its own worker thread and reported over a channel so
//! disk and decode work overlaps with window and GPU creation. Rendering only
//! starts once [`PendingAssets::wait`] has collected one shader pair and both
//! images; the first failure wins and aborts startup.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::compile::{BUILTIN_FRAGMENT_SHADER, BUILTIN_VERTEX_SHADER};
use crate::error::AssetLoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    Builtin,
    File(PathBuf),
}

impl fmt::Display for ShaderOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderOrigin::Builtin => f.write_str("built-in source"),
            ShaderOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub origin: ShaderOrigin,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ShaderPair {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

/// RGBA8 pixels plus the native size of the source image.
#[derive(Clone)]
pub struct DecodedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct LoadedAssets {
    pub shaders: ShaderPair,
    pub images: [DecodedImage; 2],
}

/// What to load. Missing shader paths fall back to the built-in sources.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub images: [PathBuf; 2],
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
}

pub fn load_shader_pair(
    vertex: Option<&Path>,
    fragment: Option<&Path>,
) -> Result<ShaderPair, AssetLoadError> {
    Ok(ShaderPair {
        vertex: load_shader_source(vertex, BUILTIN_VERTEX_SHADER)?,
        fragment: load_shader_source(fragment, BUILTIN_FRAGMENT_SHADER)?,
    })
}

fn load_shader_source(path: Option<&Path>, builtin: &str) -> Result<ShaderSource, AssetLoadError> {
    match path {
        Some(path) => {
            let code = fs::read_to_string(path).map_err(|source| AssetLoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(ShaderSource {
                origin: ShaderOrigin::File(path.to_path_buf()),
                code,
            })
        }
        None => Ok(ShaderSource {
            origin: ShaderOrigin::Builtin,
            code: builtin.to_string(),
        }),
    }
}

/// Reads and decodes an image into tightly packed RGBA8 rows, top row first.
pub fn decode_image(path: &Path) -> Result<DecodedImage, AssetLoadError> {
    let bytes = fs::read(path).map_err(|source| AssetLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        path: path.to_path_buf(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

enum AssetMessage {
    Shaders(Result<ShaderPair, AssetLoadError>),
    Image {
        slot: usize,
        result: Result<DecodedImage, AssetLoadError>,
    },
}

/// Handle to the in-flight loads started by [`PendingAssets::spawn`].
pub struct PendingAssets {
    receiver: Receiver<AssetMessage>,
    workers: Vec<JoinHandle<()>>,
}

impl PendingAssets {
    pub fn spawn(request: AssetRequest) -> Result<Self, AssetLoadError> {
        let (sender, receiver) = unbounded();
        let mut workers = Vec::with_capacity(3);

        let AssetRequest {
            images,
            vertex_shader,
            fragment_shader,
        } = request;

        workers.push(spawn_worker("asset-shaders", sender.clone(), move || {
            AssetMessage::Shaders(load_shader_pair(
                vertex_shader.as_deref(),
                fragment_shader.as_deref(),
            ))
        })?);

        for (slot, path) in images.into_iter().enumerate() {
            workers.push(spawn_worker(
                &format!("asset-image-{slot}"),
                sender.clone(),
                move || AssetMessage::Image {
                    slot,
                    result: decode_image(&path),
                },
            )?);
        }

        Ok(Self { receiver, workers })
    }

    /// Blocks until every asset resolved, returning the first failure.
    pub fn wait(self) -> Result<LoadedAssets, AssetLoadError> {
        let mut shaders = None;
        let mut images: [Option<DecodedImage>; 2] = [None, None];

        while shaders.is_none() || images.iter().any(Option::is_none) {
            let message = self
                .receiver
                .recv()
                .map_err(|_| AssetLoadError::WorkerDisconnected)?;
            match message {
                AssetMessage::Shaders(result) => {
                    let pair = result?;
                    tracing::debug!(
                        vertex = %pair.vertex.origin,
                        fragment = %pair.fragment.origin,
                        "shader sources loaded"
                    );
                    shaders = Some(pair);
                }
                AssetMessage::Image { slot, result } => {
                    let image = result?;
                    tracing::debug!(
                        slot,
                        path = %image.path.display(),
                        width = image.width,
                        height = image.height,
                        "image decoded"
                    );
                    if let Some(entry) = images.get_mut(slot) {
                        *entry = Some(image);
                    }
                }
            }
        }

        for worker in self.workers {
            if worker.join().is_err() {
                tracing::warn!("asset worker panicked after reporting");
            }
        }

        match (shaders, images) {
            (Some(shaders), [Some(first), Some(second)]) => Ok(LoadedAssets {
                shaders,
                images: [first, second],
            }),
            _ => Err(AssetLoadError::WorkerDisconnected),
        }
    }
}

fn spawn_worker<F>(
    name: &str,
    sender: Sender<AssetMessage>,
    job: F,
) -> Result<JoinHandle<()>, AssetLoadError>
where
    F: FnOnce() -> AssetMessage + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // The receiver is gone once another asset failed; nothing to report to.
            let _ = sender.send(job());
        })
        .map_err(AssetLoadError::Spawn)
}
