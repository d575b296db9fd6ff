use std::path::PathBuf;

use clap::{Parser, Subcommand};
use effectconfig::WrapMode;

#[derive(Parser, Debug)]
#[command(
    name = "stripewipe",
    author,
    version,
    about = "Stripe-wipe transition between two images"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to `$STRIPEWIPE_CONFIG_DIR/config.toml`).
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Image shown before the first transition.
    #[arg(long, value_name = "PATH", global = true)]
    pub first: Option<PathBuf>,

    /// Image revealed by the first transition.
    #[arg(long, value_name = "PATH", global = true)]
    pub second: Option<PathBuf>,

    /// GLSL vertex shader replacing the built-in one.
    #[arg(long, value_name = "PATH", global = true)]
    pub vertex_shader: Option<PathBuf>,

    /// GLSL fragment shader replacing the built-in one.
    #[arg(long, value_name = "PATH", global = true)]
    pub fragment_shader: Option<PathBuf>,

    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, global = true)]
    pub size: Option<(u32, u32)>,

    /// Number of stripes (1-50).
    #[arg(long, value_name = "N", global = true)]
    pub count: Option<f32>,

    /// Stripe edge softness (0-1).
    #[arg(long, value_name = "VALUE", global = true)]
    pub smoothness: Option<f32>,

    /// Transition duration in seconds (0.1-10).
    #[arg(long, value_name = "SECONDS", global = true)]
    pub duration: Option<f64>,

    /// Texture wrap mode (`clamp_to_edge`, `repeat`, `mirrored_repeat`).
    #[arg(long, value_name = "MODE", value_parser = parse_wrap_mode, global = true)]
    pub wrapping: Option<WrapMode>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and shaders, print the resolved settings, and exit.
    Check,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got '{value}'"));
    }
    Ok((width, height))
}

pub fn parse_wrap_mode(value: &str) -> Result<WrapMode, String> {
    value.parse::<WrapMode>().map_err(|err| err.to_string())
}
