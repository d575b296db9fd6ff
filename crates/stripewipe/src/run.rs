use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use effectconfig::StripewipeConfig;
use renderer::{
    decode_image, load_shader_pair, validate_glsl, Renderer, RendererConfig, ShaderStageKind,
};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::{locate_config, ConfigSource};

/// Configuration after file discovery and command-line overrides.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub source: Option<PathBuf>,
    pub config: StripewipeConfig,
}

impl ResolvedConfig {
    fn image_pair(&self) -> Result<[PathBuf; 2]> {
        match self.config.assets.images.as_slice() {
            [first, second] => Ok([first.clone(), second.clone()]),
            [] => bail!(
                "no images configured; pass --first and --second or list two images under [assets]"
            ),
            other => bail!("expected exactly two images, found {}", other.len()),
        }
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let resolved = resolve_config(&args)?;
    let images = resolved.image_pair()?;
    let config = &resolved.config;
    tracing::debug!(
        source = ?resolved.source,
        first = %images[0].display(),
        second = %images[1].display(),
        "resolved stripewipe configuration"
    );

    let renderer_config = RendererConfig {
        surface_size: (config.window.width, config.window.height),
        title: config.window.title.clone(),
        images,
        vertex_shader: config.assets.vertex_shader.clone(),
        fragment_shader: config.assets.fragment_shader.clone(),
        settings: config.effect_settings(),
        resize_debounce: config.window.resize_debounce,
    };

    let mut renderer = Renderer::new(renderer_config);
    renderer.run()
}

/// Validates everything `run` would load without opening a window.
pub fn check(args: RunArgs) -> Result<()> {
    let resolved = resolve_config(&args)?;
    let images = resolved.image_pair()?;
    let config = &resolved.config;

    let shaders = load_shader_pair(
        config.assets.vertex_shader.as_deref(),
        config.assets.fragment_shader.as_deref(),
    )?;
    validate_glsl(&shaders.vertex, ShaderStageKind::Vertex)?;
    validate_glsl(&shaders.fragment, ShaderStageKind::Fragment)?;

    let mut decoded = Vec::with_capacity(images.len());
    for path in &images {
        decoded.push(decode_image(path)?);
    }

    match &resolved.source {
        Some(path) => println!("config:   {}", path.display()),
        None => println!("config:   (defaults)"),
    }
    for (slot, image) in decoded.iter().enumerate() {
        println!(
            "image {slot}:  {} ({}x{})",
            image.path.display(),
            image.width,
            image.height
        );
    }
    println!("vertex:   {}", shaders.vertex.origin);
    println!("fragment: {}", shaders.fragment.origin);
    println!(
        "window:   {}x{} \"{}\" debounce={}",
        config.window.width,
        config.window.height,
        config.window.title,
        humantime::format_duration(config.window.resize_debounce)
    );
    let settings = config.effect_settings();
    println!(
        "effect:   count={} smoothness={} duration={} wrapping={}",
        settings.parameters.stripe_count,
        settings.parameters.smoothness,
        humantime::format_duration(settings.animation_duration),
        settings.parameters.wrap_mode
    );
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn resolve_config(args: &RunArgs) -> Result<ResolvedConfig> {
    let (source, mut config) = match locate_config(args.config.as_deref())? {
        ConfigSource::Explicit(path) => {
            let config = StripewipeConfig::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (Some(path), config)
        }
        ConfigSource::Discovered(path) if path.is_file() => {
            let config = StripewipeConfig::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (Some(path), config)
        }
        ConfigSource::Discovered(path) => {
            tracing::debug!(path = %path.display(), "no configuration file; using defaults");
            (None, StripewipeConfig::default())
        }
    };

    apply_overrides(&mut config, args)?;
    config
        .validate()
        .context("configuration is invalid after applying command-line overrides")?;
    Ok(ResolvedConfig { source, config })
}

fn apply_overrides(config: &mut StripewipeConfig, args: &RunArgs) -> Result<()> {
    match (&args.first, &args.second) {
        (None, None) => {}
        (first, second) if config.assets.images.len() == 2 => {
            if let Some(first) = first {
                config.assets.images[0] = first.clone();
            }
            if let Some(second) = second {
                config.assets.images[1] = second.clone();
            }
        }
        (Some(first), Some(second)) => {
            config.assets.images = vec![first.clone(), second.clone()];
        }
        _ => bail!(
            "--first and --second must both be given when the configuration lists no images"
        ),
    }

    if let Some(path) = &args.vertex_shader {
        config.assets.vertex_shader = Some(path.clone());
    }
    if let Some(path) = &args.fragment_shader {
        config.assets.fragment_shader = Some(path.clone());
    }
    if let Some((width, height)) = args.size {
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(count) = args.count {
        config.effect.count = count;
    }
    if let Some(smoothness) = args.smoothness {
        config.effect.smoothness = smoothness;
    }
    if let Some(seconds) = args.duration {
        config.effect.animation_duration = Duration::try_from_secs_f64(seconds)
            .map_err(|err| anyhow!("invalid --duration {seconds}: {err}"))?;
    }
    if let Some(mode) = args.wrapping {
        config.effect.wrapping = mode;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use effectconfig::WrapMode;

    #[test]
    fn overrides_replace_configured_values() {
        let mut config = StripewipeConfig::default();
        config.assets.images = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let args = RunArgs {
            second: Some(PathBuf::from("c.png")),
            size: Some((640, 480)),
            count: Some(12.0),
            duration: Some(2.5),
            wrapping: Some(WrapMode::Repeat),
            ..RunArgs::default()
        };

        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(
            config.assets.images,
            vec![PathBuf::from("a.png"), PathBuf::from("c.png")]
        );
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.effect.count, 12.0);
        assert_eq!(config.effect.animation_duration, Duration::from_millis(2500));
        assert_eq!(config.effect.wrapping, WrapMode::Repeat);
        assert_eq!(config.effect.smoothness, 0.8);
    }

    #[test]
    fn single_image_flag_without_configured_pair_fails() {
        let mut config = StripewipeConfig::default();
        let args = RunArgs {
            first: Some(PathBuf::from("a.png")),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&mut config, &args).is_err());
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut config = StripewipeConfig::default();
        let args = RunArgs {
            duration: Some(-1.0),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&mut config, &args).is_err());
    }

    #[test]
    fn image_pair_requires_two_images() {
        let resolved = ResolvedConfig {
            source: None,
            config: StripewipeConfig::default(),
        };
        assert!(resolved.image_pair().is_err());
    }
}
