//! Configuration model for stripewipe.
//!
//! A single TOML document describes the transition effect, the two images and
//! optional shader overrides, and the preview window:
//!
//! ```toml
//! [effect]
//! smoothness = 0.8
//! count = 30
//! animation_duration = "1.8s"
//! wrapping = "clamp_to_edge"
//!
//! [assets]
//! images = ["first.jpg", "second.jpg"]
//!
//! [window]
//! width = 1280
//! height = 720
//! resize_debounce = "100ms"
//! ```
//!
//! Every value is range-checked on load. Live edits go through
//! [`ParameterPanel`], which snaps them to the declared step instead.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

mod panel;

pub use panel::{
    effect_panel, Constraint, PanelError, ParamValue, ParameterPanel, ANIMATION_DURATION, COUNT,
    SMOOTHNESS, WRAPPING,
};

pub const SMOOTHNESS_MIN: f32 = 0.0;
pub const SMOOTHNESS_MAX: f32 = 1.0;
pub const COUNT_MIN: f32 = 1.0;
pub const COUNT_MAX: f32 = 50.0;
pub const DURATION_MIN: Duration = Duration::from_millis(100);
pub const DURATION_MAX: Duration = Duration::from_secs(10);
pub const MAX_RESIZE_DEBOUNCE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Sampler addressing applied to both texture slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl WrapMode {
    pub const ALL: [WrapMode; 3] = [
        WrapMode::ClampToEdge,
        WrapMode::Repeat,
        WrapMode::MirroredRepeat,
    ];

    /// Label shown by the parameter panel.
    pub fn label(self) -> &'static str {
        match self {
            WrapMode::ClampToEdge => "CLAMP_TO_EDGE",
            WrapMode::Repeat => "REPEAT",
            WrapMode::MirroredRepeat => "MIRRORED_REPEAT",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "clamp_to_edge" | "clamp" => Some(WrapMode::ClampToEdge),
            "repeat" => Some(WrapMode::Repeat),
            "mirrored_repeat" | "mirror" | "mirror_repeat" => Some(WrapMode::MirroredRepeat),
            _ => None,
        }
    }
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WrapMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        WrapMode::from_label(value).ok_or_else(|| {
            format!(
                "unknown wrapping '{value}'; expected clamp_to_edge, repeat, or mirrored_repeat"
            )
        })
    }
}

/// Shader-side tunables read by the frame renderer every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParameters {
    pub stripe_count: f32,
    pub smoothness: f32,
    pub wrap_mode: WrapMode,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            stripe_count: 30.0,
            smoothness: 0.8,
            wrap_mode: WrapMode::ClampToEdge,
        }
    }
}

/// Everything the parameter panel can write to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSettings {
    pub parameters: EffectParameters,
    pub animation_duration: Duration,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            parameters: EffectParameters::default(),
            animation_duration: default_animation_duration(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StripewipeConfig {
    pub effect: EffectSection,
    pub assets: AssetSection,
    pub window: WindowSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EffectSection {
    pub smoothness: f32,
    pub count: f32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub animation_duration: Duration,
    pub wrapping: WrapMode,
}

impl Default for EffectSection {
    fn default() -> Self {
        let defaults = EffectSettings::default();
        Self {
            smoothness: defaults.parameters.smoothness,
            count: defaults.parameters.stripe_count,
            animation_duration: defaults.animation_duration,
            wrapping: defaults.parameters.wrap_mode,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetSection {
    pub images: Vec<PathBuf>,
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
    #[serde(deserialize_with = "deserialize_duration")]
    pub resize_debounce: Duration,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "stripewipe".to_string(),
            resize_debounce: Duration::from_millis(100),
        }
    }
}

fn default_animation_duration() -> Duration {
    Duration::from_millis(1800)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v.trim())
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl StripewipeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: StripewipeConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates a config file. Relative asset paths are resolved
    /// against the directory containing the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.assets.resolve_relative(base);
        }
        Ok(config)
    }

    pub fn effect_settings(&self) -> EffectSettings {
        EffectSettings {
            parameters: EffectParameters {
                stripe_count: self.effect.count,
                smoothness: self.effect.smoothness,
                wrap_mode: self.effect.wrapping,
            },
            animation_duration: self.effect.animation_duration,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.effect.validate()?;

        let image_count = self.assets.images.len();
        if image_count != 0 && image_count != 2 {
            return Err(ConfigError::Invalid(format!(
                "assets.images must list exactly two images, found {image_count}"
            )));
        }
        if self
            .assets
            .images
            .iter()
            .any(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid(
                "assets.images contains an empty path".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be greater than zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.window.resize_debounce.is_zero()
            || self.window.resize_debounce > MAX_RESIZE_DEBOUNCE
        {
            return Err(ConfigError::Invalid(format!(
                "window.resize_debounce must be within (0, {}]",
                humantime::format_duration(MAX_RESIZE_DEBOUNCE)
            )));
        }

        Ok(())
    }
}

impl EffectSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(SMOOTHNESS_MIN..=SMOOTHNESS_MAX).contains(&self.smoothness) {
            return Err(ConfigError::Invalid(format!(
                "effect.smoothness must be within [{SMOOTHNESS_MIN}, {SMOOTHNESS_MAX}], got {}",
                self.smoothness
            )));
        }
        if !(COUNT_MIN..=COUNT_MAX).contains(&self.count) {
            return Err(ConfigError::Invalid(format!(
                "effect.count must be within [{COUNT_MIN}, {COUNT_MAX}], got {}",
                self.count
            )));
        }
        if self.animation_duration < DURATION_MIN || self.animation_duration > DURATION_MAX {
            return Err(ConfigError::Invalid(format!(
                "effect.animation_duration must be within [{}, {}], got {}",
                humantime::format_duration(DURATION_MIN),
                humantime::format_duration(DURATION_MAX),
                humantime::format_duration(self.animation_duration)
            )));
        }
        Ok(())
    }
}

impl AssetSection {
    pub fn resolve_relative(&mut self, base: &Path) {
        let paths = self
            .images
            .iter_mut()
            .chain(self.vertex_shader.as_mut())
            .chain(self.fragment_shader.as_mut());
        for path in paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
