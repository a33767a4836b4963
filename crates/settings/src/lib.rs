use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use renderer::{ContextStrategies, Layers, RendererConfig, SurfaceSize, DEFAULT_INTENSITY};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackdropSettings {
    pub version: u32,
    #[serde(default)]
    pub renderer: RendererSection,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub animate: AnimateSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RendererSection {
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_layers")]
    pub layers: Vec<String>,
    #[serde(default = "default_apis")]
    pub apis: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowSection {
    #[serde(default = "default_window_width")]
    pub width: u32,
    #[serde(default = "default_window_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimatorKind {
    Rain,
    Particles,
}

impl fmt::Display for AnimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimatorKind::Rain => f.write_str("rain"),
            AnimatorKind::Particles => f.write_str("particles"),
        }
    }
}

/// Headless frame export.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnimateSection {
    #[serde(default = "default_animator")]
    pub animator: AnimatorKind,
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(
        default = "default_frame_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub frame_interval: Duration,
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_intensity() -> f32 {
    DEFAULT_INTENSITY
}

fn default_layers() -> Vec<String> {
    ["grid", "streams", "network", "scans", "pointer-glow"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_apis() -> Vec<String> {
    ContextStrategies::default().iter().map(String::from).collect()
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_title() -> String {
    "Backdrop Preview".to_string()
}

fn default_animator() -> AnimatorKind {
    AnimatorKind::Rain
}

fn default_frames() -> u32 {
    30
}

fn default_frame_interval() -> Duration {
    Duration::from_millis(33)
}

fn default_canvas_width() -> u32 {
    640
}

fn default_canvas_height() -> u32 {
    360
}

impl Default for RendererSection {
    fn default() -> Self {
        Self {
            active: default_true(),
            intensity: default_intensity(),
            layers: default_layers(),
            apis: default_apis(),
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            title: default_title(),
        }
    }
}

impl Default for AnimateSection {
    fn default() -> Self {
        Self {
            animator: default_animator(),
            frames: default_frames(),
            frame_interval: default_frame_interval(),
            width: default_canvas_width(),
            height: default_canvas_height(),
            seed: None,
        }
    }
}

impl Default for BackdropSettings {
    fn default() -> Self {
        Self {
            version: 1,
            renderer: RendererSection::default(),
            window: WindowSection::default(),
            animate: AnimateSection::default(),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of milliseconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_millis(v as u64))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_millis(v))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v / 1000.0)
            .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

impl BackdropSettings {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: BackdropSettings = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let intensity = self.renderer.intensity;
        if !(0.0..=1.0).contains(&intensity) {
            return Err(ConfigError::Invalid(format!(
                "renderer.intensity must be within [0, 1], got {intensity}"
            )));
        }

        self.layers()?;

        if self.renderer.apis.is_empty() {
            return Err(ConfigError::Invalid(
                "renderer.apis must list at least one graphics API".into(),
            ));
        }
        if let Some(api) = self.renderer.apis.iter().find(|api| api.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "renderer.apis contains an empty entry '{api}'"
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window width and height must be greater than zero".into(),
            ));
        }

        let animate = &self.animate;
        if animate.frames == 0 {
            return Err(ConfigError::Invalid(
                "animate.frames must be greater than zero".into(),
            ));
        }
        if animate.frame_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "animate.frame_interval must be greater than zero".into(),
            ));
        }
        if animate.width == 0 || animate.height == 0 {
            return Err(ConfigError::Invalid(
                "animate width and height must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Resolves the configured layer names into a bitmask.
    pub fn layers(&self) -> Result<Layers, ConfigError> {
        self.renderer
            .layers
            .iter()
            .try_fold(Layers::empty(), |acc, name| {
                Layers::from_config_name(name)
                    .map(|layer| acc | layer)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown layer '{name}'")))
            })
    }

    pub fn to_renderer_config(&self) -> Result<RendererConfig, ConfigError> {
        Ok(RendererConfig {
            active: self.renderer.active,
            intensity: self.renderer.intensity,
            layers: self.layers()?,
            strategies: ContextStrategies::new(self.renderer.apis.iter().map(|api| api.trim())),
            surface_size: SurfaceSize::new(self.window.width, self.window.height),
            title: self.window.title.clone(),
        })
    }
}

impl AnimateSection {
    pub fn canvas_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}
