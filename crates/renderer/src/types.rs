use std::fmt;

use bitflags::bitflags;

/// Default overlay strength used when the embedding page does not supply one.
pub const DEFAULT_INTENSITY: f32 = 0.3;

/// Kind of programmable stage a shader source targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Size of a drawing surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width and height as the float pair written to `u_resolution`.
    pub fn as_resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Placement of the surface in page (window) coordinates, Y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn from_size(size: SurfaceSize) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: size.width as f32,
            height: size.height as f32,
        }
    }
}

/// Pointer location in surface pixels with the shader's Y-up convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Centre of a surface, used until the first pointer-move arrives.
    pub fn centre_of(size: SurfaceSize) -> Self {
        Self::new(size.width as f32 * 0.5, size.height as f32 * 0.5)
    }

    pub fn as_array(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

bitflags! {
    /// Procedural layers of the background fragment stage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Layers: u32 {
        const GRID = 1 << 0;
        const STREAMS = 1 << 1;
        const NETWORK = 1 << 2;
        const SCANS = 1 << 3;
        const POINTER_GLOW = 1 << 4;
    }
}

impl Default for Layers {
    fn default() -> Self {
        Layers::all()
    }
}

impl Layers {
    /// Resolves a layer from its configuration name.
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "grid" => Some(Layers::GRID),
            "streams" | "data-streams" => Some(Layers::STREAMS),
            "network" => Some(Layers::NETWORK),
            "scans" | "scan-lines" => Some(Layers::SCANS),
            "pointer" | "pointer-glow" => Some(Layers::POINTER_GLOW),
            _ => None,
        }
    }
}

/// Blend equation applied to every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    Alpha,
}

/// Ordered list of graphics API names tried when acquiring a context.
///
/// The first name a host accepts wins; later entries act as legacy
/// fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextStrategies(Vec<String>);

impl ContextStrategies {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ContextStrategies {
    fn default() -> Self {
        Self::new(["primary", "gl"])
    }
}

/// Configuration handed to the renderer by the embedding application.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Whether the background starts active.
    pub active: bool,
    /// Overall strength of every procedural layer, in `[0, 1]`.
    pub intensity: f32,
    /// Layers enabled in the fragment stage.
    pub layers: Layers,
    /// Context acquisition order.
    pub strategies: ContextStrategies,
    /// Initial preview window size in physical pixels.
    pub surface_size: SurfaceSize,
    /// Title of the preview window.
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            active: true,
            intensity: DEFAULT_INTENSITY,
            layers: Layers::default(),
            strategies: ContextStrategies::default(),
            surface_size: SurfaceSize::new(1280, 720),
            title: "Backdrop Preview".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_names_resolve_to_flags() {
        assert_eq!(Layers::from_config_name("grid"), Some(Layers::GRID));
        assert_eq!(Layers::from_config_name(" Pointer-Glow "), Some(Layers::POINTER_GLOW));
        assert_eq!(Layers::from_config_name("scan-lines"), Some(Layers::SCANS));
        assert_eq!(Layers::from_config_name("bloom"), None);
        assert_eq!(Layers::default().bits(), 0b1_1111);
    }

    #[test]
    fn default_strategies_prefer_primary_then_gl() {
        let names: Vec<_> = ContextStrategies::default().iter().map(str::to_owned).collect();
        assert_eq!(names, vec!["primary".to_string(), "gl".to_string()]);
    }
}
