use crate::host::{GraphicsContext, UniformValue};
use crate::types::{Layers, Pointer, SurfaceRect, SurfaceSize, DEFAULT_INTENSITY};

/// Converts a frame timestamp in milliseconds to shader seconds.
pub fn time_from_millis(timestamp_ms: f64) -> f32 {
    (timestamp_ms / 1000.0) as f32
}

/// Mirrors `y` across a surface of the given height.
///
/// Page coordinates grow downward and shader coordinates grow upward; applying
/// the flip twice with the same height returns the input.
pub fn flip_vertical(y: f32, height: f32) -> f32 {
    height - y
}

/// Maps a page-space pointer position into surface pixels, Y up.
pub fn page_to_surface(page_x: f32, page_y: f32, rect: SurfaceRect) -> Pointer {
    Pointer::new(page_x - rect.left, flip_vertical(page_y - rect.top, rect.height))
}

/// Current values of every uniform the fragment stage reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSet {
    pub time: f32,
    pub resolution: [f32; 2],
    pub pointer: Pointer,
    pub intensity: f32,
    pub layers: Layers,
}

impl Default for UniformSet {
    fn default() -> Self {
        Self {
            time: 0.0,
            resolution: [0.0, 0.0],
            pointer: Pointer::default(),
            intensity: DEFAULT_INTENSITY,
            layers: Layers::default(),
        }
    }
}

impl UniformSet {
    pub fn new(intensity: f32, layers: Layers) -> Self {
        Self {
            intensity: intensity.clamp(0.0, 1.0),
            layers,
            ..Self::default()
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    /// Refreshes time and resolution, then writes every uniform into the
    /// bound program. Issues no draw call.
    ///
    /// `surface` is read fresh each frame rather than cached from the last
    /// resize notification.
    pub fn tick(&mut self, timestamp_ms: f64, surface: SurfaceSize, ctx: &mut dyn GraphicsContext) {
        self.time = time_from_millis(timestamp_ms);
        self.resolution = surface.as_resolution();
        self.write(ctx);
    }

    /// Writes the stored values without recomputing anything.
    pub fn write(&self, ctx: &mut dyn GraphicsContext) {
        ctx.set_uniform(UniformValue::Time(self.time));
        ctx.set_uniform(UniformValue::Resolution(self.resolution));
        ctx.set_uniform(UniformValue::Pointer(self.pointer.as_array()));
        ctx.set_uniform(UniformValue::Intensity(self.intensity));
        ctx.set_uniform(UniformValue::Layers(self.layers.bits()));
    }
}
