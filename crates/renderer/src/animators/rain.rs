use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::glyphs::RAIN_GLYPHS;
use super::{Canvas2d, CanvasAnimator, Rgba};
use crate::types::SurfaceSize;

/// Cell size of the rain grid, also its font size.
pub const CELL_PX: f32 = 14.0;
/// Chance per frame that a drop below the bottom edge restarts at the top.
pub const RESET_PROBABILITY: f64 = 0.025;

const TRAIL: Rgba = Rgba::new(13, 17, 23, 0.05);
const GLYPH: Rgba = Rgba::new(56, 166, 255, 0.1);

/// Falling glyph columns, one drop per 14 px column.
pub struct MatrixRain {
    rng: StdRng,
    glyphs: Vec<char>,
    size: SurfaceSize,
    drops: Vec<u32>,
}

impl MatrixRain {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            glyphs: RAIN_GLYPHS.chars().collect(),
            size: SurfaceSize::default(),
            drops: Vec::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    /// Row index of each column's leading glyph.
    pub fn drops(&self) -> &[u32] {
        &self.drops
    }
}

impl Default for MatrixRain {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasAnimator for MatrixRain {
    fn name(&self) -> &'static str {
        "matrix-rain"
    }

    fn reset(&mut self, size: SurfaceSize) {
        self.size = size;
        let columns = (size.width as f32 / CELL_PX).floor() as usize;
        let rows = size.height as f32 / CELL_PX;
        self.drops = (0..columns)
            .map(|_| (self.rng.gen::<f32>() * rows).floor() as u32)
            .collect();
    }

    fn draw(&mut self, canvas: &mut dyn Canvas2d, _timestamp_ms: f64) {
        let width = self.size.width as f32;
        let height = self.size.height as f32;
        canvas.fill_rect(0.0, 0.0, width, height, TRAIL);

        for (column, drop) in self.drops.iter_mut().enumerate() {
            let glyph = self.glyphs[self.rng.gen_range(0..self.glyphs.len())];
            canvas.fill_glyph(glyph, column as f32 * CELL_PX, *drop as f32 * CELL_PX, CELL_PX, GLYPH);

            if *drop as f32 * CELL_PX > height && self.rng.gen_bool(RESET_PROBABILITY) {
                *drop = 0;
            }
            *drop += 1;
        }
    }
}
