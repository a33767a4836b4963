use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::glyphs::FIELD_GLYPHS;
use super::{Canvas2d, CanvasAnimator, Rgba};
use crate::types::{Pointer, SurfaceSize};

/// Canvas area, in square pixels, that earns one particle.
pub const AREA_PER_PARTICLE: f32 = 15_000.0;
/// Distance under which the pointer attracts and particles link.
pub const REACH_PX: f32 = 100.0;
const ATTRACTION: f32 = 0.001;
const LINK_ALPHA: f32 = 0.1;
const LINK_WIDTH: f32 = 0.5;
const GLYPHS_PER_FRAME: usize = 50;
const GLYPH_PX: f32 = 12.0;
const CODE_PX: f32 = 14.0;
/// Horizontal room kept free to the right of each code line.
const CODE_MARGIN: f32 = 200.0;

const TRAIL: Rgba = Rgba::new(15, 23, 42, 0.05);
const PARTICLE: Rgba = Rgba::new(59, 130, 246, 1.0);
const GLYPH: Rgba = Rgba::new(0, 255, 0, 0.05);
const CODE: Rgba = Rgba::new(100, 116, 139, 0.1);

const CODE_LINES: [&str; 12] = [
    "class Engineer {",
    "  solve(problem) {",
    "    return solution;",
    "  }",
    "}",
    "const skills = [",
    "  \"React\", \"Node.js\",",
    "  \"Python\", \"AWS\"",
    "];",
    "while(learning) {",
    "  grow();",
    "}",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub opacity: f32,
}

impl Particle {
    fn step(&mut self, width: f32, height: f32, pointer: Option<Pointer>) {
        self.x += self.vx;
        self.y += self.vy;

        if self.x < 0.0 || self.x > width {
            self.vx = -self.vx;
        }
        if self.y < 0.0 || self.y > height {
            self.vy = -self.vy;
        }

        if let Some(pointer) = pointer {
            let dx = pointer.x - self.x;
            let dy = pointer.y - self.y;
            let distance = dx.hypot(dy);
            if distance < REACH_PX {
                let force = (REACH_PX - distance) / REACH_PX;
                self.vx += dx * force * ATTRACTION;
                self.vy += dy * force * ATTRACTION;
            }
        }
    }
}

/// Opacity of the link between two particles `distance` apart, if linked.
pub fn link_alpha(distance: f32) -> Option<f32> {
    (distance < REACH_PX).then(|| LINK_ALPHA * (1.0 - distance / REACH_PX))
}

/// Drifting particle network with pointer attraction, glyph noise and
/// floating code lines.
pub struct ParticleField {
    rng: StdRng,
    glyphs: Vec<char>,
    size: SurfaceSize,
    particles: Vec<Particle>,
    pointer: Option<Pointer>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            glyphs: FIELD_GLYPHS.chars().collect(),
            size: SurfaceSize::default(),
            particles: Vec::new(),
            pointer: None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    fn draw_glyph_noise(&mut self, canvas: &mut dyn Canvas2d) {
        let width = self.size.width as f32;
        let height = self.size.height as f32;
        for _ in 0..GLYPHS_PER_FRAME {
            let glyph = self.glyphs[self.rng.gen_range(0..self.glyphs.len())];
            let x = self.rng.gen::<f32>() * width;
            let y = self.rng.gen::<f32>() * height;
            canvas.fill_glyph(glyph, x, y, GLYPH_PX, GLYPH);
        }
    }

    fn draw_network(&mut self, canvas: &mut dyn Canvas2d) {
        let width = self.size.width as f32;
        let height = self.size.height as f32;
        for particle in &mut self.particles {
            particle.step(width, height, self.pointer);
        }

        for (index, particle) in self.particles.iter().enumerate() {
            canvas.fill_circle(
                particle.x,
                particle.y,
                particle.radius,
                PARTICLE.with_alpha(particle.opacity),
            );
            for other in &self.particles[index + 1..] {
                let distance = (particle.x - other.x).hypot(particle.y - other.y);
                if let Some(alpha) = link_alpha(distance) {
                    canvas.stroke_line(
                        (particle.x, particle.y),
                        (other.x, other.y),
                        LINK_WIDTH,
                        PARTICLE.with_alpha(alpha),
                    );
                }
            }
        }
    }

    fn draw_code(&mut self, canvas: &mut dyn Canvas2d, seconds: f64) {
        let span = (self.size.width as f32 - CODE_MARGIN).max(0.0);
        for (index, line) in CODE_LINES.iter().enumerate() {
            let x = self.rng.gen::<f32>() * span;
            let wave = (seconds + index as f64).sin() as f32 * 10.0;
            let y = 50.0 + index as f32 * 30.0 + wave;
            canvas.fill_text(line, x, y, CODE_PX, CODE);
        }
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasAnimator for ParticleField {
    fn name(&self) -> &'static str {
        "particle-field"
    }

    fn reset(&mut self, size: SurfaceSize) {
        self.size = size;
        let width = size.width as f32;
        let height = size.height as f32;
        let count = (width * height / AREA_PER_PARTICLE).floor() as usize;
        let rng = &mut self.rng;
        self.particles = (0..count)
            .map(|_| Particle {
                x: rng.gen::<f32>() * width,
                y: rng.gen::<f32>() * height,
                vx: (rng.gen::<f32>() - 0.5) * 0.5,
                vy: (rng.gen::<f32>() - 0.5) * 0.5,
                radius: rng.gen::<f32>() * 2.0 + 1.0,
                opacity: rng.gen::<f32>() * 0.5 + 0.2,
            })
            .collect();
    }

    /// Particles keep drifting; only the bounds change.
    fn resized(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Some(Pointer::new(x, y));
    }

    fn draw(&mut self, canvas: &mut dyn Canvas2d, timestamp_ms: f64) {
        canvas.fill_rect(
            0.0,
            0.0,
            self.size.width as f32,
            self.size.height as f32,
            TRAIL,
        );
        self.draw_glyph_noise(canvas);
        self.draw_network(canvas);
        self.draw_code(canvas, timestamp_ms * 0.001);
    }
}
