//! Canvas-based sibling renderers.
//!
//! These draw with plain 2D primitives instead of a shader pipeline. An
//! animator only knows how to draw one frame onto a [`Canvas2d`];
//! [`AnimatorDriver`] gives it the same lifecycle as the shader background
//! (active and visibility gating, one outstanding frame request, cancellation
//! on teardown).

mod canvas;
pub mod glyphs;
mod particles;
mod rain;

use tracing::debug;

use crate::host::{FrameClock, FrameToken};
use crate::runtime::FrameScheduler;
use crate::types::SurfaceSize;

pub use canvas::PixmapCanvas;
pub use particles::{Particle, ParticleField};
pub use rain::MatrixRain;

/// Straight-alpha colour as used by canvas fill styles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Immediate-mode 2D drawing surface. Coordinates are pixels, Y down.
pub trait Canvas2d {
    fn size(&self) -> SurfaceSize;
    fn resize(&mut self, size: SurfaceSize);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba);
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba);

    /// Draws one glyph with its baseline at `y`.
    fn fill_glyph(&mut self, glyph: char, x: f32, y: f32, font_px: f32, color: Rgba);

    /// Draws `text` left to right from `(x, y)` in fixed-width cells.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_px: f32, color: Rgba) {
        let advance = font_px * glyphs::ADVANCE_RATIO;
        for (index, glyph) in text.chars().enumerate() {
            if !glyph.is_whitespace() {
                self.fill_glyph(glyph, x + index as f32 * advance, y, font_px, color);
            }
        }
    }
}

/// One frame-by-frame canvas effect.
pub trait CanvasAnimator {
    fn name(&self) -> &'static str;

    /// Rebuilds all simulation state for a canvas of `size`.
    fn reset(&mut self, size: SurfaceSize);

    /// Adapts to a new canvas size. Defaults to a full reset.
    fn resized(&mut self, size: SurfaceSize) {
        self.reset(size);
    }

    fn pointer_moved(&mut self, _x: f32, _y: f32) {}

    /// Advances the simulation one step and paints it.
    fn draw(&mut self, canvas: &mut dyn Canvas2d, timestamp_ms: f64);
}

/// Runs a [`CanvasAnimator`] on a canvas from an injectable frame clock.
pub struct AnimatorDriver<A: CanvasAnimator, K: Canvas2d, C: FrameClock> {
    animator: A,
    canvas: K,
    scheduler: FrameScheduler<C>,
    active: bool,
    visible: bool,
    mounted: bool,
}

impl<A: CanvasAnimator, K: Canvas2d, C: FrameClock> AnimatorDriver<A, K, C> {
    pub fn new(animator: A, canvas: K, clock: C, active: bool) -> Self {
        Self {
            animator,
            canvas,
            scheduler: FrameScheduler::new(clock),
            active,
            visible: true,
            mounted: false,
        }
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn canvas(&self) -> &K {
        &self.canvas
    }

    pub fn clock(&self) -> &C {
        self.scheduler.clock()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        self.scheduler.clock_mut()
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.scheduler.pending()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        if self.active {
            self.start();
        }
    }

    pub fn unmount(&mut self) {
        self.scheduler.deactivate();
        self.mounted = false;
    }

    /// Starting again rebuilds the simulation from scratch.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        debug!(animator = self.animator.name(), active, "animator activation changed");
        if !self.mounted {
            return;
        }
        if active {
            self.start();
        } else {
            self.scheduler.deactivate();
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            if self.mounted {
                self.scheduler.activate(self.active, true);
            }
        } else {
            self.scheduler.deactivate();
        }
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        self.canvas.resize(size);
        self.animator.resized(self.canvas.size());
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if self.mounted && self.active {
            self.animator.pointer_moved(x, y);
        }
    }

    /// Draws one frame for the host's callback `token`; stale tokens are
    /// ignored.
    pub fn on_frame(&mut self, token: FrameToken, timestamp_ms: f64) {
        if !self.scheduler.accept(token) {
            return;
        }
        if !(self.mounted && self.active && self.visible) {
            return;
        }
        self.animator.draw(&mut self.canvas, timestamp_ms);
        self.scheduler.reschedule();
    }

    fn start(&mut self) {
        self.animator.reset(self.canvas.size());
        if self.visible {
            self.scheduler.activate(self.active, true);
        }
    }
}

impl<A: CanvasAnimator, K: Canvas2d, C: FrameClock> Drop for AnimatorDriver<A, K, C> {
    fn drop(&mut self) {
        self.scheduler.deactivate();
    }
}
