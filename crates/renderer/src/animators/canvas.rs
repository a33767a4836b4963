use std::path::Path;

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Stroke, Transform};
use tracing::warn;

use super::glyphs::{lit_cells, ADVANCE_RATIO, GLYPH_COLUMNS, GLYPH_ROWS};
use super::{Canvas2d, Rgba};
use crate::error::CanvasError;
use crate::types::SurfaceSize;

/// Software [`Canvas2d`] rendering into a `tiny-skia` pixmap.
pub struct PixmapCanvas {
    pixmap: Pixmap,
}

fn allocate(size: SurfaceSize) -> Result<Pixmap, CanvasError> {
    Pixmap::new(size.width, size.height).ok_or(CanvasError::Allocation {
        width: size.width,
        height: size.height,
    })
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.alpha_u8());
    paint.anti_alias = true;
    paint
}

/// Paint for pixel-aligned rects. tiny-skia's anti-aliased rect filler
/// asserts on sub-pixel extents, so rects never go through it.
fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = paint(color);
    paint.anti_alias = false;
    paint
}

impl PixmapCanvas {
    pub fn new(size: SurfaceSize) -> Result<Self, CanvasError> {
        Ok(Self {
            pixmap: allocate(size)?,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), CanvasError> {
        self.pixmap
            .save_png(path)
            .map_err(|err| CanvasError::Encode(err.to_string()))
    }

    /// Fills the pixels covered by `[left, right) x [top, bottom)` after
    /// snapping each edge down to the pixel grid. Non-empty input always
    /// covers at least one pixel; anything outside the pixmap is dropped.
    fn fill_snapped(&mut self, left: f32, top: f32, right: f32, bottom: f32, paint: &Paint) {
        if !(left.is_finite() && top.is_finite() && right.is_finite() && bottom.is_finite()) {
            return;
        }
        let x0 = left.floor();
        let y0 = top.floor();
        let x1 = right.floor().max(x0 + 1.0);
        let y1 = bottom.floor().max(y0 + 1.0);

        let x0 = x0.max(0.0);
        let y0 = y0.max(0.0);
        let x1 = x1.min(self.pixmap.width() as f32);
        let y1 = y1.min(self.pixmap.height() as f32);
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        if let Some(rect) = Rect::from_ltrb(x0, y0, x1, y1) {
            self.pixmap
                .fill_rect(rect, paint, Transform::identity(), None);
        }
    }
}

impl Canvas2d for PixmapCanvas {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Resizing clears the canvas, like assigning a new size to an HTML canvas.
    fn resize(&mut self, size: SurfaceSize) {
        match allocate(size) {
            Ok(pixmap) => self.pixmap = pixmap,
            Err(err) => warn!(error = %err, "keeping previous canvas size"),
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.fill_snapped(x, y, x + width, y + height, &solid(color));
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.pixmap.fill_path(
                &path,
                &paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.0, from.1);
        builder.line_to(to.0, to.1);
        let Some(path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    fn fill_glyph(&mut self, glyph: char, x: f32, y: f32, font_px: f32, color: Rgba) {
        let cell_width = font_px * ADVANCE_RATIO / GLYPH_COLUMNS as f32;
        let cell_height = font_px / GLYPH_ROWS as f32;
        let top = y - font_px;
        let paint = solid(color);
        for (column, row) in lit_cells(glyph) {
            let left = x + column as f32 * cell_width;
            let upper = top + row as f32 * cell_height;
            self.fill_snapped(left, upper, left + cell_width, upper + cell_height, &paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animators::{CanvasAnimator, MatrixRain, ParticleField};

    #[test]
    fn zero_sized_canvas_is_rejected() {
        assert!(matches!(
            PixmapCanvas::new(SurfaceSize::new(0, 10)),
            Err(CanvasError::Allocation { width: 0, height: 10 })
        ));
    }

    #[test]
    fn opaque_rect_covers_its_pixels() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(8, 8)).expect("canvas");
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgba::new(255, 0, 0, 1.0));

        let inside = canvas.pixel(1, 1).expect("pixel");
        assert_eq!((inside.red(), inside.alpha()), (255, 255));
        let outside = canvas.pixel(6, 6).expect("pixel");
        assert_eq!(outside.alpha(), 0);
    }

    #[test]
    fn translucent_trail_accumulates() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(4, 4)).expect("canvas");
        let trail = Rgba::new(13, 17, 23, 0.05);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, trail);
        let once = canvas.pixel(0, 0).expect("pixel").alpha();
        for _ in 0..20 {
            canvas.fill_rect(0.0, 0.0, 4.0, 4.0, trail);
        }
        assert!(canvas.pixel(0, 0).expect("pixel").alpha() > once);
    }

    #[test]
    fn circle_fills_its_centre() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(16, 16)).expect("canvas");
        canvas.fill_circle(8.0, 8.0, 3.0, Rgba::new(59, 130, 246, 1.0));
        assert_eq!(canvas.pixel(8, 8).expect("pixel").alpha(), 255);
        assert_eq!(canvas.pixel(0, 0).expect("pixel").alpha(), 0);
    }

    #[test]
    fn resize_replaces_the_pixmap() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(4, 4)).expect("canvas");
        canvas.resize(SurfaceSize::new(10, 6));
        assert_eq!(canvas.size(), SurfaceSize::new(10, 6));
        canvas.resize(SurfaceSize::new(0, 0));
        assert_eq!(canvas.size(), SurfaceSize::new(10, 6));
    }

    fn painted_pixels(canvas: &PixmapCanvas) -> usize {
        canvas
            .pixmap()
            .pixels()
            .iter()
            .filter(|pixel| pixel.alpha() > 0)
            .count()
    }

    #[test]
    fn glyph_cells_snap_to_whole_pixels() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(16, 16)).expect("canvas");
        // 5 px glyph: every cell is a fraction of a pixel wide.
        canvas.fill_glyph('W', 0.3, 10.7, 5.0, Rgba::new(34, 197, 94, 1.0));

        assert!(painted_pixels(&canvas) > 0);
        let lit = canvas
            .pixmap()
            .pixels()
            .iter()
            .filter(|pixel| pixel.alpha() > 0)
            .all(|pixel| pixel.alpha() == 255);
        assert!(lit, "snapped cells are never partially covered");
    }

    #[test]
    fn glyph_partly_off_canvas_is_clipped() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(12, 12)).expect("canvas");
        let color = Rgba::new(34, 197, 94, 1.0);
        canvas.fill_glyph('M', -4.5, 6.2, 14.0, color);
        canvas.fill_glyph('M', 9.5, 30.0, 14.0, color);
        canvas.fill_glyph('M', 100.0, 100.0, 14.0, color);
        assert_eq!(canvas.size(), SurfaceSize::new(12, 12));
    }

    #[test]
    fn fractional_rect_covers_at_least_one_pixel() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(8, 8)).expect("canvas");
        canvas.fill_rect(2.2, 3.6, 0.3, 0.2, Rgba::new(255, 255, 255, 1.0));
        assert_eq!(painted_pixels(&canvas), 1);
        assert_eq!(canvas.pixel(2, 3).expect("pixel").alpha(), 255);
    }

    #[test]
    fn matrix_rain_frames_render_on_a_pixmap() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(320, 200)).expect("canvas");
        let mut rain = MatrixRain::with_seed(11);
        rain.reset(canvas.size());
        for frame in 0..30 {
            rain.draw(&mut canvas, frame as f64 * 16.0);
        }
        assert!(painted_pixels(&canvas) > 0);
    }

    #[test]
    fn particle_field_frames_render_on_a_pixmap() {
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(400, 300)).expect("canvas");
        let mut field = ParticleField::with_seed(5);
        field.reset(canvas.size());
        field.pointer_moved(200.0, 150.0);
        for frame in 0..30 {
            field.draw(&mut canvas, frame as f64 * 16.0);
        }
        assert!(painted_pixels(&canvas) > 0);
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame.png");
        let mut canvas = PixmapCanvas::new(SurfaceSize::new(20, 20)).expect("canvas");
        canvas.fill_glyph('A', 2.0, 16.0, 14.0, Rgba::new(56, 166, 255, 1.0));
        canvas.save_png(&path).expect("png written");
        assert!(path.metadata().expect("metadata").len() > 0);
    }
}
