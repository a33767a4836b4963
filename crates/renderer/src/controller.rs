//! Lifecycle of one background renderer instance.
//!
//! [`BackdropController`] owns the activation flag, the capability result, the
//! pipeline built for the current activation cycle, and the frame scheduler.
//! Hosts forward their events to it: pointer moves, resizes, visibility
//! changes and frame callbacks. Every failure is logged and folded into
//! `supported = false`; nothing propagates to the host.

use tracing::{debug, warn};

use crate::builder::{self, Program, QUAD_VERTEX_COUNT};
use crate::error::FrameError;
use crate::host::{FrameClock, FrameToken, GraphicsContext, HostSurface, UniformValue};
use crate::probe::probe;
use crate::runtime::FrameScheduler;
use crate::shader::ShaderSource;
use crate::types::{ContextStrategies, Layers, Pointer, RendererConfig, SurfaceSize};
use crate::uniforms::{page_to_surface, UniformSet};

/// Fully transparent clear colour; the page shows through untouched pixels.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Snapshot of the controller's externally observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub active: bool,
    pub supported: bool,
    /// Outstanding frame request; present iff a frame is scheduled.
    pub frame: Option<FrameToken>,
}

struct Pipeline {
    ctx: Box<dyn GraphicsContext>,
    program: Program,
}

impl Pipeline {
    fn release(self) {
        let Pipeline { mut ctx, program } = self;
        program.release(ctx.as_mut());
    }
}

pub struct BackdropController<S: HostSurface, C: FrameClock> {
    surface: S,
    scheduler: FrameScheduler<C>,
    strategies: ContextStrategies,
    source: ShaderSource,
    uniforms: UniformSet,
    pipeline: Option<Pipeline>,
    active: bool,
    supported: bool,
    visible: bool,
    mounted: bool,
    tracking_pointer: bool,
}

impl<S: HostSurface, C: FrameClock> BackdropController<S, C> {
    pub fn new(surface: S, clock: C, config: &RendererConfig) -> Self {
        Self {
            surface,
            scheduler: FrameScheduler::new(clock),
            strategies: config.strategies.clone(),
            source: ShaderSource::backdrop(),
            uniforms: UniformSet::new(config.intensity, config.layers),
            pipeline: None,
            active: config.active,
            supported: false,
            visible: true,
            mounted: false,
            tracking_pointer: false,
        }
    }

    /// Replaces the shader pair built on the next activation.
    pub fn with_source(mut self, source: ShaderSource) -> Self {
        self.source = source;
        self
    }

    pub fn state(&self) -> RenderState {
        RenderState {
            active: self.active,
            supported: self.supported,
            frame: self.scheduler.pending(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clock(&self) -> &C {
        self.scheduler.clock()
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_tracking_pointer(&self) -> bool {
        self.tracking_pointer
    }

    /// Attaches the renderer to its surface and starts it when active.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        debug!(active = self.active, "backdrop mounted");
        if self.active {
            self.start();
        }
    }

    /// Stops the loop and releases everything. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop();
        self.mounted = false;
        debug!("backdrop unmounted");
    }

    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        debug!(active, "backdrop activation changed");
        if !self.mounted {
            return;
        }
        if active {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Stores a new strength, clamped to `[0, 1]`; the next frame writes it.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.uniforms.set_intensity(intensity);
    }

    pub fn set_layers(&mut self, layers: Layers) {
        self.uniforms.layers = layers;
    }

    /// Records a page-space pointer position and writes it straight into the
    /// bound program, without waiting for the next frame.
    pub fn pointer_moved(&mut self, page_x: f32, page_y: f32) {
        if !self.tracking_pointer {
            return;
        }
        self.uniforms.pointer = page_to_surface(page_x, page_y, self.surface.bounding_rect());
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline
                .ctx
                .set_uniform(UniformValue::Pointer(self.uniforms.pointer.as_array()));
        }
    }

    /// Notes a resize. The next frame reads the new size back from the
    /// surface; the pipeline is left as is.
    pub fn resized(&mut self) {
        let size = self.surface.display_size();
        debug!(width = size.width, height = size.height, "surface resized");
    }

    /// Parks the loop while hidden and resumes it when shown again.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        debug!(visible, "backdrop visibility changed");
        if visible {
            if self.pipeline.is_some() {
                self.scheduler.activate(self.active, self.supported);
            }
        } else {
            self.scheduler.deactivate();
        }
    }

    /// Runs one frame for the host's callback `token`.
    ///
    /// Stale tokens, and callbacks arriving after the gate has closed, do
    /// nothing.
    pub fn on_frame(&mut self, token: FrameToken, timestamp_ms: f64) {
        if !self.scheduler.accept(token) {
            return;
        }
        if !(self.active && self.supported && self.visible) {
            return;
        }
        let size = self.surface.display_size();
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };

        if !size.is_empty() {
            match render_frame(pipeline.ctx.as_mut(), &mut self.uniforms, size, timestamp_ms) {
                Ok(()) => {}
                Err(FrameError::Transient(reason)) => {
                    debug!(%reason, "frame skipped");
                }
                Err(err @ FrameError::ContextLost(_)) => {
                    warn!(error = %err, "disabling backdrop");
                    self.release_pipeline();
                    self.supported = false;
                    return;
                }
            }
        }
        self.scheduler.reschedule();
    }

    fn start(&mut self) {
        self.release_pipeline();
        self.supported = false;
        self.tracking_pointer = true;

        let mut ctx = match probe(&mut self.surface, &self.strategies) {
            Ok(ctx) => ctx,
            Err(_) => return,
        };
        let program = match builder::build(ctx.as_mut(), &self.source) {
            Ok(program) => program,
            Err(err) => {
                warn!(error = %err, "backdrop shader pipeline unavailable");
                return;
            }
        };

        ctx.use_program(program.handle);
        self.uniforms.pointer = Pointer::centre_of(self.surface.display_size());
        self.uniforms.write(ctx.as_mut());
        self.pipeline = Some(Pipeline { ctx, program });
        self.supported = true;

        if self.visible {
            self.scheduler.activate(self.active, self.supported);
        }
    }

    fn stop(&mut self) {
        self.scheduler.deactivate();
        self.tracking_pointer = false;
        self.release_pipeline();
    }

    fn release_pipeline(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.release();
        }
    }
}

impl<S: HostSurface, C: FrameClock> Drop for BackdropController<S, C> {
    fn drop(&mut self) {
        self.scheduler.deactivate();
        self.release_pipeline();
    }
}

fn render_frame(
    ctx: &mut dyn GraphicsContext,
    uniforms: &mut UniformSet,
    size: SurfaceSize,
    timestamp_ms: f64,
) -> Result<(), FrameError> {
    ctx.resize_backing(size);
    ctx.set_viewport(0, 0, size.width, size.height);
    ctx.begin_frame()?;
    ctx.clear(CLEAR_COLOR);
    uniforms.tick(timestamp_ms, size, ctx);
    ctx.draw_triangles(0, QUAD_VERTEX_COUNT);
    ctx.end_frame()
}
