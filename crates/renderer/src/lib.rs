//! Procedural background renderer.
//!
//! The crate draws a full-surface shader backdrop (grid, data streams, node
//! network, scan lines and a pointer glow) behind an application's content,
//! plus two canvas-based siblings for hosts without a shader pipeline. The
//! overall flow is:
//!
//! ```text
//!   host surface ──▶ probe() ──▶ GraphicsContext ──▶ build() ──▶ Program
//!                                                                │
//!   FrameClock ──▶ FrameScheduler ──▶ BackdropController::on_frame ┘
//!                                         │
//!                                         └─▶ UniformSet::tick ─▶ draw quad
//! ```
//!
//! [`BackdropController`] owns the lifecycle: it probes a context when the
//! background becomes active, builds the program, keeps a single frame
//! request outstanding and releases everything when deactivated or dropped.
//! Hosts plug in through the traits in [`host`]; the `wgpu`/`winit` versions
//! live in [`gpu`] and [`window`].

pub mod animators;
pub mod builder;
pub mod compile;
pub mod controller;
pub mod error;
pub mod gpu;
pub mod host;
pub mod probe;
pub mod runtime;
pub mod shader;
pub mod types;
pub mod uniforms;
pub mod window;

#[cfg(test)]
mod testing;

pub use animators::{AnimatorDriver, Canvas2d, CanvasAnimator, MatrixRain, ParticleField, PixmapCanvas, Rgba};
pub use builder::{build, Program};
pub use compile::validate_source;
pub use controller::{BackdropController, RenderState};
pub use error::{BuildError, CanvasError, FrameError, ProbeError};
pub use host::{FrameClock, FrameToken, GraphicsContext, HostSurface};
pub use probe::probe;
pub use runtime::{FrameScheduler, SchedulerState, SteppedClock};
pub use shader::ShaderSource;
pub use types::{
    ContextStrategies, Layers, Pointer, RendererConfig, ShaderStage, SurfaceRect, SurfaceSize,
    DEFAULT_INTENSITY,
};
pub use window::run_preview;
