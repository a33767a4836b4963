//! `wgpu` implementation of the drawing context.
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` bakes render pipelines from a linked program's modules,
//!   vertex layout and blend mode.
//! - `uniforms` mirrors the fragment stage's std140 parameter block.
//! - `state` maps GL-style handles onto `wgpu` objects and records draws for
//!   one render pass per frame.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub use context::backends_for;
pub use state::WgpuGraphics;
