//! Seams between the renderer and whatever hosts it.
//!
//! The renderer never talks to a window system or a GPU API directly. A host
//! provides a [`HostSurface`] that hands out [`GraphicsContext`]s by API name
//! and a [`FrameClock`] that runs one callback per display refresh. The
//! `wgpu`/`winit` implementations live in [`crate::gpu`] and
//! [`crate::window`].

use crate::error::FrameError;
use crate::types::{BlendMode, ShaderStage, SurfaceRect, SurfaceSize};

/// Opaque handle to a compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Opaque handle to a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque handle to a static vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Token identifying one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Value written into one of the program's uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Time(f32),
    Resolution([f32; 2]),
    Pointer([f32; 2]),
    Intensity(f32),
    Layers(u32),
}

impl UniformValue {
    /// Name of the uniform as declared by the fragment stage.
    pub fn name(&self) -> &'static str {
        match self {
            UniformValue::Time(_) => "u_time",
            UniformValue::Resolution(_) => "u_resolution",
            UniformValue::Pointer(_) => "u_pointer",
            UniformValue::Intensity(_) => "u_intensity",
            UniformValue::Layers(_) => "u_layers",
        }
    }
}

/// GL-style drawing context acquired from a [`HostSurface`].
///
/// Every object it creates is identified by a handle and must be released
/// through the matching `delete_*` call. Uniform writes target the program
/// last passed to [`use_program`](GraphicsContext::use_program).
pub trait GraphicsContext {
    /// API name this context was acquired under.
    fn api(&self) -> &str;

    /// Compiles one stage, returning the compiler log on failure.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;
    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Links two compiled stages, returning the linker log on failure.
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String>;
    fn delete_program(&mut self, program: ProgramHandle);

    /// Uploads immutable vertex data once.
    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferHandle;
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Feeds `location` of `program` from `buffer`, `components` floats per vertex.
    fn bind_attribute(
        &mut self,
        program: ProgramHandle,
        location: u32,
        buffer: BufferHandle,
        components: u32,
    );

    fn set_blend(&mut self, blend: Option<BlendMode>);
    fn use_program(&mut self, program: ProgramHandle);
    fn set_uniform(&mut self, value: UniformValue);

    /// Matches the backing store to `size`; a no-op when nothing changed.
    fn resize_backing(&mut self, size: SurfaceSize);
    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn begin_frame(&mut self) -> Result<(), FrameError>;
    fn clear(&mut self, rgba: [f32; 4]);
    fn draw_triangles(&mut self, first: u32, count: u32);
    fn end_frame(&mut self) -> Result<(), FrameError>;
}

/// Drawing surface owned by the host.
pub trait HostSurface {
    /// Size the surface is currently displayed at.
    fn display_size(&self) -> SurfaceSize;

    /// Placement of the surface in page coordinates.
    fn bounding_rect(&self) -> SurfaceRect {
        SurfaceRect::from_size(self.display_size())
    }

    /// Tries to create a drawing context for the named API.
    fn acquire_context(&mut self, api: &str) -> Option<Box<dyn GraphicsContext>>;
}

/// "Run this once before the next repaint" facility.
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

impl<T: FrameClock + ?Sized> FrameClock for Box<T> {
    fn request_frame(&mut self) -> FrameToken {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        (**self).cancel_frame(token)
    }
}
