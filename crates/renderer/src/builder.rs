use tracing::{debug, warn};

use crate::error::BuildError;
use crate::host::{BufferHandle, GraphicsContext, ProgramHandle, ShaderHandle};
use crate::shader::{ShaderSource, POSITION_LOCATION, TEXCOORD_LOCATION};
use crate::types::{BlendMode, ShaderStage};

/// Clip-space corners of two triangles covering `[-1, 1]²`.
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    -1.0, 1.0, //
    -1.0, 1.0, //
    1.0, -1.0, //
    1.0, 1.0,
];

/// Texture coordinates matching [`QUAD_POSITIONS`], origin bottom-left.
pub const QUAD_TEXCOORDS: [f32; 12] = [
    0.0, 0.0, //
    1.0, 0.0, //
    0.0, 1.0, //
    0.0, 1.0, //
    1.0, 0.0, //
    1.0, 1.0,
];

/// Vertices issued by each draw call.
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Static vertex buffers of the full-screen quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBuffers {
    pub position: BufferHandle,
    pub texcoord: BufferHandle,
}

/// A linked program and the objects it was built from.
///
/// Owned by exactly one activation cycle; [`Program::release`] must run
/// before the context it came from is dropped or reused.
#[derive(Debug, PartialEq, Eq)]
pub struct Program {
    pub vertex: ShaderHandle,
    pub fragment: ShaderHandle,
    pub handle: ProgramHandle,
    pub geometry: GeometryBuffers,
}

impl Program {
    /// Deletes every GPU object owned by the program.
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        ctx.delete_buffer(self.geometry.position);
        ctx.delete_buffer(self.geometry.texcoord);
        ctx.delete_program(self.handle);
        ctx.delete_shader(self.vertex);
        ctx.delete_shader(self.fragment);
        debug!(program = self.handle.0, "released shader program");
    }
}

fn compile(
    ctx: &mut dyn GraphicsContext,
    stage: ShaderStage,
    text: &str,
) -> Result<ShaderHandle, BuildError> {
    ctx.compile_shader(stage, text).map_err(|log| {
        warn!(%stage, %log, "shader compile error");
        BuildError::Compile { stage, log }
    })
}

/// Compiles, links and binds `source` on `ctx`.
///
/// Both stages always compile, so each logs its own diagnostics, and the
/// vertex error wins when both fail. Linking waits for both. Anything
/// created before a failure is deleted again, so an error leaves no handles
/// behind. On success the quad geometry is uploaded once, bound to the
/// program's attribute locations, and alpha blending is enabled so the
/// translucent output composites over whatever sits behind the surface.
pub fn build(ctx: &mut dyn GraphicsContext, source: &ShaderSource) -> Result<Program, BuildError> {
    let vertex = compile(ctx, source.vertex.stage, source.vertex.text);
    let fragment = compile(ctx, source.fragment.stage, source.fragment.text);
    let (vertex, fragment) = match (vertex, fragment) {
        (Ok(vertex), Ok(fragment)) => (vertex, fragment),
        (Err(err), fragment) => {
            if let Ok(fragment) = fragment {
                ctx.delete_shader(fragment);
            }
            return Err(err);
        }
        (Ok(vertex), Err(err)) => {
            ctx.delete_shader(vertex);
            return Err(err);
        }
    };

    let handle = match ctx.link_program(vertex, fragment) {
        Ok(handle) => handle,
        Err(log) => {
            warn!(%log, "program link error");
            ctx.delete_shader(vertex);
            ctx.delete_shader(fragment);
            return Err(BuildError::Link { log });
        }
    };

    let geometry = GeometryBuffers {
        position: ctx.create_vertex_buffer("quad positions", &QUAD_POSITIONS),
        texcoord: ctx.create_vertex_buffer("quad texcoords", &QUAD_TEXCOORDS),
    };
    ctx.bind_attribute(handle, POSITION_LOCATION, geometry.position, 2);
    ctx.bind_attribute(handle, TEXCOORD_LOCATION, geometry.texcoord, 2);
    ctx.set_blend(Some(BlendMode::Alpha));

    debug!(api = ctx.api(), program = handle.0, "built shader program");
    Ok(Program {
        vertex,
        fragment,
        handle,
        geometry,
    })
}
