use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::naga;
use wgpu::util::DeviceExt;

use crate::compile::{compile_stage, link_stages, CompiledStage};
use crate::error::FrameError;
use crate::host::{BufferHandle, GraphicsContext, ProgramHandle, ShaderHandle, UniformValue};
use crate::types::{BlendMode, ShaderStage, SurfaceSize};

use super::context::GpuContext;
use super::pipeline::{self, AttributeLayout, PipelineInputs};
use super::uniforms::BackdropUniforms;

const DEFAULT_COMPONENTS: u32 = 2;

struct ShaderObject {
    compiled: CompiledStage,
    module: wgpu::ShaderModule,
}

struct ProgramObject {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    attributes: BTreeMap<u32, AttributeLayout>,
    bindings: BTreeMap<u32, BufferHandle>,
    pipeline: Option<wgpu::RenderPipeline>,
    uniforms: BackdropUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

struct DrawCommand {
    program: ProgramHandle,
    first: u32,
    count: u32,
}

struct FrameInProgress {
    texture: wgpu::SurfaceTexture,
    clear: Option<wgpu::Color>,
    draws: Vec<DrawCommand>,
}

/// [`GraphicsContext`] backed by a `wgpu` device and window surface.
///
/// Objects live in handle-keyed tables and are dropped on delete. Pipeline
/// state is baked in `wgpu`, so a program's render pipeline is created at link
/// time and rebuilt whenever its vertex layout or the blend mode changes.
/// Draws are recorded between `begin_frame` and `end_frame` and encoded into a
/// single render pass on present.
pub struct WgpuGraphics {
    api: String,
    gpu: GpuContext,
    uniform_layout: wgpu::BindGroupLayout,
    lost: Arc<AtomicBool>,
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashMap<u32, wgpu::Buffer>,
    blend: Option<BlendMode>,
    current: Option<ProgramHandle>,
    viewport: (u32, u32, u32, u32),
    frame: Option<FrameInProgress>,
}

impl WgpuGraphics {
    pub fn new<T>(api: &str, target: T, size: SurfaceSize, backends: wgpu::Backends) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let gpu = GpuContext::new(target, size, backends)?;
        let uniform_layout = pipeline::uniform_layout(&gpu.device);

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        gpu.device.set_device_lost_callback(move |reason, message| {
            warn!(?reason, %message, "GPU device lost");
            flag.store(true, Ordering::Release);
        });

        let viewport = (0, 0, gpu.config.width, gpu.config.height);
        Ok(Self {
            api: api.to_string(),
            gpu,
            uniform_layout,
            lost,
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            blend: None,
            current: None,
            viewport,
            frame: None,
        })
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn inputs<'a>(&'a self, program: &'a ProgramObject) -> PipelineInputs<'a> {
        PipelineInputs {
            vertex: &program.vertex,
            fragment: &program.fragment,
            uniform_layout: &self.uniform_layout,
            attributes: &program.attributes,
            format: self.gpu.surface_format,
            blend: self.blend,
        }
    }

    /// Creates the pipeline inside a validation scope so failures come back
    /// as a log instead of the device's uncaptured-error handler.
    fn create_pipeline_checked(&self, program: &ProgramObject) -> Result<wgpu::RenderPipeline, String> {
        self.gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = pipeline::create_render_pipeline(&self.gpu.device, &self.inputs(program));
        match pollster::block_on(self.gpu.device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(pipeline),
        }
    }

    fn ensure_pipeline(&mut self, handle: ProgramHandle) -> bool {
        let Some(program) = self.programs.get(&handle.0) else {
            return false;
        };
        if program.pipeline.is_some() {
            return true;
        }
        match self.create_pipeline_checked(program) {
            Ok(pipeline) => {
                if let Some(program) = self.programs.get_mut(&handle.0) {
                    program.pipeline = Some(pipeline);
                }
                true
            }
            Err(log) => {
                warn!(program = handle.0, %log, "failed to rebuild render pipeline");
                false
            }
        }
    }

    fn encode(&mut self, frame: &FrameInProgress, view: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop encoder"),
            });

        let programs: Vec<ProgramHandle> = frame.draws.iter().map(|draw| draw.program).collect();
        for program in programs {
            self.ensure_pipeline(program);
        }

        let load = match frame.clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let size = self.gpu.size();
            let (x, y, width, height) = self.viewport;
            let x = x.min(size.width.saturating_sub(1));
            let y = y.min(size.height.saturating_sub(1));
            let width = width.min(size.width - x).max(1);
            let height = height.min(size.height - y).max(1);
            render_pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);

            for draw in &frame.draws {
                let Some(program) = self.programs.get(&draw.program.0) else {
                    continue;
                };
                let Some(pipeline) = program.pipeline.as_ref() else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &program.uniform_bind_group, &[]);
                let mut complete = true;
                for (slot, location) in program.attributes.keys().enumerate() {
                    match program
                        .bindings
                        .get(location)
                        .and_then(|buffer| self.buffers.get(&buffer.0))
                    {
                        Some(buffer) => render_pass.set_vertex_buffer(slot as u32, buffer.slice(..)),
                        None => complete = false,
                    }
                }
                if complete {
                    render_pass.draw(draw.first..draw.first + draw.count, 0..1);
                } else {
                    debug!(program = draw.program.0, "skipping draw with unbound attributes");
                }
            }
        }
        encoder.finish()
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

impl GraphicsContext for WgpuGraphics {
    fn api(&self) -> &str {
        &self.api
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        let compiled = compile_stage(stage, source)?;
        let module = self
            .gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "backdrop vertex",
                    ShaderStage::Fragment => "backdrop fragment",
                }),
                source: wgpu::ShaderSource::Glsl {
                    shader: Cow::Owned(source.to_string()),
                    stage: naga_stage(stage),
                    defines: &[],
                },
            });
        let id = self.allocate();
        self.shaders.insert(id, ShaderObject { compiled, module });
        debug!(%stage, shader = id, "compiled shader stage");
        Ok(ShaderHandle(id))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader.0);
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        let vs = self
            .shaders
            .get(&vertex.0)
            .ok_or_else(|| format!("unknown vertex shader {}", vertex.0))?;
        let fs = self
            .shaders
            .get(&fragment.0)
            .ok_or_else(|| format!("unknown fragment shader {}", fragment.0))?;
        link_stages(&vs.compiled, &fs.compiled)?;

        let attributes = vs
            .compiled
            .input_locations()
            .into_iter()
            .map(|location| {
                (
                    location,
                    AttributeLayout {
                        location,
                        components: DEFAULT_COMPONENTS,
                    },
                )
            })
            .collect();

        let uniforms = BackdropUniforms::default();
        let uniform_buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("backdrop uniforms"),
                contents: uniforms.as_bytes(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let uniform_bind_group = self
            .gpu
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("backdrop uniform bind group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let mut program = ProgramObject {
            vertex: vs.module.clone(),
            fragment: fs.module.clone(),
            attributes,
            bindings: BTreeMap::new(),
            pipeline: None,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
        };
        program.pipeline = Some(self.create_pipeline_checked(&program)?);

        let id = self.allocate();
        self.programs.insert(id, program);
        debug!(program = id, "linked program");
        Ok(ProgramHandle(id))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferHandle {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = self.allocate();
        self.buffers.insert(id, buffer);
        BufferHandle(id)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(&buffer.0) {
            buffer.destroy();
        }
    }

    fn bind_attribute(
        &mut self,
        program: ProgramHandle,
        location: u32,
        buffer: BufferHandle,
        components: u32,
    ) {
        let Some(object) = self.programs.get_mut(&program.0) else {
            return;
        };
        let layout = AttributeLayout {
            location,
            components,
        };
        if object.attributes.insert(location, layout) != Some(layout) {
            object.pipeline = None;
        }
        object.bindings.insert(location, buffer);
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        if self.blend == blend {
            return;
        }
        self.blend = blend;
        for program in self.programs.values_mut() {
            program.pipeline = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if self.programs.contains_key(&program.0) {
            self.current = Some(program);
        }
    }

    fn set_uniform(&mut self, value: UniformValue) {
        let Some(program) = self.current.and_then(|current| self.programs.get_mut(&current.0)) else {
            return;
        };
        program.uniforms.apply(value);
        self.gpu
            .queue
            .write_buffer(&program.uniform_buffer, 0, program.uniforms.as_bytes());
    }

    fn resize_backing(&mut self, size: SurfaceSize) {
        if size != self.gpu.size() {
            debug!(width = size.width, height = size.height, "resizing backing store");
            self.gpu.resize(size);
        }
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn begin_frame(&mut self) -> Result<(), FrameError> {
        if self.lost.load(Ordering::Acquire) {
            return Err(FrameError::ContextLost("device lost".to_string()));
        }
        let texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Err(FrameError::Transient("surface reconfigured".to_string()));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return Err(FrameError::Transient("surface timeout".to_string()));
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(FrameError::ContextLost("surface out of memory".to_string()));
            }
            Err(other) => {
                return Err(FrameError::Transient(other.to_string()));
            }
        };
        self.frame = Some(FrameInProgress {
            texture,
            clear: None,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn clear(&mut self, rgba: [f32; 4]) {
        if let Some(frame) = self.frame.as_mut() {
            frame.clear = Some(wgpu::Color {
                r: f64::from(rgba[0]),
                g: f64::from(rgba[1]),
                b: f64::from(rgba[2]),
                a: f64::from(rgba[3]),
            });
        }
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        let (Some(frame), Some(program)) = (self.frame.as_mut(), self.current) else {
            return;
        };
        frame.draws.push(DrawCommand {
            program,
            first,
            count,
        });
    }

    fn end_frame(&mut self) -> Result<(), FrameError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        let view = frame
            .texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode(&frame, &view);
        self.gpu.queue.submit(Some(commands));
        frame.texture.present();

        if self.lost.load(Ordering::Acquire) {
            return Err(FrameError::ContextLost("device lost".to_string()));
        }
        Ok(())
    }
}
