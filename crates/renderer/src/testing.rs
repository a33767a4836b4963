//! In-memory doubles for the host seams, shared by the unit tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::animators::{Canvas2d, Rgba};
use crate::error::FrameError;
use crate::host::{
    BufferHandle, FrameClock, FrameToken, GraphicsContext, HostSurface, ProgramHandle,
    ShaderHandle, UniformValue,
};
use crate::types::{BlendMode, ShaderStage, SurfaceRect, SurfaceSize};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CompileShader(ShaderStage),
    DeleteShader(ShaderHandle),
    LinkProgram {
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    },
    DeleteProgram(ProgramHandle),
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindAttribute {
        program: ProgramHandle,
        location: u32,
        buffer: BufferHandle,
        components: u32,
    },
    SetBlend(Option<BlendMode>),
    UseProgram(ProgramHandle),
    SetUniform(UniformValue),
    ResizeBacking(SurfaceSize),
    SetViewport(u32, u32, u32, u32),
    BeginFrame,
    Clear([f32; 4]),
    Draw {
        first: u32,
        count: u32,
    },
    EndFrame,
}

/// Everything a [`RecordingContext`] was asked to do.
#[derive(Debug, Default)]
pub struct ContextLog {
    calls: Vec<Call>,
    live: BTreeSet<u32>,
    buffers: HashMap<u32, Vec<f32>>,
    next_frame_error: Option<FrameError>,
}

impl ContextLog {
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls from the last one matching `pred` onward.
    pub fn calls_since_last(&self, pred: impl Fn(&Call) -> bool) -> &[Call] {
        match self.calls.iter().rposition(pred) {
            Some(start) => &self.calls[start..],
            None => &[],
        }
    }

    pub fn compile_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::CompileShader(_)))
            .count()
    }

    /// Objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.live.len()
    }

    pub fn attribute_bindings(&self, program: ProgramHandle) -> HashMap<u32, BufferHandle> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::BindAttribute {
                    program: bound,
                    location,
                    buffer,
                    ..
                } if *bound == program => Some((*location, *buffer)),
                _ => None,
            })
            .collect()
    }

    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<Vec<f32>> {
        self.buffers.get(&buffer.0).cloned()
    }

    /// Most recent value written under `name`.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::SetUniform(value) if value.name() == name => Some(*value),
            _ => None,
        })
    }

    pub fn uniform_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::SetUniform(_)))
            .count()
    }

    pub fn draw_calls(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw { first, count } => Some((*first, *count)),
                _ => None,
            })
            .collect()
    }

    /// Makes the next `begin_frame` fail with `err`.
    pub fn fail_next_frame(&mut self, err: FrameError) {
        self.next_frame_error = Some(err);
    }
}

/// [`GraphicsContext`] that records every call into a shared [`ContextLog`].
pub struct RecordingContext {
    api: String,
    log: Rc<RefCell<ContextLog>>,
    next_id: u32,
    fail_compile: Option<ShaderStage>,
    fail_link: bool,
}

impl RecordingContext {
    pub fn new(api: &str) -> Self {
        Self {
            api: api.to_string(),
            log: Rc::default(),
            next_id: 1,
            fail_compile: None,
            fail_link: false,
        }
    }

    pub fn fail_compile(mut self, stage: ShaderStage) -> Self {
        self.fail_compile = Some(stage);
        self
    }

    pub fn fail_link(mut self) -> Self {
        self.fail_link = true;
        self
    }

    pub fn log(&self) -> std::cell::Ref<'_, ContextLog> {
        self.log.borrow()
    }

    pub fn shared_log(&self) -> Rc<RefCell<ContextLog>> {
        Rc::clone(&self.log)
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.log.borrow_mut().live.insert(id);
        id
    }

    fn record(&mut self, call: Call) {
        self.log.borrow_mut().calls.push(call);
    }

    fn forget(&mut self, id: u32) {
        self.log.borrow_mut().live.remove(&id);
    }
}

impl GraphicsContext for RecordingContext {
    fn api(&self) -> &str {
        &self.api
    }

    fn compile_shader(&mut self, stage: ShaderStage, _source: &str) -> Result<ShaderHandle, String> {
        self.record(Call::CompileShader(stage));
        if self.fail_compile == Some(stage) {
            return Err(format!("0:1: {stage} stage rejected"));
        }
        Ok(ShaderHandle(self.allocate()))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.record(Call::DeleteShader(shader));
        self.forget(shader.0);
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        self.record(Call::LinkProgram { vertex, fragment });
        if self.fail_link {
            return Err("varying mismatch".to_string());
        }
        Ok(ProgramHandle(self.allocate()))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.record(Call::DeleteProgram(program));
        self.forget(program.0);
    }

    fn create_vertex_buffer(&mut self, _label: &str, data: &[f32]) -> BufferHandle {
        let buffer = BufferHandle(self.allocate());
        self.log.borrow_mut().buffers.insert(buffer.0, data.to_vec());
        self.record(Call::CreateBuffer(buffer));
        buffer
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.record(Call::DeleteBuffer(buffer));
        self.forget(buffer.0);
    }

    fn bind_attribute(
        &mut self,
        program: ProgramHandle,
        location: u32,
        buffer: BufferHandle,
        components: u32,
    ) {
        self.record(Call::BindAttribute {
            program,
            location,
            buffer,
            components,
        });
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.record(Call::SetBlend(blend));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.record(Call::UseProgram(program));
    }

    fn set_uniform(&mut self, value: UniformValue) {
        self.record(Call::SetUniform(value));
    }

    fn resize_backing(&mut self, size: SurfaceSize) {
        self.record(Call::ResizeBacking(size));
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.record(Call::SetViewport(x, y, width, height));
    }

    fn begin_frame(&mut self) -> Result<(), FrameError> {
        self.record(Call::BeginFrame);
        match self.log.borrow_mut().next_frame_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn clear(&mut self, rgba: [f32; 4]) {
        self.record(Call::Clear(rgba));
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.record(Call::Draw { first, count });
    }

    fn end_frame(&mut self) -> Result<(), FrameError> {
        self.record(Call::EndFrame);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    size: SurfaceSize,
    origin: (f32, f32),
    accepted: Vec<String>,
    attempts: Vec<String>,
    contexts: Vec<Rc<RefCell<ContextLog>>>,
    fail_compile: Option<ShaderStage>,
    fail_link: bool,
}

/// [`HostSurface`] whose clones share one state, so tests keep a handle after
/// moving a copy into the controller.
#[derive(Debug, Clone, Default)]
pub struct FakeSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl FakeSurface {
    pub fn new(size: SurfaceSize) -> Self {
        let surface = Self::default();
        surface.state.borrow_mut().size = size;
        surface
    }

    /// API names `acquire_context` succeeds for.
    pub fn accepting(self, apis: &[&str]) -> Self {
        self.state.borrow_mut().accepted = apis.iter().map(|api| api.to_string()).collect();
        self
    }

    pub fn with_origin(self, left: f32, top: f32) -> Self {
        self.state.borrow_mut().origin = (left, top);
        self
    }

    pub fn failing_compile(self, stage: ShaderStage) -> Self {
        self.state.borrow_mut().fail_compile = Some(stage);
        self
    }

    pub fn failing_link(self) -> Self {
        self.state.borrow_mut().fail_link = true;
        self
    }

    pub fn resize(&self, size: SurfaceSize) {
        self.state.borrow_mut().size = size;
    }

    pub fn acquire_attempts(&self) -> Vec<String> {
        self.state.borrow().attempts.clone()
    }

    pub fn contexts(&self) -> Vec<Rc<RefCell<ContextLog>>> {
        self.state.borrow().contexts.clone()
    }

    pub fn last_context(&self) -> Option<Rc<RefCell<ContextLog>>> {
        self.state.borrow().contexts.last().cloned()
    }
}

impl HostSurface for FakeSurface {
    fn display_size(&self) -> SurfaceSize {
        self.state.borrow().size
    }

    fn bounding_rect(&self) -> SurfaceRect {
        let state = self.state.borrow();
        SurfaceRect {
            left: state.origin.0,
            top: state.origin.1,
            ..SurfaceRect::from_size(state.size)
        }
    }

    fn acquire_context(&mut self, api: &str) -> Option<Box<dyn GraphicsContext>> {
        let mut state = self.state.borrow_mut();
        state.attempts.push(api.to_string());
        if !state.accepted.iter().any(|accepted| accepted == api) {
            return None;
        }
        let mut ctx = RecordingContext::new(api);
        ctx.fail_compile = state.fail_compile;
        ctx.fail_link = state.fail_link;
        state.contexts.push(ctx.shared_log());
        Some(Box::new(ctx))
    }
}

#[derive(Debug, Default)]
struct ClockState {
    next: u64,
    requests: usize,
    pending: Vec<FrameToken>,
    cancelled: Vec<FrameToken>,
}

/// [`FrameClock`] driven by hand; clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<ClockState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.state.borrow().requests
    }

    pub fn pending(&self) -> Vec<FrameToken> {
        self.state.borrow().pending.clone()
    }

    pub fn cancelled(&self) -> Vec<FrameToken> {
        self.state.borrow().cancelled.clone()
    }

    /// Removes the oldest pending request, as the host does when it runs it.
    pub fn fire(&self) -> Option<FrameToken> {
        let mut state = self.state.borrow_mut();
        if state.pending.is_empty() {
            None
        } else {
            Some(state.pending.remove(0))
        }
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> FrameToken {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        state.requests += 1;
        let token = FrameToken(state.next);
        state.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut state = self.state.borrow_mut();
        state.pending.retain(|pending| *pending != token);
        state.cancelled.push(token);
    }
}

/// Primitive recorded by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Rgba,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgba,
    },
    Glyph {
        glyph: char,
        x: f32,
        y: f32,
        font_px: f32,
        color: Rgba,
    },
}

/// [`Canvas2d`] that keeps a list of what was drawn.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    size: SurfaceSize,
    ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }
}

impl Canvas2d for RecordingCanvas {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.ops.push(CanvasOp::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba) {
        self.ops.push(CanvasOp::Circle {
            cx,
            cy,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        self.ops.push(CanvasOp::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn fill_glyph(&mut self, glyph: char, x: f32, y: f32, font_px: f32, color: Rgba) {
        self.ops.push(CanvasOp::Glyph {
            glyph,
            x,
            y,
            font_px,
            color,
        });
    }
}
