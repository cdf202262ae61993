use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::ffi::CStr;
use std::rc::Rc;

use log::warn;

use super::context::{
    AttribLocation, BufferId, BufferUsage, ClearMask, DepthFunc, GraphicsContext, Primitive,
    ProgramId, ShaderId, UniformLocation, VertexLayout,
};
use super::ShaderStage;

mod glsl;

use self::glsl::StageInterface;

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader { shader: ShaderId, stage: ShaderStage },
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader { program: ProgramId, shader: ShaderId },
    DetachShader { program: ProgramId, shader: ShaderId },
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    CreateBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    BufferData {
        buffer: BufferId,
        len: usize,
        usage: BufferUsage,
    },
    DeleteBuffer(BufferId),
    VertexAttribPointer {
        location: AttribLocation,
        layout: VertexLayout,
    },
    EnableVertexAttribArray(AttribLocation),
    UniformMatrix4 {
        location: UniformLocation,
        transpose: bool,
        value: [f32; 16],
    },
    Viewport {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    ClearColor([f32; 4]),
    ClearDepth(f32),
    EnableDepthTest(DepthFunc),
    Clear(ClearMask),
    DrawArrays {
        mode: Primitive,
        first: i32,
        count: i32,
    },
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: Option<Result<StageInterface, String>>,
}

#[derive(Debug, Default)]
struct LinkedInterface {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: Option<Result<LinkedInterface, String>>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    buffers: HashMap<BufferId, Vec<f32>>,
    bound_array_buffer: Option<BufferId>,
    current_program: Option<ProgramId>,
    calls: Vec<GlCall>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn link(&self, program: &ProgramObject) -> Result<LinkedInterface, String> {
        let compiled = |stage: ShaderStage| {
            let mut found = program
                .attached
                .iter()
                .filter_map(|id| self.shaders.get(id))
                .filter(|shader| shader.stage == stage);
            match (found.next(), found.next()) {
                (Some(_), Some(_)) => Err(format!("error: multiple {} shaders attached", stage)),
                (Some(ShaderObject {
                    compiled: Some(Ok(interface)),
                    ..
                }), None) => Ok(interface),
                _ => Err(format!(
                    "error: program has no compiled {} shader attached",
                    stage
                )),
            }
        };
        let vertex = compiled(ShaderStage::Vertex)?;
        let fragment = compiled(ShaderStage::Fragment)?;

        if let Some(missing) = fragment
            .varyings
            .iter()
            .find(|v| !vertex.varyings.contains(*v))
        {
            return Err(format!(
                "error: varying `{}` is read by the fragment shader but not written by the vertex shader",
                missing
            ));
        }

        let mut uniforms = vertex.uniforms.clone();
        for name in &fragment.uniforms {
            if !uniforms.contains(name) {
                uniforms.push(name.clone());
            }
        }
        Ok(LinkedInterface {
            attributes: vertex.attributes.clone(),
            uniforms,
        })
    }

    fn linked(&self, program: ProgramId) -> Option<&LinkedInterface> {
        match self.programs.get(&program)?.linked.as_ref()? {
            Ok(interface) => Some(interface),
            Err(_) => None,
        }
    }
}

/// A clonable handle to one recorded context.
#[derive(Clone, Default)]
pub struct RecordingContext {
    state: Rc<RefCell<State>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Ref<'_, [GlCall]> {
        Ref::map(self.state.borrow(), |state| state.calls.as_slice())
    }

    pub fn count_calls<F>(&self, predicate: F) -> usize
    where
        F: Fn(&GlCall) -> bool,
    {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Contents of a live buffer, as uploaded.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<f32>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn bound_array_buffer(&self) -> Option<BufferId> {
        self.state.borrow().bound_array_buffer
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    /// Number of shader, program and buffer objects not yet deleted.
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.len() + state.programs.len() + state.buffers.len()
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GraphicsContext for RecordingContext {
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        let mut state = self.state.borrow_mut();
        let shader = ShaderId(state.next_id());
        state.shaders.insert(
            shader,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: None,
            },
        );
        state.calls.push(GlCall::CreateShader { shader, stage });
        shader
    }

    fn shader_source(&mut self, shader: ShaderId, source: &CStr) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.source = source.to_string_lossy().into_owned();
        }
        self.record(GlCall::ShaderSource(shader));
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.compiled = Some(glsl::compile(object.stage, &object.source));
        }
        self.record(GlCall::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        matches!(
            self.state.borrow().shaders.get(&shader),
            Some(ShaderObject {
                compiled: Some(Ok(_)),
                ..
            })
        )
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        match self.state.borrow().shaders.get(&shader) {
            Some(ShaderObject {
                compiled: Some(Err(log)),
                ..
            }) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.state.borrow_mut().shaders.remove(&shader);
        self.record(GlCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> ProgramId {
        let mut state = self.state.borrow_mut();
        let program = ProgramId(state.next_id());
        state.programs.insert(program, ProgramObject::default());
        state.calls.push(GlCall::CreateProgram(program));
        program
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.push(shader);
        }
        self.record(GlCall::AttachShader { program, shader });
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.state.borrow_mut().programs.get_mut(&program) {
            object.attached.retain(|&id| id != shader);
        }
        self.record(GlCall::DetachShader { program, shader });
    }

    fn link_program(&mut self, program: ProgramId) {
        {
            let mut state = self.state.borrow_mut();
            let result = match state.programs.get(&program) {
                Some(object) => state.link(object),
                None => Err(format!("error: {:?} is not a program object", program)),
            };
            if let Some(object) = state.programs.get_mut(&program) {
                object.linked = Some(result);
            }
        }
        self.record(GlCall::LinkProgram(program));
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.state.borrow().linked(program).is_some()
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        match self.state.borrow().programs.get(&program) {
            Some(ProgramObject {
                linked: Some(Err(log)),
                ..
            }) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        {
            let mut state = self.state.borrow_mut();
            state.programs.remove(&program);
            if state.current_program == Some(program) {
                state.current_program = None;
            }
        }
        self.record(GlCall::DeleteProgram(program));
    }

    fn attrib_location(&self, program: ProgramId, name: &CStr) -> Option<AttribLocation> {
        let name = name.to_string_lossy();
        let state = self.state.borrow();
        let index = state
            .linked(program)?
            .attributes
            .iter()
            .position(|a| *a == name)?;
        Some(AttribLocation(index as u32))
    }

    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<UniformLocation> {
        let name = name.to_string_lossy();
        let state = self.state.borrow();
        let index = state
            .linked(program)?
            .uniforms
            .iter()
            .position(|u| *u == name)?;
        Some(UniformLocation(index as i32))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.state.borrow_mut().current_program = program;
        self.record(GlCall::UseProgram(program));
    }

    fn create_buffer(&mut self) -> BufferId {
        let mut state = self.state.borrow_mut();
        let buffer = BufferId(state.next_id());
        state.buffers.insert(buffer, vec![]);
        state.calls.push(GlCall::CreateBuffer(buffer));
        buffer
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        self.state.borrow_mut().bound_array_buffer = buffer;
        self.record(GlCall::BindArrayBuffer(buffer));
    }

    fn array_buffer_data(&mut self, data: &[f32], usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let buffer = match state.bound_array_buffer {
            Some(buffer) => buffer,
            None => {
                warn!("buffer data with no array buffer bound");
                return;
            }
        };
        if let Some(contents) = state.buffers.get_mut(&buffer) {
            *contents = data.to_vec();
        }
        state.calls.push(GlCall::BufferData {
            buffer,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        {
            let mut state = self.state.borrow_mut();
            state.buffers.remove(&buffer);
            if state.bound_array_buffer == Some(buffer) {
                state.bound_array_buffer = None;
            }
        }
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: &VertexLayout) {
        if self.bound_array_buffer().is_none() {
            warn!("attribute {:?} set with no array buffer bound", location);
        }
        self.record(GlCall::VertexAttribPointer {
            location,
            layout: *layout,
        });
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) {
        self.record(GlCall::EnableVertexAttribArray(location));
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]) {
        if self.current_program().is_none() {
            warn!("uniform {:?} set with no program in use", location);
        }
        self.record(GlCall::UniformMatrix4 {
            location,
            transpose,
            value: *value,
        });
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.record(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(GlCall::ClearDepth(depth));
    }

    fn enable_depth_test(&mut self, func: DepthFunc) {
        self.record(GlCall::EnableDepthTest(func));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(GlCall::Clear(mask));
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { mode, first, count });
    }
}
