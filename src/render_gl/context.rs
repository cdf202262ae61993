use std::ffi::CStr;

use super::ShaderStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribType {
    Float,
}

/// How one vertex attribute is pulled out of the bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub components: i32,
    pub kind: AttribType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: usize,
}

impl VertexLayout {
    pub fn packed_f32(components: i32) -> Self {
        Self {
            components,
            kind: AttribType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    LessOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    TriangleStrip,
}

/// The subset of the OpenGL API the pipeline talks to.
///
/// One context is owned by one caller at a time. Everything that changes GPU
/// state takes `&mut self`; queries take `&self`. Lookups that the driver
/// answers with `-1` come back as `None`.
pub trait GraphicsContext {
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId;
    fn shader_source(&mut self, shader: ShaderId, source: &CStr);
    fn compile_shader(&mut self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> ProgramId;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn link_program(&mut self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&mut self, program: ProgramId);
    fn attrib_location(&self, program: ProgramId, name: &CStr) -> Option<AttribLocation>;
    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<UniformLocation>;
    fn use_program(&mut self, program: Option<ProgramId>);

    fn create_buffer(&mut self) -> BufferId;
    fn bind_array_buffer(&mut self, buffer: Option<BufferId>);
    fn array_buffer_data(&mut self, data: &[f32], usage: BufferUsage);
    fn delete_buffer(&mut self, buffer: BufferId);
    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: &VertexLayout);
    fn enable_vertex_attrib_array(&mut self, location: AttribLocation);

    /// Uploads a column-major 4x4 matrix.
    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]);

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&mut self, depth: f32);
    fn enable_depth_test(&mut self, func: DepthFunc);
    fn clear(&mut self, mask: ClearMask);
    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32);
}
