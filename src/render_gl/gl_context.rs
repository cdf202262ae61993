use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::c_void;

use gl;

use super::context::{
    AttribLocation, AttribType, BufferId, BufferUsage, ClearMask, DepthFunc, GraphicsContext,
    Primitive, ProgramId, ShaderId, UniformLocation, VertexLayout,
};
use super::ShaderStage;

/// `GraphicsContext` backed by the driver through the `gl` crate.
///
/// Requires a current OpenGL context on the calling thread for its whole
/// lifetime.
pub struct GlContext {
    _not_send: PhantomData<*const ()>,
}

impl GlContext {
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self {
            _not_send: PhantomData,
        }
    }
}

fn stage_kind(stage: ShaderStage) -> gl::types::GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn primitive_mode(mode: Primitive) -> gl::types::GLenum {
    match mode {
        Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
    }
}

impl GraphicsContext for GlContext {
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        ShaderId(unsafe { gl::CreateShader(stage_kind(stage)) })
    }

    fn shader_source(&mut self, shader: ShaderId, source: &CStr) {
        unsafe {
            gl::ShaderSource(shader.0, 1, &source.as_ptr(), std::ptr::null());
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        unsafe {
            gl::CompileShader(shader.0);
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        let mut success: gl::types::GLint = 1;
        unsafe {
            gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let mut len: gl::types::GLint = 0;
        unsafe {
            gl::GetShaderiv(shader.0, gl::INFO_LOG_LENGTH, &mut len);
        }
        let log = create_whitespace_cstring_with_len(len.max(0) as usize);
        unsafe {
            gl::GetShaderInfoLog(
                shader.0,
                len,
                std::ptr::null_mut(),
                log.as_ptr() as *mut gl::types::GLchar,
            );
        }
        info_log_to_string(log)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        unsafe {
            gl::DeleteShader(shader.0);
        }
    }

    fn create_program(&mut self) -> ProgramId {
        ProgramId(unsafe { gl::CreateProgram() })
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        unsafe {
            gl::AttachShader(program.0, shader.0);
        }
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        unsafe {
            gl::DetachShader(program.0, shader.0);
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        unsafe {
            gl::LinkProgram(program.0);
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        let mut success: gl::types::GLint = 1;
        unsafe {
            gl::GetProgramiv(program.0, gl::LINK_STATUS, &mut success);
        }
        success != 0
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let mut len: gl::types::GLint = 0;
        unsafe {
            gl::GetProgramiv(program.0, gl::INFO_LOG_LENGTH, &mut len);
        }
        let log = create_whitespace_cstring_with_len(len.max(0) as usize);
        unsafe {
            gl::GetProgramInfoLog(
                program.0,
                len,
                std::ptr::null_mut(),
                log.as_ptr() as *mut gl::types::GLchar,
            );
        }
        info_log_to_string(log)
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe {
            gl::DeleteProgram(program.0);
        }
    }

    fn attrib_location(&self, program: ProgramId, name: &CStr) -> Option<AttribLocation> {
        let location = unsafe { gl::GetAttribLocation(program.0, name.as_ptr()) };
        if location < 0 {
            None
        } else {
            Some(AttribLocation(location as u32))
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<UniformLocation> {
        let location = unsafe { gl::GetUniformLocation(program.0, name.as_ptr()) };
        if location < 0 {
            None
        } else {
            Some(UniformLocation(location))
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        unsafe {
            gl::UseProgram(program.map_or(0, |p| p.0));
        }
    }

    fn create_buffer(&mut self) -> BufferId {
        let mut id: gl::types::GLuint = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
        }
        BufferId(id)
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, buffer.map_or(0, |b| b.0));
        }
    }

    fn array_buffer_data(&mut self, data: &[f32], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::StaticDraw => gl::STATIC_DRAW,
        };
        unsafe {
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(data) as gl::types::GLsizeiptr,
                data.as_ptr() as *const gl::types::GLvoid,
                usage,
            );
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        unsafe {
            gl::DeleteBuffers(1, &buffer.0);
        }
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: &VertexLayout) {
        let kind = match layout.kind {
            AttribType::Float => gl::FLOAT,
        };
        let normalized = if layout.normalized { gl::TRUE } else { gl::FALSE };
        unsafe {
            gl::VertexAttribPointer(
                location.0,
                layout.components,
                kind,
                normalized,
                layout.stride,
                layout.offset as *const gl::types::GLvoid,
            );
        }
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) {
        unsafe {
            gl::EnableVertexAttribArray(location.0);
        }
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]) {
        unsafe {
            gl::UniformMatrix4fv(
                location.0,
                1 as gl::types::GLsizei,
                transpose as gl::types::GLboolean,
                value.as_ptr(),
            );
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe {
            gl::Viewport(x, y, width, height);
        }
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe {
            gl::ClearColor(r, g, b, a);
        }
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe {
            gl::ClearDepth(depth as gl::types::GLdouble);
        }
    }

    fn enable_depth_test(&mut self, func: DepthFunc) {
        let func = match func {
            DepthFunc::LessOrEqual => gl::LEQUAL,
        };
        unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::DepthFunc(func);
        }
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.color {
            bits |= gl::COLOR_BUFFER_BIT;
        }
        if mask.depth {
            bits |= gl::DEPTH_BUFFER_BIT;
        }
        unsafe {
            gl::Clear(bits);
        }
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        unsafe {
            gl::DrawArrays(primitive_mode(mode), first, count);
        }
    }
}

fn create_whitespace_cstring_with_len(len: usize) -> CString {
    // allocate buffer of correct size
    let mut buffer: Vec<u8> = Vec::with_capacity(len + 1);
    // fill it with len spaces
    buffer.extend([b' '].iter().cycle().take(len));
    // convert buffer to CString
    unsafe { CString::from_vec_unchecked(buffer) }
}

fn info_log_to_string(log: CString) -> String {
    // the driver writes a NUL terminator somewhere inside the buffer
    let bytes = log.into_bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}
