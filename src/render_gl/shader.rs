use std::ffi::{CStr, CString};
use std::fmt;

use log::{debug, error};
use na::Matrix4;
use nalgebra as na;
use thiserror::Error;

use super::binding::{BindingName, BindingTable};
use super::context::{GraphicsContext, ProgramId, ShaderId, UniformLocation};
use crate::resources::{self, Resources};

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("resource load error: {name}")]
    ResourceLoad {
        name: String,
        source: resources::ResError,
    },
    #[error("can not determine shader type for resource: {name}")]
    CanNotDetermineShaderTypeForResource { name: String },
    #[error("{stage} shader source contains a nul byte")]
    SourceContainsNul { stage: ShaderStage },
    #[error("{stage} shader compile error\nmessage: {log}")]
    CompileError { stage: ShaderStage, log: String },
    #[error("shader link error\nmessage: {log}")]
    LinkError { log: String },
    #[error("linked program does not expose `{name}`")]
    MissingBinding { name: BindingName },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    const POSSIBLE_EXT: [(&'static str, ShaderStage); 2] =
        [(".vert", ShaderStage::Vertex), (".frag", ShaderStage::Fragment)];

    pub fn from_resource_name(name: &str) -> Option<ShaderStage> {
        Self::POSSIBLE_EXT
            .iter()
            .find(|&&(file_extension, _)| name.ends_with(file_extension))
            .map(|&(_, stage)| stage)
    }

    pub fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => ".vert",
            ShaderStage::Fragment => ".frag",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    text: CString,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, text: impl Into<Vec<u8>>) -> Result<Self, ShaderError> {
        let text = CString::new(text).map_err(|_| ShaderError::SourceContainsNul { stage })?;
        Ok(Self { stage, text })
    }

    pub fn vertex(text: impl Into<Vec<u8>>) -> Result<Self, ShaderError> {
        Self::new(ShaderStage::Vertex, text)
    }

    pub fn fragment(text: impl Into<Vec<u8>>) -> Result<Self, ShaderError> {
        Self::new(ShaderStage::Fragment, text)
    }

    pub fn from_res(res: &Resources, name: &str) -> Result<Self, ShaderError> {
        let stage = ShaderStage::from_resource_name(name).ok_or_else(|| {
            ShaderError::CanNotDetermineShaderTypeForResource { name: name.into() }
        })?;

        let text = res
            .load_cstring(name)
            .map_err(|e| ShaderError::ResourceLoad {
                name: name.into(),
                source: e,
            })?;

        Ok(Self { stage, text })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn text(&self) -> &CStr {
        &self.text
    }
}

#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    stage: ShaderStage,
}

impl Shader {
    pub fn from_source(
        gl: &mut dyn GraphicsContext,
        source: &ShaderSource,
    ) -> Result<Shader, ShaderError> {
        let id = shader_from_source(gl, source.text(), source.stage())?;
        Ok(Shader {
            id,
            stage: source.stage(),
        })
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn release(self, gl: &mut dyn GraphicsContext) {
        gl.delete_shader(self.id);
    }
}

#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    vertex: Shader,
    fragment: Shader,
    bindings: BindingTable,
}

impl Program {
    pub fn link(
        gl: &mut dyn GraphicsContext,
        vertex: Shader,
        fragment: Shader,
    ) -> Result<Program, ShaderError> {
        if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
            let log = format!(
                "expected a vertex and a fragment shader, got {} and {}",
                vertex.stage(),
                fragment.stage()
            );
            vertex.release(gl);
            fragment.release(gl);
            return Err(ShaderError::LinkError { log });
        }

        let program_id = gl.create_program();
        gl.attach_shader(program_id, vertex.id());
        gl.attach_shader(program_id, fragment.id());
        gl.link_program(program_id);

        if !gl.program_link_status(program_id) {
            let log = non_empty_log(gl.program_info_log(program_id));
            error!("program link failed: {}", log);
            gl.delete_program(program_id);
            vertex.release(gl);
            fragment.release(gl);
            return Err(ShaderError::LinkError { log });
        }

        gl.detach_shader(program_id, vertex.id());
        gl.detach_shader(program_id, fragment.id());

        let bindings = match BindingTable::resolve(gl, program_id) {
            Ok(bindings) => bindings,
            Err(e) => {
                error!("{}", e);
                gl.delete_program(program_id);
                vertex.release(gl);
                fragment.release(gl);
                return Err(e);
            }
        };
        debug!("linked program {:?} with {:?}", program_id, bindings);

        Ok(Program {
            id: program_id,
            vertex,
            fragment,
            bindings,
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn activate<'a>(&'a self, gl: &mut dyn GraphicsContext) -> ActiveProgram<'a> {
        gl.use_program(Some(self.id));
        ActiveProgram { program: self }
    }

    pub fn release(self, gl: &mut dyn GraphicsContext) {
        gl.delete_program(self.id);
        self.vertex.release(gl);
        self.fragment.release(gl);
    }
}

/// Proof that a program is the current one.
pub struct ActiveProgram<'a> {
    program: &'a Program,
}

impl<'a> ActiveProgram<'a> {
    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn set_matrix4(
        &self,
        gl: &mut dyn GraphicsContext,
        location: UniformLocation,
        value: &Matrix4<f32>,
    ) {
        let mut columns = [0.0; 16];
        columns.copy_from_slice(value.as_slice());
        gl.uniform_matrix4(location, false, &columns);
    }
}

fn shader_from_source(
    gl: &mut dyn GraphicsContext,
    source: &CStr,
    stage: ShaderStage,
) -> Result<ShaderId, ShaderError> {
    let id = gl.create_shader(stage);
    gl.shader_source(id, source);
    gl.compile_shader(id);

    if !gl.shader_compile_status(id) {
        let log = non_empty_log(gl.shader_info_log(id));
        error!("{} shader compile failed: {}", stage, log);
        gl.delete_shader(id);
        return Err(ShaderError::CompileError { stage, log });
    }
    debug!("compiled {} shader {:?}", stage, id);
    Ok(id)
}

fn non_empty_log(log: String) -> String {
    if log.trim().is_empty() {
        "driver returned an empty info log".to_string()
    } else {
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quad::{FRAGMENT_SHADER, VERTEX_SHADER};
    use crate::render_gl::binding::Binding;
    use crate::render_gl::recording::{GlCall, RecordingContext};

    fn vertex(gl: &mut RecordingContext) -> Shader {
        Shader::from_source(gl, &ShaderSource::vertex(VERTEX_SHADER).unwrap()).unwrap()
    }

    fn fragment(gl: &mut RecordingContext) -> Shader {
        Shader::from_source(gl, &ShaderSource::fragment(FRAGMENT_SHADER).unwrap()).unwrap()
    }

    #[test]
    fn valid_sources_compile() {
        let mut gl = RecordingContext::new();
        assert_eq!(vertex(&mut gl).stage(), ShaderStage::Vertex);
        assert_eq!(fragment(&mut gl).stage(), ShaderStage::Fragment);
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::DeleteShader(_))), 0);
    }

    #[test]
    fn compile_error_carries_log_and_deletes_shader() {
        let mut gl = RecordingContext::new();
        let source = ShaderSource::vertex("void main() { gl_Position = ; ").unwrap();
        let err = Shader::from_source(&mut gl, &source).unwrap_err();

        match err {
            ShaderError::CompileError { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.trim().is_empty());
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::DeleteShader(_))), 1);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn nul_in_source_is_rejected_up_front() {
        assert!(matches!(
            ShaderSource::fragment("void\0main"),
            Err(ShaderError::SourceContainsNul {
                stage: ShaderStage::Fragment
            })
        ));
    }

    #[test]
    fn unknown_extension_is_refused_before_reading() {
        let res = Resources::from_dir(std::env::temp_dir());
        let err = ShaderSource::from_res(&res, "shaders/quad.glsl").unwrap_err();
        match err {
            ShaderError::CanNotDetermineShaderTypeForResource { name } => {
                assert_eq!(name, "shaders/quad.glsl")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_shader_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = Resources::from_dir(dir.path());
        let err = ShaderSource::from_res(&res, "quad.frag").unwrap_err();
        match err {
            ShaderError::ResourceLoad { name, source } => {
                assert_eq!(name, "quad.frag");
                assert!(matches!(source, resources::ResError::Io(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn resource_name_decides_stage() {
        assert_eq!(
            ShaderStage::from_resource_name("shaders/quad.vert"),
            Some(ShaderStage::Vertex)
        );
        assert_eq!(
            ShaderStage::from_resource_name("shaders/quad.frag"),
            Some(ShaderStage::Fragment)
        );
        assert_eq!(ShaderStage::from_resource_name("shaders/quad.glsl"), None);
    }

    #[test]
    fn link_resolves_every_binding() {
        let mut gl = RecordingContext::new();
        let (vs, fs) = (vertex(&mut gl), fragment(&mut gl));
        let program = Program::link(&mut gl, vs, fs).unwrap();

        for name in BindingName::ALL.iter() {
            assert!(program.bindings().get(*name).is_bound(), "{}", name);
        }
    }

    #[test]
    fn binding_lookup_is_deterministic() {
        let mut gl = RecordingContext::new();
        let (vs, fs) = (vertex(&mut gl), fragment(&mut gl));
        let program = Program::link(&mut gl, vs, fs).unwrap();

        let first = BindingTable::resolve(&gl, program.id()).unwrap();
        let second = BindingTable::resolve(&gl, program.id()).unwrap();
        assert_eq!(first, second);
        assert_eq!(&first, program.bindings());
        for name in BindingName::ALL.iter() {
            assert_eq!(
                Binding::lookup(&gl, program.id(), *name),
                Binding::lookup(&gl, program.id(), *name)
            );
        }
    }

    #[test]
    fn wrong_stage_is_refused_before_linking() {
        let mut gl = RecordingContext::new();
        let (vs, other_vs) = (vertex(&mut gl), vertex(&mut gl));
        let err = Program::link(&mut gl, vs, other_vs).unwrap_err();

        assert!(matches!(err, ShaderError::LinkError { .. }));
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::CreateProgram(_))), 0);
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::LinkProgram(_))), 0);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn failed_link_releases_everything() {
        let mut gl = RecordingContext::new();
        let vs = vertex(&mut gl);
        let fs = Shader::from_source(
            &mut gl,
            &ShaderSource::fragment(
                "varying mediump vec4 vColor; void main() { gl_FragColor = vColor; }",
            )
            .unwrap(),
        )
        .unwrap();
        let err = Program::link(&mut gl, vs, fs).unwrap_err();

        match err {
            ShaderError::LinkError { log } => assert!(log.contains("vColor")),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn unused_required_uniform_fails_link() {
        let mut gl = RecordingContext::new();
        let vs = Shader::from_source(
            &mut gl,
            &ShaderSource::vertex(
                "attribute vec4 aVertexPosition;
                 uniform mat4 uModelViewMatrix;
                 uniform mat4 uProjectionMatrix;
                 void main() { gl_Position = uProjectionMatrix * aVertexPosition; }",
            )
            .unwrap(),
        )
        .unwrap();
        let fs = fragment(&mut gl);
        let err = Program::link(&mut gl, vs, fs).unwrap_err();

        assert!(matches!(
            err,
            ShaderError::MissingBinding {
                name: BindingName::ModelViewMatrix
            }
        ));
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn release_deletes_program_and_shaders() {
        let mut gl = RecordingContext::new();
        let (vs, fs) = (vertex(&mut gl), fragment(&mut gl));
        let program = Program::link(&mut gl, vs, fs).unwrap();
        program.release(&mut gl);

        assert_eq!(gl.live_objects(), 0);
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::DeleteProgram(_))), 1);
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::DeleteShader(_))), 2);
    }

    #[test]
    fn activate_uses_the_program() {
        let mut gl = RecordingContext::new();
        let (vs, fs) = (vertex(&mut gl), fragment(&mut gl));
        let program = Program::link(&mut gl, vs, fs).unwrap();
        let active = program.activate(&mut gl);

        assert_eq!(active.program().id(), program.id());
        assert_eq!(gl.current_program(), Some(program.id()));
    }
}
