mod context;
pub use self::context::{
    AttribLocation, AttribType, BufferId, BufferUsage, ClearMask, DepthFunc, GraphicsContext,
    Primitive, ProgramId, ShaderId, UniformLocation, VertexLayout,
};

mod gl_context;
pub use self::gl_context::GlContext;

pub mod recording;

mod shader;
pub use self::shader::{ActiveProgram, Program, Shader, ShaderError, ShaderSource, ShaderStage};

mod binding;
pub use self::binding::{Binding, BindingName, BindingTable};

mod viewport;
pub use self::viewport::Viewport;

mod color_buffer;
pub use self::color_buffer::ColorBuffer;

pub mod buffer;
