use log::{debug, trace};

use crate::render_gl::buffer::{DrawCall, VertexBuffer};
use crate::render_gl::{self, GraphicsContext, Primitive, Program};
use crate::transform::FrameTransforms;

/// Steps of one frame, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Clear,
    Configure,
    Bind,
    Activate,
    UploadUniforms,
    Draw,
}

pub struct Renderer {
    color_buffer: render_gl::ColorBuffer,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            color_buffer: render_gl::ColorBuffer::opaque_black(),
        }
    }

    pub fn render_frame(
        &self,
        gl: &mut dyn GraphicsContext,
        program: &Program,
        buffer: &VertexBuffer,
        aspect: f32,
    ) -> DrawCall {
        let bindings = program.bindings();

        trace!("frame stage {:?}", FrameStage::Clear);
        self.color_buffer.set_used(gl);
        self.color_buffer.clear(gl);

        trace!("frame stage {:?}", FrameStage::Configure);
        let transforms = FrameTransforms::for_aspect(aspect);

        trace!("frame stage {:?}", FrameStage::Bind);
        let binding = buffer.bind(gl);
        binding.vertex_attrib_pointer(gl, bindings.vertex_position, buffer.layout());

        trace!("frame stage {:?}", FrameStage::Activate);
        let active = program.activate(gl);

        trace!("frame stage {:?}", FrameStage::UploadUniforms);
        active.set_matrix4(gl, bindings.projection_matrix, &transforms.projection);
        active.set_matrix4(gl, bindings.model_view_matrix, &transforms.model_view);

        trace!("frame stage {:?}", FrameStage::Draw);
        let call = buffer.draw(gl, &binding, &active, Primitive::TriangleStrip);
        debug!("drew {:?} at aspect {}", call, aspect);
        call
    }
}
