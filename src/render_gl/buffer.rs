use log::debug;
use na::Point2;
use nalgebra as na;
use thiserror::Error;

use super::context::{
    AttribLocation, BufferId, BufferUsage, GraphicsContext, Primitive, VertexLayout,
};
use super::ActiveProgram;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("vertex data is empty")]
    Empty,
}

pub struct ArrayBuffer {
    id: BufferId,
}

impl ArrayBuffer {
    pub fn new(gl: &mut dyn GraphicsContext) -> ArrayBuffer {
        ArrayBuffer {
            id: gl.create_buffer(),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Binds as the current array buffer. The binding lasts until the next
    /// bind or `unbind` on the same context.
    pub fn bind<'a>(&'a self, gl: &mut dyn GraphicsContext) -> ArrayBinding<'a> {
        gl.bind_array_buffer(Some(self.id));
        ArrayBinding { buffer: self }
    }

    pub fn unbind(gl: &mut dyn GraphicsContext, binding: ArrayBinding<'_>) {
        drop(binding);
        gl.bind_array_buffer(None);
    }

    pub fn release(self, gl: &mut dyn GraphicsContext) {
        gl.delete_buffer(self.id);
    }
}

/// Proof that an `ArrayBuffer` is the current array buffer.
pub struct ArrayBinding<'a> {
    buffer: &'a ArrayBuffer,
}

impl<'a> ArrayBinding<'a> {
    pub fn buffer(&self) -> &'a ArrayBuffer {
        self.buffer
    }

    pub fn static_draw_data(&self, gl: &mut dyn GraphicsContext, data: &[f32]) {
        gl.array_buffer_data(data, BufferUsage::StaticDraw);
    }

    pub fn vertex_attrib_pointer(
        &self,
        gl: &mut dyn GraphicsContext,
        location: AttribLocation,
        layout: &VertexLayout,
    ) {
        gl.vertex_attrib_pointer(location, layout);
        gl.enable_vertex_attrib_array(location);
    }
}

pub struct VertexBuffer {
    vbo: ArrayBuffer,
    vertex_count: i32,
    layout: VertexLayout,
}

impl VertexBuffer {
    pub fn upload(
        gl: &mut dyn GraphicsContext,
        vertices: &[Point2<f32>],
    ) -> Result<VertexBuffer, BufferError> {
        if vertices.is_empty() {
            return Err(BufferError::Empty);
        }

        let data = vertices
            .iter()
            .flat_map(|p| [p.x, p.y])
            .collect::<Vec<f32>>();

        let vbo = ArrayBuffer::new(gl);
        let binding = vbo.bind(gl);
        binding.static_draw_data(gl, &data);
        ArrayBuffer::unbind(gl, binding);
        debug!("uploaded {} vertices to {:?}", vertices.len(), vbo.id());

        Ok(VertexBuffer {
            vbo,
            vertex_count: vertices.len() as i32,
            layout: VertexLayout::packed_f32(2),
        })
    }

    pub fn id(&self) -> BufferId {
        self.vbo.id()
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn bind<'a>(&'a self, gl: &mut dyn GraphicsContext) -> ArrayBinding<'a> {
        self.vbo.bind(gl)
    }

    /// Draws every vertex. Taking both tokens keeps the bind and activate
    /// steps ahead of the draw.
    pub fn draw(
        &self,
        gl: &mut dyn GraphicsContext,
        _binding: &ArrayBinding<'_>,
        _program: &ActiveProgram<'_>,
        mode: Primitive,
    ) -> DrawCall {
        let call = DrawCall {
            mode,
            first: 0,
            count: self.vertex_count,
        };
        gl.draw_arrays(call.mode, call.first, call.count);
        call
    }

    pub fn release(self, gl: &mut dyn GraphicsContext) {
        self.vbo.release(gl);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: Primitive,
    pub first: i32,
    pub count: i32,
}
