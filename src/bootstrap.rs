use std::convert::TryFrom;

use log::{info, warn};
use thiserror::Error;

use crate::quad::{quad_vertices, ShaderSources};
use crate::render_gl::buffer::{BufferError, DrawCall, VertexBuffer};
use crate::render_gl::{GraphicsContext, Program, Shader, ShaderError, Viewport};
use crate::renderer::Renderer;
use crate::surface::RenderSurface;

/// Everything that stops the pipeline. None of these are retried.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("Unable to initialize OpenGL. Your machine may not support it: {reason}")]
    ContextUnavailable { reason: String },
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Geometry(#[from] BufferError),
}

pub struct Session<C> {
    context: C,
    program: Program,
    buffer: VertexBuffer,
    draw: DrawCall,
}

impl<C: GraphicsContext> Session<C> {
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn buffer(&self) -> &VertexBuffer {
        &self.buffer
    }

    pub fn draw(&self) -> DrawCall {
        self.draw
    }

    pub fn release(self) {
        let Session {
            mut context,
            program,
            buffer,
            ..
        } = self;
        buffer.release(&mut context);
        program.release(&mut context);
        info!("released GPU resources");
    }
}

pub struct Bootstrap {
    sources: ShaderSources,
    renderer: Renderer,
}

impl Bootstrap {
    pub fn new(sources: ShaderSources) -> Self {
        Self {
            sources,
            renderer: Renderer::new(),
        }
    }

    /// Builds the pipeline on `surface` and draws one frame. Any failure is
    /// reported through the surface once, then returned.
    pub fn run<S: RenderSurface>(
        &self,
        surface: &mut S,
    ) -> Result<Session<S::Context>, FatalError> {
        match self.start(surface) {
            Ok(session) => Ok(session),
            Err(e) => {
                surface.report(&e.to_string());
                Err(e)
            }
        }
    }

    fn start<S: RenderSurface>(&self, surface: &mut S) -> Result<Session<S::Context>, FatalError> {
        let mut context = surface
            .acquire_context()
            .map_err(|reason| FatalError::ContextUnavailable { reason })?;

        let (program, buffer, draw) = self.build(&mut context, surface.client_size())?;
        surface.present();
        info!("drew {} vertices", draw.count);

        Ok(Session {
            context,
            program,
            buffer,
            draw,
        })
    }

    fn build(
        &self,
        gl: &mut dyn GraphicsContext,
        (width, height): (u32, u32),
    ) -> Result<(Program, VertexBuffer, DrawCall), FatalError> {
        let vertex = Shader::from_source(gl, &self.sources.vertex)?;
        let fragment = match Shader::from_source(gl, &self.sources.fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                vertex.release(gl);
                return Err(e.into());
            }
        };
        let program = Program::link(gl, vertex, fragment)?;

        let buffer = match VertexBuffer::upload(gl, &quad_vertices()) {
            Ok(buffer) => buffer,
            Err(e) => {
                program.release(gl);
                return Err(e.into());
            }
        };

        let viewport = viewport_for(width, height);
        viewport.set_used(gl);

        let draw = self
            .renderer
            .render_frame(gl, &program, &buffer, viewport.aspect());
        Ok((program, buffer, draw))
    }
}

// A size GL cannot take collapses to zero, which the viewport reports as a
// square aspect.
fn viewport_for(width: u32, height: u32) -> Viewport {
    match (i32::try_from(width), i32::try_from(height)) {
        (Ok(w), Ok(h)) => Viewport::for_window(w, h),
        _ => {
            warn!("drawable size {}x{} is out of range", width, height);
            Viewport::for_window(0, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_keeps_representable_sizes() {
        let viewport = viewport_for(800, 600);
        assert_eq!(viewport, Viewport::for_window(800, 600));
        assert_eq!(viewport.aspect(), 800.0 / 600.0);
    }

    #[test]
    fn oversized_drawable_falls_back_to_square_aspect() {
        let viewport = viewport_for(u32::MAX, 480);
        assert_eq!(viewport, Viewport::for_window(0, 0));
        assert_eq!(viewport.aspect(), 1.0);
    }
}
