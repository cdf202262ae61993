pub mod bootstrap;
pub mod logging;
pub mod quad;
pub mod render_gl;
pub mod renderer;
pub mod resources;
pub mod surface;
pub mod transform;
