use na::Vector4;
use nalgebra as na;

use super::context::{ClearMask, DepthFunc, GraphicsContext};

pub struct ColorBuffer {
    pub color: Vector4<f32>,
    pub depth: f32,
}

impl ColorBuffer {
    pub fn opaque_black() -> Self {
        Self::from_color(Vector4::new(0.0, 0.0, 0.0, 1.0))
    }

    pub fn from_color(color: Vector4<f32>) -> Self {
        Self { color, depth: 1.0 }
    }

    /// Sets clear values and a depth test where nearer or equal fragments win.
    pub fn set_used(&self, gl: &mut dyn GraphicsContext) {
        gl.clear_color(self.color.x, self.color.y, self.color.z, self.color.w);
        gl.clear_depth(self.depth);
        gl.enable_depth_test(DepthFunc::LessOrEqual);
    }

    pub fn clear(&self, gl: &mut dyn GraphicsContext) {
        gl.clear(ClearMask::COLOR_DEPTH);
    }
}
