use super::context::GraphicsContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Viewport {
    pub fn for_window(w: i32, h: i32) -> Viewport {
        Viewport { x: 0, y: 0, w, h }
    }

    pub fn update_size(&mut self, w: i32, h: i32) {
        self.w = w;
        self.h = h;
    }

    pub fn set_used(&self, gl: &mut dyn GraphicsContext) {
        gl.viewport(self.x, self.y, self.w, self.h);
    }

    /// Width over height. A collapsed drawable reports 1.0 so the
    /// projection stays finite.
    pub fn aspect(&self) -> f32 {
        if self.w <= 0 || self.h <= 0 {
            1.0
        } else {
            self.w as f32 / self.h as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(Viewport::for_window(800, 600).aspect(), 800.0 / 600.0);
    }

    #[test]
    fn zero_height_falls_back_to_square() {
        assert_eq!(Viewport::for_window(640, 0).aspect(), 1.0);
        assert_eq!(Viewport::for_window(0, 480).aspect(), 1.0);
    }

    #[test]
    fn update_size_keeps_origin() {
        let mut viewport = Viewport::for_window(10, 10);
        viewport.update_size(30, 20);
        assert_eq!(viewport, Viewport { x: 0, y: 0, w: 30, h: 20 });
    }
}
