use log::warn;
use na::{Matrix4, Vector3};
use nalgebra as na;

pub const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

/// Where the quad sits relative to the camera.
pub const MODEL_OFFSET: [f32; 3] = [0.0, 0.0, -6.0];

#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransforms {
    pub projection: Matrix4<f32>,
    pub model_view: Matrix4<f32>,
}

impl FrameTransforms {
    pub fn for_aspect(aspect: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            warn!("invalid aspect ratio {}, using 1.0", aspect);
            1.0
        };

        let projection = Matrix4::new_perspective(
            aspect,
            FIELD_OF_VIEW_DEGREES.to_radians(),
            Z_NEAR,
            Z_FAR,
        );
        let model_view = Matrix4::new_translation(&Vector3::from(MODEL_OFFSET));

        Self {
            projection,
            model_view,
        }
    }
}
