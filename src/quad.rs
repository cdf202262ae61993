use na::Point2;
use nalgebra as na;

use crate::render_gl::{ShaderError, ShaderSource, ShaderStage};
use crate::resources::Resources;

pub const VERTEX_SHADER: &str = include_str!("../assets/shaders/quad.vert");
pub const FRAGMENT_SHADER: &str = include_str!("../assets/shaders/quad.frag");

/// Unit quad laid out as a triangle strip.
pub fn quad_vertices() -> [Point2<f32>; 4] {
    [
        Point2::new(1.0, 1.0),
        Point2::new(-1.0, 1.0),
        Point2::new(1.0, -1.0),
        Point2::new(-1.0, -1.0),
    ]
}

#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

impl ShaderSources {
    pub fn embedded() -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: ShaderSource::vertex(VERTEX_SHADER)?,
            fragment: ShaderSource::fragment(FRAGMENT_SHADER)?,
        })
    }

    /// Loads `<name>.vert` and `<name>.frag`.
    pub fn from_res(res: &Resources, name: &str) -> Result<Self, ShaderError> {
        let vert_name = format!("{}{}", name, ShaderStage::Vertex.extension());
        let frag_name = format!("{}{}", name, ShaderStage::Fragment.extension());
        Ok(Self {
            vertex: ShaderSource::from_res(res, &vert_name)?,
            fragment: ShaderSource::from_res(res, &frag_name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sources_have_their_stages() {
        let sources = ShaderSources::embedded().unwrap();
        assert_eq!(sources.vertex.stage(), ShaderStage::Vertex);
        assert_eq!(sources.fragment.stage(), ShaderStage::Fragment);
    }

    #[test]
    fn loads_both_stages_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quad.vert"), VERTEX_SHADER).unwrap();
        std::fs::write(dir.path().join("quad.frag"), FRAGMENT_SHADER).unwrap();

        let sources = ShaderSources::from_res(&Resources::from_dir(dir.path()), "quad").unwrap();
        assert_eq!(sources.vertex.stage(), ShaderStage::Vertex);
        assert_eq!(sources.fragment.stage(), ShaderStage::Fragment);
        assert_eq!(sources.vertex.text().to_str().unwrap(), VERTEX_SHADER);
        assert_eq!(sources.fragment.text().to_str().unwrap(), FRAGMENT_SHADER);
    }

    #[test]
    fn missing_fragment_file_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quad.vert"), VERTEX_SHADER).unwrap();

        let err = ShaderSources::from_res(&Resources::from_dir(dir.path()), "quad").unwrap_err();
        assert!(matches!(err, ShaderError::ResourceLoad { ref name, .. } if name == "quad.frag"));
    }

    #[test]
    fn vertex_shader_names_match_bindings() {
        for name in &["aVertexPosition", "uProjectionMatrix", "uModelViewMatrix", "gl_Position"] {
            assert!(VERTEX_SHADER.contains(name), "missing {}", name);
        }
        assert!(FRAGMENT_SHADER.contains("gl_FragColor"));
    }

    #[test]
    fn quad_is_four_corners() {
        let flat: Vec<f32> = quad_vertices().iter().flat_map(|p| [p.x, p.y]).collect();
        assert_eq!(flat, vec![1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0]);
    }
}
