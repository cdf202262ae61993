use std::ffi::CStr;
use std::fmt;

use c_str_macro::c_str;

use super::context::{AttribLocation, GraphicsContext, ProgramId, UniformLocation};
use super::ShaderError;

/// Every shader variable the quad pipeline needs a location for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingName {
    VertexPosition,
    ProjectionMatrix,
    ModelViewMatrix,
}

impl BindingName {
    pub const ALL: [BindingName; 3] = [
        BindingName::VertexPosition,
        BindingName::ProjectionMatrix,
        BindingName::ModelViewMatrix,
    ];

    pub fn symbol(self) -> &'static CStr {
        match self {
            BindingName::VertexPosition => c_str!("aVertexPosition"),
            BindingName::ProjectionMatrix => c_str!("uProjectionMatrix"),
            BindingName::ModelViewMatrix => c_str!("uModelViewMatrix"),
        }
    }

    pub fn is_attribute(self) -> bool {
        matches!(self, BindingName::VertexPosition)
    }
}

impl fmt::Display for BindingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol().to_string_lossy())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Attribute(AttribLocation),
    Uniform(UniformLocation),
    Unbound,
}

impl Binding {
    pub fn lookup(gl: &dyn GraphicsContext, program: ProgramId, name: BindingName) -> Binding {
        if name.is_attribute() {
            gl.attrib_location(program, name.symbol())
                .map_or(Binding::Unbound, Binding::Attribute)
        } else {
            gl.uniform_location(program, name.symbol())
                .map_or(Binding::Unbound, Binding::Uniform)
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Binding::Unbound)
    }
}

/// Locations of all `BindingName`s, resolved once after link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingTable {
    pub vertex_position: AttribLocation,
    pub projection_matrix: UniformLocation,
    pub model_view_matrix: UniformLocation,
}

impl BindingTable {
    /// Fails on the first required name the program does not expose.
    pub fn resolve(gl: &dyn GraphicsContext, program: ProgramId) -> Result<Self, ShaderError> {
        let attribute = |name: BindingName| match Binding::lookup(gl, program, name) {
            Binding::Attribute(location) => Ok(location),
            _ => Err(ShaderError::MissingBinding { name }),
        };
        let uniform = |name: BindingName| match Binding::lookup(gl, program, name) {
            Binding::Uniform(location) => Ok(location),
            _ => Err(ShaderError::MissingBinding { name }),
        };

        Ok(BindingTable {
            vertex_position: attribute(BindingName::VertexPosition)?,
            projection_matrix: uniform(BindingName::ProjectionMatrix)?,
            model_view_matrix: uniform(BindingName::ModelViewMatrix)?,
        })
    }

    pub fn get(&self, name: BindingName) -> Binding {
        match name {
            BindingName::VertexPosition => Binding::Attribute(self.vertex_position),
            BindingName::ProjectionMatrix => Binding::Uniform(self.projection_matrix),
            BindingName::ModelViewMatrix => Binding::Uniform(self.model_view_matrix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_match_shader_names() {
        let names: Vec<String> = BindingName::ALL.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["aVertexPosition", "uProjectionMatrix", "uModelViewMatrix"]
        );
    }

    #[test]
    fn only_vertex_position_is_an_attribute() {
        assert!(BindingName::VertexPosition.is_attribute());
        assert!(!BindingName::ProjectionMatrix.is_attribute());
        assert!(!BindingName::ModelViewMatrix.is_attribute());
    }

    #[test]
    fn unbound_is_not_bound() {
        assert!(!Binding::Unbound.is_bound());
        assert!(Binding::Uniform(UniformLocation(0)).is_bound());
    }
}
