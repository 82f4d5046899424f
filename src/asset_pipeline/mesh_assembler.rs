use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::LayoutError;
use crate::geometry::{
    try_decode_indices, try_decode_vec2, try_decode_vec3, Geometry, GeometryElement,
    GeometrySource, PrimitiveType, Semantic,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Primitives {
    Triangles(Vec<u32>),
}

/// Renderer-agnostic vertex data and faces for one submesh.
///
/// Attribute arrays are shared between the submeshes of one geometry and are
/// never mutated after assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDescriptor {
    pub name: String,
    pub positions: Arc<[Vec3]>,
    pub normals: Option<Arc<[Vec3]>>,
    pub texture_coordinates: Option<Arc<[Vec2]>>,
    pub primitives: Option<Primitives>,
}

impl MeshDescriptor {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_indices(&self) -> Option<&[u32]> {
        match &self.primitives {
            Some(Primitives::Triangles(indices)) => Some(indices.as_slice()),
            None => None,
        }
    }
}

struct DecodedAttributes {
    positions: Arc<[Vec3]>,
    normals: Option<Arc<[Vec3]>>,
    texture_coordinates: Option<Arc<[Vec2]>>,
}

/// Turns a geometry's sources and elements into one descriptor per element.
pub struct MeshAssembler<'a> {
    default_name: &'a str,
    diagnostics: Diagnostics<'a>,
}

impl Default for MeshAssembler<'static> {
    fn default() -> Self {
        Self {
            default_name: "dae",
            diagnostics: Diagnostics::default(),
        }
    }
}

impl<'a> MeshAssembler<'a> {
    pub fn new(default_name: &'a str, diagnostics: Diagnostics<'a>) -> Self {
        Self {
            default_name,
            diagnostics,
        }
    }

    pub fn build_descriptors(&self, geometry: &Geometry) -> Vec<MeshDescriptor> {
        let name = geometry.name.as_deref().unwrap_or(self.default_name);

        // Decoded once, shared by every element
        let Some(attributes) = self.decode_attributes(name, geometry) else {
            self.diagnostics.report(Diagnostic::MissingPositions {
                geometry: name.to_string(),
            });
            return Vec::new();
        };

        self.diagnostics.report(Diagnostic::GeometrySummary {
            name: name.to_string(),
            vertex_count: attributes.positions.len(),
            element_count: geometry.elements.len(),
        });

        geometry
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                self.build_descriptor(format!("{}_{}", name, index), &attributes, element)
            })
            .collect()
    }

    fn decode_attributes(&self, name: &str, geometry: &Geometry) -> Option<DecodedAttributes> {
        let positions = self.decode_source(name, geometry, Semantic::Vertex, try_decode_vec3)?;
        if positions.is_empty() {
            return None;
        }

        let normals = self.decode_source(name, geometry, Semantic::Normal, try_decode_vec3);
        let texture_coordinates =
            self.decode_source(name, geometry, Semantic::Texcoord, try_decode_vec2);

        Some(DecodedAttributes {
            positions: positions.into(),
            normals: normals.map(Arc::from),
            texture_coordinates: texture_coordinates.map(Arc::from),
        })
    }

    fn decode_source<T>(
        &self,
        name: &str,
        geometry: &Geometry,
        semantic: Semantic,
        decode: fn(&GeometrySource) -> Result<Vec<T>, LayoutError>,
    ) -> Option<Vec<T>> {
        let source = geometry.source(semantic)?;

        match decode(source) {
            Ok(values) => Some(values),
            Err(error) => {
                self.diagnostics.report(Diagnostic::MalformedSource {
                    geometry: name.to_string(),
                    semantic,
                    error,
                });
                None
            }
        }
    }

    fn build_descriptor(
        &self,
        name: String,
        attributes: &DecodedAttributes,
        element: &GeometryElement,
    ) -> MeshDescriptor {
        let vertex_count = attributes.positions.len();

        log::debug!(
            "{}: {} {:?} primitives",
            name,
            element.primitive_count,
            element.primitive_type
        );

        let normals =
            self.matching_attribute(&name, Semantic::Normal, &attributes.normals, vertex_count);
        let texture_coordinates = self.matching_attribute(
            &name,
            Semantic::Texcoord,
            &attributes.texture_coordinates,
            vertex_count,
        );
        let primitives = self.primitives(&name, element);

        MeshDescriptor {
            name,
            positions: attributes.positions.clone(),
            normals,
            texture_coordinates,
            primitives,
        }
    }

    /// Attributes whose count differs from the vertex count are dropped, not
    /// padded or truncated.
    fn matching_attribute<T>(
        &self,
        descriptor: &str,
        semantic: Semantic,
        attribute: &Option<Arc<[T]>>,
        vertex_count: usize,
    ) -> Option<Arc<[T]>> {
        let attribute = attribute.as_ref()?;

        if attribute.len() != vertex_count {
            self.diagnostics.report(Diagnostic::AttributeCountMismatch {
                descriptor: descriptor.to_string(),
                semantic,
                count: attribute.len(),
                expected: vertex_count,
            });
            return None;
        }

        Some(attribute.clone())
    }

    fn primitives(&self, descriptor: &str, element: &GeometryElement) -> Option<Primitives> {
        if element.primitive_type != PrimitiveType::Triangles {
            self.diagnostics.report(Diagnostic::UnsupportedTopology {
                descriptor: descriptor.to_string(),
                primitive_type: element.primitive_type,
            });
            return None;
        }

        match try_decode_indices(element) {
            Ok(indices) => Some(Primitives::Triangles(indices)),
            Err(error) => {
                self.diagnostics.report(Diagnostic::IndexDecodeFailed {
                    descriptor: descriptor.to_string(),
                    error,
                });
                None
            }
        }
    }
}
