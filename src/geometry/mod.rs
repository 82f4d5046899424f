mod element;
mod source;

use id_arena::Id;

use crate::asset_pipeline::materials::MaterialId;

pub use element::{decode_indices, try_decode_indices, GeometryElement, PrimitiveType};
pub use source::{
    decode_vec2, decode_vec3, try_decode_vec2, try_decode_vec3, GeometrySource, Semantic,
};

pub type GeometryId = Id<Geometry>;

/// Vertex attribute channels plus the indexed submeshes drawn from them.
///
/// `materials` is index-aligned with `elements`: the n-th material shades the
/// n-th element.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub name: Option<String>,
    pub sources: Vec<GeometrySource>,
    pub elements: Vec<GeometryElement>,
    pub materials: Vec<MaterialId>,
}

impl Geometry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: GeometrySource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_element(mut self, element: GeometryElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.materials.push(material);
        self
    }

    /// The first source carrying `semantic`.
    pub fn source(&self, semantic: Semantic) -> Option<&GeometrySource> {
        self.sources
            .iter()
            .find(|source| source.semantic == semantic)
    }
}
