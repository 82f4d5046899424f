use std::sync::Arc;

use bytemuck::Pod;
use glam::{Vec2, Vec3};

use crate::error::LayoutError;

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Vertex,
    Normal,
    Texcoord,
    Color,
    Tangent,
    Other,
}

impl Semantic {
    /// Number of float components this channel is unpacked into, if it is
    /// unpacked at all.
    pub fn arity(self) -> Option<usize> {
        match self {
            Semantic::Vertex | Semantic::Normal => Some(3),
            Semantic::Texcoord => Some(2),
            _ => None,
        }
    }
}

/// One vertex attribute channel stored in a raw, possibly interleaved buffer.
///
/// Vector `i` starts at `data_offset + i * data_stride` bytes; any bytes past
/// the vector's components within a stride belong to other channels.
#[derive(Debug, Clone)]
pub struct GeometrySource {
    pub semantic: Semantic,
    pub data: Arc<[u8]>,
    pub vector_count: usize,
    pub components_per_vector: usize,
    pub bytes_per_component: usize,
    pub data_offset: usize,
    pub data_stride: usize,
    pub float_components: bool,
}

impl GeometrySource {
    pub fn from_positions(positions: &[Vec3]) -> Self {
        Self::tightly_packed(Semantic::Vertex, positions, 3)
    }

    pub fn from_normals(normals: &[Vec3]) -> Self {
        Self::tightly_packed(Semantic::Normal, normals, 3)
    }

    pub fn from_texcoords(texcoords: &[Vec2]) -> Self {
        Self::tightly_packed(Semantic::Texcoord, texcoords, 2)
    }

    fn tightly_packed<T: Pod>(semantic: Semantic, values: &[T], components: usize) -> Self {
        Self {
            semantic,
            data: Arc::from(bytemuck::cast_slice::<T, u8>(values)),
            vector_count: values.len(),
            components_per_vector: components,
            bytes_per_component: FLOAT_SIZE,
            data_offset: 0,
            data_stride: components * FLOAT_SIZE,
            float_components: true,
        }
    }

    fn validate(&self, components: usize) -> Result<(), LayoutError> {
        if self.semantic.arity() != Some(components) {
            return Err(LayoutError::SemanticMismatch {
                semantic: self.semantic,
                expected: components,
            });
        }

        if self.components_per_vector != components {
            return Err(LayoutError::ComponentCount {
                expected: components,
                found: self.components_per_vector,
            });
        }

        if self.bytes_per_component != FLOAT_SIZE {
            return Err(LayoutError::ComponentWidth {
                found: self.bytes_per_component,
            });
        }

        if !self.float_components {
            return Err(LayoutError::NotFloat);
        }

        let vector_size = components * FLOAT_SIZE;
        if self.data_stride < vector_size {
            return Err(LayoutError::StrideTooSmall {
                stride: self.data_stride,
                vector_size,
            });
        }

        if self.vector_count == 0 {
            return Ok(());
        }

        let required = (self.vector_count - 1)
            .checked_mul(self.data_stride)
            .and_then(|last| last.checked_add(self.data_offset))
            .and_then(|last| last.checked_add(vector_size))
            .unwrap_or(usize::MAX);

        if required > self.data.len() {
            return Err(LayoutError::OutOfBounds {
                required,
                available: self.data.len(),
            });
        }

        Ok(())
    }

    fn unpack<const N: usize>(&self) -> Result<Vec<[f32; N]>, LayoutError>
    where
        [f32; N]: Pod,
    {
        self.validate(N)?;

        let vector_size = N * FLOAT_SIZE;
        let vectors = (0..self.vector_count)
            .map(|i| {
                let start = self.data_offset + i * self.data_stride;
                bytemuck::pod_read_unaligned(&self.data[start..start + vector_size])
            })
            .collect();

        Ok(vectors)
    }
}

pub fn try_decode_vec3(source: &GeometrySource) -> Result<Vec<Vec3>, LayoutError> {
    Ok(source
        .unpack::<3>()?
        .into_iter()
        .map(Vec3::from_array)
        .collect())
}

pub fn try_decode_vec2(source: &GeometrySource) -> Result<Vec<Vec2>, LayoutError> {
    Ok(source
        .unpack::<2>()?
        .into_iter()
        .map(Vec2::from_array)
        .collect())
}

/// Unpacks a 3-component float source. Malformed layouts decode to nothing.
///
/// The failure is only logged. [`try_decode_vec3`] hands it back instead,
/// which is how [`MeshAssembler`](crate::asset_pipeline::mesh_assembler::MeshAssembler)
/// forwards it to a [`DiagnosticSink`](crate::diagnostics::DiagnosticSink).
pub fn decode_vec3(source: &GeometrySource) -> Vec<Vec3> {
    try_decode_vec3(source).unwrap_or_else(|error| {
        log::warn!("Unexpected data format for {:?} source: {}", source.semantic, error);
        Vec::new()
    })
}

/// Unpacks a 2-component float source. Malformed layouts decode to nothing.
/// Like [`decode_vec3`], the failure is only logged; see [`try_decode_vec2`].
pub fn decode_vec2(source: &GeometrySource) -> Vec<Vec2> {
    try_decode_vec2(source).unwrap_or_else(|error| {
        log::warn!("Unexpected data format for {:?} source: {}", source.semantic, error);
        Vec::new()
    })
}
