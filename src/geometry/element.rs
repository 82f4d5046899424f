use std::sync::Arc;

use itertools::{Itertools, MinMaxResult};

use crate::error::IndexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Triangles,
    Polygon,
    TriangleStrip,
    Line,
    Point,
    Unknown,
}

/// One indexed submesh. Indices are tightly packed, `bytes_per_index` wide.
#[derive(Debug, Clone)]
pub struct GeometryElement {
    pub primitive_type: PrimitiveType,
    pub primitive_count: usize,
    pub bytes_per_index: usize,
    pub data: Arc<[u8]>,
}

impl GeometryElement {
    pub fn from_u16_indices(
        primitive_type: PrimitiveType,
        primitive_count: usize,
        indices: &[u16],
    ) -> Self {
        Self {
            primitive_type,
            primitive_count,
            bytes_per_index: 2,
            data: Arc::from(bytemuck::cast_slice::<u16, u8>(indices)),
        }
    }

    pub fn from_u32_indices(
        primitive_type: PrimitiveType,
        primitive_count: usize,
        indices: &[u32],
    ) -> Self {
        Self {
            primitive_type,
            primitive_count,
            bytes_per_index: 4,
            data: Arc::from(bytemuck::cast_slice::<u32, u8>(indices)),
        }
    }

    /// Number of indices a flat index list for this element holds. Strips,
    /// lines and points are not flattened, so they report zero. Counts too
    /// large to address saturate at `usize::MAX`.
    pub fn index_count(&self) -> usize {
        match self.primitive_type {
            PrimitiveType::Triangles => self.primitive_count.saturating_mul(3),
            PrimitiveType::Polygon => self.primitive_count,
            _ => 0,
        }
    }
}

pub fn try_decode_indices(element: &GeometryElement) -> Result<Vec<u32>, IndexError> {
    let index_count = element.index_count();
    let width = element.bytes_per_index;

    if width != 2 && width != 4 {
        return Err(IndexError::UnsupportedWidth {
            bytes_per_index: width,
        });
    }

    let required = index_count.saturating_mul(width);
    if required > element.data.len() {
        return Err(IndexError::Truncated {
            index_count,
            required,
            available: element.data.len(),
        });
    }

    let bytes = &element.data[..required];
    let indices: Vec<u32> = match width {
        2 => bytes
            .chunks_exact(2)
            .map(|chunk| u32::from(bytemuck::pod_read_unaligned::<u16>(chunk)))
            .collect(),
        _ => bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<u32>)
            .collect(),
    };

    match indices.iter().minmax() {
        MinMaxResult::NoElements => log::trace!("Decoded 0 indices"),
        MinMaxResult::OneElement(index) => log::trace!("Decoded 1 index ({})", index),
        MinMaxResult::MinMax(min, max) => {
            log::trace!("Decoded {} indices, range {}..={}", indices.len(), min, max)
        }
    }

    Ok(indices)
}

/// Widens the element's indices to 32 bits. Unsupported widths decode to
/// nothing.
///
/// Failures only reach the `log` facade. Callers that want them on a
/// [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) use
/// [`try_decode_indices`], as the mesh assembler does.
pub fn decode_indices(element: &GeometryElement) -> Vec<u32> {
    try_decode_indices(element).unwrap_or_else(|error| {
        log::warn!("Could not unpack indices: {}", error);
        Vec::new()
    })
}
