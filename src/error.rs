use thiserror::Error;

use crate::geometry::Semantic;

/// Why a vertex source could not be unpacked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{semantic:?} source cannot be read as {expected}-component vectors")]
    SemanticMismatch { semantic: Semantic, expected: usize },

    #[error("expected {expected} components per vector, found {found}")]
    ComponentCount { expected: usize, found: usize },

    #[error("expected 4-byte components, found {found} bytes per component")]
    ComponentWidth { found: usize },

    #[error("components are not floating point")]
    NotFloat,

    #[error("stride of {stride} bytes is smaller than a {vector_size}-byte vector")]
    StrideTooSmall { stride: usize, vector_size: usize },

    #[error("layout needs {required} bytes but the buffer holds {available}")]
    OutOfBounds { required: usize, available: usize },
}

/// Why an index buffer could not be unpacked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("{bytes_per_index}-byte indices are not supported")]
    UnsupportedWidth { bytes_per_index: usize },

    #[error("{index_count} indices need {required} bytes but the buffer holds {available}")]
    Truncated {
        index_count: usize,
        required: usize,
        available: usize,
    },
}
