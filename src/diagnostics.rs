//! Optional event stream describing what a conversion did and where it had to
//! degrade its output. Every event is also written to the `log` facade.

use std::fmt;

use crate::error::{IndexError, LayoutError};
use crate::geometry::{PrimitiveType, Semantic};

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    NodeVisited {
        depth: usize,
        name: String,
        has_geometry: bool,
        child_count: usize,
    },
    NodeRevisited {
        name: String,
    },
    GeometrySummary {
        name: String,
        vertex_count: usize,
        element_count: usize,
    },
    MalformedSource {
        geometry: String,
        semantic: Semantic,
        error: LayoutError,
    },
    MissingPositions {
        geometry: String,
    },
    AttributeCountMismatch {
        descriptor: String,
        semantic: Semantic,
        count: usize,
        expected: usize,
    },
    IndexDecodeFailed {
        descriptor: String,
        error: IndexError,
    },
    UnsupportedTopology {
        descriptor: String,
        primitive_type: PrimitiveType,
    },
    TextureFailed {
        material: String,
        channel: &'static str,
        reason: String,
    },
    NoMaterialProperties {
        material: String,
    },
    MeshCreationFailed {
        name: String,
        reason: String,
    },
    ParseFailed {
        reason: String,
    },
    NoGeometry,
}

impl Diagnostic {
    pub fn level(&self) -> log::Level {
        match self {
            Diagnostic::NodeVisited { .. } | Diagnostic::GeometrySummary { .. } => {
                log::Level::Debug
            }
            Diagnostic::ParseFailed { .. } | Diagnostic::MeshCreationFailed { .. } => {
                log::Level::Error
            }
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NodeVisited {
                depth,
                name,
                has_geometry,
                child_count,
            } => write!(
                f,
                "{:indent$}node {name} (geometry: {has_geometry}, children: {child_count})",
                "",
                indent = depth * 2
            ),
            Diagnostic::NodeRevisited { name } => {
                write!(f, "node {name} is reachable twice, skipping the repeat")
            }
            Diagnostic::GeometrySummary {
                name,
                vertex_count,
                element_count,
            } => write!(
                f,
                "geometry {name} has {vertex_count} vertices, {element_count} elements"
            ),
            Diagnostic::MalformedSource {
                geometry,
                semantic,
                error,
            } => write!(f, "dropping {semantic:?} source of {geometry}: {error}"),
            Diagnostic::MissingPositions { geometry } => {
                write!(f, "geometry {geometry} has no usable positions")
            }
            Diagnostic::AttributeCountMismatch {
                descriptor,
                semantic,
                count,
                expected,
            } => write!(
                f,
                "{descriptor}: {semantic:?} count ({count}) doesn't match vertex count ({expected})"
            ),
            Diagnostic::IndexDecodeFailed { descriptor, error } => {
                write!(f, "{descriptor}: could not decode indices: {error}")
            }
            Diagnostic::UnsupportedTopology {
                descriptor,
                primitive_type,
            } => write!(
                f,
                "{descriptor}: {primitive_type:?} primitives are not converted"
            ),
            Diagnostic::TextureFailed {
                material,
                channel,
                reason,
            } => write!(f, "material {material}: {channel} texture failed: {reason}"),
            Diagnostic::NoMaterialProperties { material } => {
                write!(f, "material {material} has no convertible properties")
            }
            Diagnostic::MeshCreationFailed { name, reason } => {
                write!(f, "failed to create mesh for {name}: {reason}")
            }
            Diagnostic::ParseFailed { reason } => write!(f, "failed to parse scene: {reason}"),
            Diagnostic::NoGeometry => write!(f, "no geometry found in scene"),
        }
    }
}

/// Receiver for conversion events.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic),
{
    fn emit(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Logs every event and forwards it to the installed sink, if any.
#[derive(Clone, Copy, Default)]
pub struct Diagnostics<'a> {
    sink: Option<&'a dyn DiagnosticSink>,
}

impl<'a> Diagnostics<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        log::log!(diagnostic.level(), "{}", diagnostic);

        if let Some(sink) = self.sink {
            sink.emit(&diagnostic);
        }
    }
}
