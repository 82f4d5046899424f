//! Converts parsed scene graphs (COLLADA-style nodes, strided vertex sources,
//! indexed elements and reflectance materials) into renderer-ready meshes and
//! physically-based materials.

pub mod asset_pipeline;
pub mod config;
pub mod converter;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod importers;
pub mod math;
pub mod model;
pub mod render_entity;
pub mod scene_graph;
pub mod texture;

pub use asset_pipeline::materials::{
    BaseColor, MaterialChannel, MaterialImage, MaterialResolver, PbrMaterial, PbrValue,
    ReflectanceMaterial,
};
pub use asset_pipeline::mesh_assembler::{MeshAssembler, MeshDescriptor, Primitives};
pub use config::ConversionOptions;
pub use converter::{ConvertedEntity, Converter};
pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
pub use error::{IndexError, LayoutError};
pub use importers::GltfSceneParser;
pub use model::{CpuMeshFactory, MeshResourceFactory, Model};
pub use render_entity::{EntityModel, RenderEntity};
pub use scene_graph::{NodeId, Scene, SceneNode, SceneParser, Transform};
pub use texture::{CpuTextureFactory, TextureRef, TextureResourceFactory, TextureSemantic};
