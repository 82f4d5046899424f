mod gltf_importer;

pub use gltf_importer::GltfSceneParser;
