//! Reads glTF 2.0 documents (`.gltf` with embedded buffers, or `.glb`) into a
//! [`Scene`]. Vertex data is not copied: every source points into the
//! document's buffers with the accessor's own offset and stride.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use anyhow::Context;
use glam::{Quat, Vec3, Vec4};
use gltf::accessor::DataType;
use gltf::mesh::Mode;
use image::DynamicImage;

use crate::asset_pipeline::materials::{
    MaterialChannel, MaterialId, MaterialImage, ReflectanceMaterial,
};
use crate::geometry::{
    Geometry, GeometryElement, GeometryId, GeometrySource, PrimitiveType, Semantic,
};
use crate::scene_graph::{NodeId, Scene, SceneNode, SceneParser, Transform};

/// [`SceneParser`] for glTF documents.
///
/// Each scene root becomes a child of a synthetic root node. A mesh with
/// more than one primitive keeps its first primitive on the node and gets an
/// identity-transformed child node per extra primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfSceneParser;

impl SceneParser for GltfSceneParser {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<Scene> {
        let (document, buffers, images) =
            gltf::import_slice(bytes).context("Failed to read glTF document")?;

        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("No scenes in glTF document")?;

        let mut import = GltfImport {
            buffers: buffers
                .into_iter()
                .map(|data| Arc::<[u8]>::from(data.0))
                .collect(),
            images: images.into_iter().map(convert_image).collect(),
            scene: Scene::new(gltf_scene.name().unwrap_or("glTF scene")),
            geometries: HashMap::new(),
            materials: HashMap::new(),
        };

        import.spawn_scene(&gltf_scene)?;

        log::debug!(
            "Imported glTF scene: {} nodes, {} geometries, {} materials",
            import.scene.nodes.len(),
            import.scene.geometries.len(),
            import.scene.materials.len()
        );

        Ok(import.scene)
    }
}

struct GltfImport {
    buffers: Vec<Arc<[u8]>>,
    images: Vec<Option<MaterialImage>>,
    scene: Scene,
    geometries: HashMap<(usize, usize), GeometryId>,
    materials: HashMap<Option<usize>, MaterialId>,
}

impl GltfImport {
    fn spawn_scene(&mut self, gltf_scene: &gltf::Scene) -> anyhow::Result<()> {
        let root = self.scene.root();
        let mut visited = HashSet::new();
        let mut stack: Vec<(gltf::Node, NodeId)> =
            gltf_scene.nodes().map(|node| (node, root)).collect();
        stack.reverse();

        while let Some((node, parent)) = stack.pop() {
            if !visited.insert(node.index()) {
                log::warn!("glTF node {} has more than one parent", node.index());
                continue;
            }

            let node_id = self.spawn_node(&node, parent)?;

            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, node_id)));
        }

        Ok(())
    }

    fn spawn_node(&mut self, node: &gltf::Node, parent: NodeId) -> anyhow::Result<NodeId> {
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut scene_node = SceneNode {
            name: node.name().map(String::from),
            transform: Transform::new(
                Vec3::from(translation),
                Quat::from_array(rotation),
                Vec3::from(scale),
            ),
            ..Default::default()
        };

        let Some(mesh) = node.mesh() else {
            return Ok(self.scene.add_node(parent, scene_node));
        };

        let mut primitives = mesh.primitives();

        if let Some(first) = primitives.next() {
            scene_node.geometry = Some(self.geometry(&mesh, &first)?);
        }

        let node_id = self.scene.add_node(parent, scene_node);

        for primitive in primitives {
            let geometry = self.geometry(&mesh, &primitive)?;
            let name = format!(
                "{}_primitive{}",
                node.name().or(mesh.name()).unwrap_or("mesh"),
                primitive.index()
            );
            self.scene.add_node(node_id, SceneNode::new(name).with_geometry(geometry));
        }

        Ok(node_id)
    }

    fn geometry(
        &mut self,
        mesh: &gltf::Mesh,
        primitive: &gltf::Primitive,
    ) -> anyhow::Result<GeometryId> {
        let key = (mesh.index(), primitive.index());
        if let Some(id) = self.geometries.get(&key).copied() {
            return Ok(id);
        }

        let name = match mesh.name() {
            Some(name) if mesh.primitives().count() > 1 => {
                format!("{}_{}", name, primitive.index())
            }
            Some(name) => name.to_string(),
            None => format!("mesh{}_{}", mesh.index(), primitive.index()),
        };

        let mut geometry = Geometry::new(name);
        let mut vertex_count = 0;

        for (gltf_semantic, accessor) in primitive.attributes() {
            let semantic = match gltf_semantic {
                gltf::Semantic::Positions => {
                    vertex_count = accessor.count();
                    Semantic::Vertex
                }
                gltf::Semantic::Normals => Semantic::Normal,
                gltf::Semantic::TexCoords(0) => Semantic::Texcoord,
                gltf::Semantic::Colors(0) => Semantic::Color,
                gltf::Semantic::Tangents => Semantic::Tangent,
                _ => Semantic::Other,
            };

            if let Some(source) = self.source(semantic, &accessor) {
                geometry.sources.push(source);
            }
        }

        geometry.elements.push(self.element(primitive, vertex_count)?);

        let material = self.material(&primitive.material());
        geometry.materials.push(material);

        let id = self.scene.add_geometry(geometry);
        self.geometries.insert(key, id);
        Ok(id)
    }

    fn source(&self, semantic: Semantic, accessor: &gltf::Accessor) -> Option<GeometrySource> {
        if accessor.sparse().is_some() {
            log::warn!("Skipping sparse accessor {}", accessor.index());
            return None;
        }

        let view = accessor.view()?;
        let data = self.buffers.get(view.buffer().index())?.clone();

        Some(GeometrySource {
            semantic,
            data,
            vector_count: accessor.count(),
            components_per_vector: accessor.dimensions().multiplicity(),
            bytes_per_component: accessor.data_type().size(),
            data_offset: view.offset() + accessor.offset(),
            data_stride: view.stride().unwrap_or(accessor.size()),
            float_components: accessor.data_type() == DataType::F32,
        })
    }

    fn element(
        &self,
        primitive: &gltf::Primitive,
        vertex_count: usize,
    ) -> anyhow::Result<GeometryElement> {
        let primitive_type = primitive_type(primitive.mode());

        let Some(accessor) = primitive.indices() else {
            // Unindexed primitives draw their vertices in order.
            let indices: Vec<u32> = (0..vertex_count as u32).collect();
            return Ok(GeometryElement::from_u32_indices(
                primitive_type,
                primitive_count(primitive.mode(), indices.len()),
                &indices,
            ));
        };

        let view = accessor
            .view()
            .context("Index accessor has no buffer view")?;
        let buffer = self
            .buffers
            .get(view.buffer().index())
            .context("Index buffer is missing")?;

        let bytes_per_index = accessor.data_type().size();
        let data = view
            .offset()
            .checked_add(accessor.offset())
            .and_then(|start| byte_range(start, accessor.count(), bytes_per_index))
            .and_then(|range| buffer.get(range))
            .with_context(|| {
                format!(
                    "Index accessor {} reads past the end of its buffer",
                    accessor.index()
                )
            })?;

        Ok(GeometryElement {
            primitive_type,
            primitive_count: primitive_count(primitive.mode(), accessor.count()),
            bytes_per_index,
            data: Arc::from(data),
        })
    }

    fn material(&mut self, material: &gltf::Material) -> MaterialId {
        if let Some(id) = self.materials.get(&material.index()).copied() {
            return id;
        }

        let pbr = material.pbr_metallic_roughness();

        let texture_image = |texture: gltf::Texture| {
            self.images
                .get(texture.source().index())
                .cloned()
                .flatten()
        };

        let diffuse = match pbr
            .base_color_texture()
            .and_then(|info| texture_image(info.texture()))
        {
            Some(image) => MaterialChannel::Image(image),
            None => MaterialChannel::Color(Vec4::from(pbr.base_color_factor())),
        };

        let normal = material
            .normal_texture()
            .and_then(|normal| texture_image(normal.texture()))
            .map(MaterialChannel::Image)
            .unwrap_or_default();

        let [r, g, b] = material.emissive_factor();
        let emission = if r > 0.0 || g > 0.0 || b > 0.0 {
            MaterialChannel::Color(Vec4::new(r, g, b, 1.0))
        } else {
            MaterialChannel::Absent
        };

        let reflectance = ReflectanceMaterial {
            name: material.name().map(String::from),
            diffuse,
            normal,
            emission,
            metalness: MaterialChannel::Scalar(pbr.metallic_factor()),
            roughness: MaterialChannel::Scalar(pbr.roughness_factor()),
            ..Default::default()
        };

        let id = self.scene.add_material(reflectance);
        self.materials.insert(material.index(), id);
        id
    }
}

fn primitive_type(mode: Mode) -> PrimitiveType {
    match mode {
        Mode::Triangles => PrimitiveType::Triangles,
        Mode::TriangleStrip => PrimitiveType::TriangleStrip,
        Mode::Lines | Mode::LineStrip | Mode::LineLoop => PrimitiveType::Line,
        Mode::Points => PrimitiveType::Point,
        Mode::TriangleFan => PrimitiveType::Unknown,
    }
}

/// Bytes covered by `count` items of `width` bytes starting at `start`, or
/// `None` when that range is not addressable.
fn byte_range(start: usize, count: usize, width: usize) -> Option<Range<usize>> {
    let end = count.checked_mul(width)?.checked_add(start)?;
    Some(start..end)
}

fn primitive_count(mode: Mode, index_count: usize) -> usize {
    match mode {
        Mode::Triangles => index_count / 3,
        Mode::TriangleStrip | Mode::TriangleFan => index_count.saturating_sub(2),
        Mode::Lines => index_count / 2,
        Mode::LineStrip => index_count.saturating_sub(1),
        Mode::LineLoop | Mode::Points => index_count,
    }
}

fn convert_image(data: gltf::image::Data) -> Option<MaterialImage> {
    use gltf::image::Format;

    let (width, height) = (data.width, data.height);
    let image = match data.format {
        Format::R8 => image::GrayImage::from_raw(width, height, data.pixels)
            .map(DynamicImage::ImageLuma8),
        Format::R8G8 => image::GrayAlphaImage::from_raw(width, height, data.pixels)
            .map(DynamicImage::ImageLumaA8),
        Format::R8G8B8 => image::RgbImage::from_raw(width, height, data.pixels)
            .map(DynamicImage::ImageRgb8),
        Format::R8G8B8A8 => image::RgbaImage::from_raw(width, height, data.pixels)
            .map(DynamicImage::ImageRgba8),
        other => {
            log::warn!("Unsupported glTF image format: {:?}", other);
            None
        }
    };

    image.map(MaterialImage::from)
}
