//! Turns a parsed [`Scene`] into a tree of [`RenderEntity`]s, or into flat
//! descriptor and material lists for callers that merge everything into one
//! mesh.

use crate::asset_pipeline::materials::{MaterialResolver, PbrMaterial, ReflectanceMaterial};
use crate::asset_pipeline::mesh_assembler::{MeshAssembler, MeshDescriptor};
use crate::config::ConversionOptions;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
use crate::geometry::Geometry;
use crate::model::MeshResourceFactory;
use crate::render_entity::{EntityModel, RenderEntity};
use crate::scene_graph::{NodeId, Scene, SceneParser, Transform};
use crate::texture::TextureResourceFactory;

pub type ConvertedEntity<M, T> = RenderEntity<
    <M as MeshResourceFactory>::Mesh,
    <T as TextureResourceFactory>::Texture,
>;

type ConvertedMaterial<T> = PbrMaterial<<T as TextureResourceFactory>::Texture>;

pub struct Converter<'a, M, T> {
    meshes: &'a M,
    textures: &'a T,
    options: ConversionOptions,
    diagnostics: Diagnostics<'a>,
}

impl<'a, M, T> Converter<'a, M, T>
where
    M: MeshResourceFactory,
    T: TextureResourceFactory,
{
    pub fn new(meshes: &'a M, textures: &'a T) -> Self {
        Self {
            meshes,
            textures,
            options: ConversionOptions::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_diagnostics(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.diagnostics = Diagnostics::new(sink);
        self
    }

    /// Converts the whole scene, starting at its root.
    pub async fn convert_scene(&self, scene: &Scene) -> Option<ConvertedEntity<M, T>> {
        self.convert_node(scene, scene.root(), self.options.recursive)
            .await
    }

    pub fn convert_scene_blocking(&self, scene: &Scene) -> Option<ConvertedEntity<M, T>> {
        pollster::block_on(self.convert_scene(scene))
    }

    /// Parses `bytes` and converts the resulting scene. A document the parser
    /// rejects produces no entity.
    pub async fn convert_bytes<P>(&self, parser: &P, bytes: &[u8]) -> Option<ConvertedEntity<M, T>>
    where
        P: SceneParser + ?Sized,
    {
        match parser.parse(bytes) {
            Ok(scene) => self.convert_scene(&scene).await,
            Err(error) => {
                self.diagnostics.report(Diagnostic::ParseFailed {
                    reason: format!("{:#}", error),
                });
                None
            }
        }
    }

    /// Like [`Converter::convert_bytes`], retrying with `fallback` when
    /// `primary` cannot read the document.
    pub async fn convert_bytes_with_fallback<P, Q>(
        &self,
        primary: &P,
        fallback: &Q,
        bytes: &[u8],
    ) -> Option<ConvertedEntity<M, T>>
    where
        P: SceneParser + ?Sized,
        Q: SceneParser + ?Sized,
    {
        let scene = match primary.parse(bytes) {
            Ok(scene) => scene,
            Err(error) => {
                log::info!("Primary parser failed ({:#}), trying fallback", error);
                match fallback.parse(bytes) {
                    Ok(scene) => scene,
                    Err(error) => {
                        self.diagnostics.report(Diagnostic::ParseFailed {
                            reason: format!("{:#}", error),
                        });
                        return None;
                    }
                }
            }
        };

        self.convert_scene(&scene).await
    }

    /// Builds the entity for `node` and, when `recursive`, for its whole
    /// subtree. Transforms are copied as local transforms; nothing is
    /// pre-multiplied by the parent.
    ///
    /// Returns `None` only when `node` is not part of `scene`.
    pub async fn convert_node(
        &self,
        scene: &Scene,
        node: NodeId,
        recursive: bool,
    ) -> Option<ConvertedEntity<M, T>> {
        let steps = scene.walk(node, recursive, self.diagnostics);
        let mut entities: Vec<Option<ConvertedEntity<M, T>>> = Vec::with_capacity(steps.len());

        for step in &steps {
            let Some(scene_node) = scene.node(step.node) else {
                entities.push(None);
                continue;
            };

            self.diagnostics.report(Diagnostic::NodeVisited {
                depth: step.depth,
                name: scene_node.display_name().to_string(),
                has_geometry: scene_node.geometry.is_some(),
                child_count: scene_node.child_ids.len(),
            });

            let mut entity = RenderEntity::new(scene_node.name.clone(), scene_node.transform);

            if let Some(geometry) = scene_node.geometry.and_then(|id| scene.geometry(id)) {
                entity.model = self
                    .build_model(scene, geometry, scene_node.display_name())
                    .await;
            }

            entities.push(Some(entity));
        }

        // Children come after their parent, so walking backwards completes
        // every subtree before it is attached. Siblings arrive reversed.
        for index in (1..steps.len()).rev() {
            let Some(mut entity) = entities[index].take() else {
                continue;
            };
            entity.children.reverse();

            if let Some(Some(parent)) = steps[index].parent.and_then(|p| entities.get_mut(p)) {
                parent.children.push(entity);
            }
        }

        let mut root = entities.into_iter().next().flatten()?;
        root.children.reverse();

        Some(root)
    }

    /// Converts every geometry below `node` into a single mesh on a single
    /// entity. Returns `None` when there is nothing to render.
    pub async fn convert_flattened(
        &self,
        scene: &Scene,
        node: NodeId,
    ) -> Option<ConvertedEntity<M, T>> {
        let mut descriptors = Vec::new();
        let mut materials = Vec::new();

        for node_id in scene.geometry_nodes(node) {
            let Some(geometry) = scene
                .node(node_id)
                .and_then(|node| node.geometry)
                .and_then(|id| scene.geometry(id))
            else {
                continue;
            };

            let geometry_descriptors = self.build_descriptors(geometry);
            materials.extend(self.resolve_materials(scene, geometry, geometry_descriptors.len()));
            descriptors.extend(geometry_descriptors);
        }

        if descriptors.is_empty() {
            self.diagnostics.report(Diagnostic::NoGeometry);
            return None;
        }

        log::info!(
            "Merging {} submeshes into one mesh",
            descriptors.len()
        );

        let name = scene.node(node).and_then(|node| node.name.clone());
        let label = name.clone().unwrap_or_else(|| "scene".to_string());
        let mesh = self.create_mesh(descriptors, &label).await?;

        let mut entity = RenderEntity::new(name, Transform::IDENTITY);
        entity.model = Some(EntityModel { mesh, materials });
        Some(entity)
    }

    /// Descriptors of every geometry-bearing node below `node`, in pre-order.
    pub fn collect_all_descriptors(&self, scene: &Scene, node: NodeId) -> Vec<MeshDescriptor> {
        scene
            .geometry_nodes(node)
            .into_iter()
            .filter_map(|id| scene.node(id)?.geometry)
            .filter_map(|id| scene.geometry(id))
            .flat_map(|geometry| self.build_descriptors(geometry))
            .collect()
    }

    /// Resolved materials of every geometry-bearing node below `node`.
    /// Materials that resolve to nothing are left out.
    pub fn collect_all_materials(&self, scene: &Scene, node: NodeId) -> Vec<ConvertedMaterial<T>> {
        scene
            .geometry_nodes(node)
            .into_iter()
            .filter_map(|id| scene.node(id)?.geometry)
            .filter_map(|id| scene.geometry(id))
            .flat_map(|geometry| geometry.materials.iter())
            .filter_map(|id| scene.material(*id))
            .filter_map(|material| self.resolve_material(material))
            .collect()
    }

    pub fn build_descriptors(&self, geometry: &Geometry) -> Vec<MeshDescriptor> {
        MeshAssembler::new(&self.options.default_geometry_name, self.diagnostics)
            .build_descriptors(geometry)
    }

    pub fn resolve_material(&self, material: &ReflectanceMaterial) -> Option<ConvertedMaterial<T>> {
        MaterialResolver::new(self.textures, self.options.shininess_range, self.diagnostics)
            .resolve(material)
    }

    /// One entry per submesh: the material at the same index, if it exists
    /// and resolves.
    fn resolve_materials(
        &self,
        scene: &Scene,
        geometry: &Geometry,
        submesh_count: usize,
    ) -> Vec<Option<ConvertedMaterial<T>>> {
        (0..submesh_count)
            .map(|index| {
                geometry
                    .materials
                    .get(index)
                    .and_then(|id| scene.material(*id))
                    .and_then(|material| self.resolve_material(material))
            })
            .collect()
    }

    async fn build_model(
        &self,
        scene: &Scene,
        geometry: &Geometry,
        node_name: &str,
    ) -> Option<EntityModel<M::Mesh, T::Texture>> {
        let descriptors = self.build_descriptors(geometry);
        if descriptors.is_empty() {
            return None;
        }

        let materials = self.resolve_materials(scene, geometry, descriptors.len());
        let mesh = self.create_mesh(descriptors, node_name).await?;

        Some(EntityModel { mesh, materials })
    }

    async fn create_mesh(&self, descriptors: Vec<MeshDescriptor>, name: &str) -> Option<M::Mesh> {
        match self.meshes.create_mesh(descriptors).await {
            Ok(mesh) => Some(mesh),
            Err(error) => {
                self.diagnostics.report(Diagnostic::MeshCreationFailed {
                    name: name.to_string(),
                    reason: format!("{:#}", error),
                });
                None
            }
        }
    }
}
