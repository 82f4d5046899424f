use id_arena::Id;

use crate::asset_pipeline::materials::ReflectanceMaterial;
use crate::geometry::GeometryId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<SceneNode>;

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub geometry: Option<GeometryId>,
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryId) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a SceneNode> {
        self.parent_id.and_then(|id| scene.node(id))
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b SceneNode> + 'b
    where
        'a: 'b,
    {
        self.child_ids.iter().filter_map(move |id| scene.node(*id))
    }

    /// Materials of the attached geometry, in element order.
    pub fn materials<'a>(&self, scene: &'a Scene) -> Vec<&'a ReflectanceMaterial> {
        self.geometry
            .and_then(|id| scene.geometry(id))
            .map(|geometry| {
                geometry
                    .materials
                    .iter()
                    .filter_map(|id| scene.material(*id))
                    .collect()
            })
            .unwrap_or_default()
    }
}
