use glam::Mat4;

use crate::asset_pipeline::materials::PbrMaterial;
use crate::scene_graph::Transform;

/// A mesh with one optional material per submesh.
pub struct EntityModel<M, T> {
    pub mesh: M,
    pub materials: Vec<Option<PbrMaterial<T>>>,
}

/// Converted node. `transform` is local to the parent entity.
pub struct RenderEntity<M, T> {
    pub name: Option<String>,
    pub transform: Transform,
    pub model: Option<EntityModel<M, T>>,
    pub children: Vec<RenderEntity<M, T>>,
}

impl<M, T> RenderEntity<M, T> {
    pub fn new(name: Option<String>, transform: Transform) -> Self {
        Self {
            name,
            transform,
            model: None,
            children: Vec::new(),
        }
    }

    /// Pre-order iterator over this entity and all of its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &RenderEntity<M, T>> {
        let mut stack = vec![self];

        std::iter::from_fn(move || {
            let entity = stack.pop()?;
            stack.extend(entity.children.iter().rev());
            Some(entity)
        })
    }

    pub fn entity_count(&self) -> usize {
        self.iter().count()
    }

    pub fn find(&self, name: &str) -> Option<&RenderEntity<M, T>> {
        self.iter()
            .find(|entity| entity.name.as_deref() == Some(name))
    }

    /// World matrix of every entity in [`RenderEntity::iter`] order, with
    /// this entity's parent space taken as world space.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut matrices = Vec::new();
        let mut stack = vec![(self, Mat4::IDENTITY)];

        while let Some((entity, parent_world_matrix)) = stack.pop() {
            let world_matrix = parent_world_matrix * entity.transform.to_matrix();
            matrices.push(world_matrix);

            for child in entity.children.iter().rev() {
                stack.push((child, world_matrix));
            }
        }

        matrices
    }
}

// Deep hierarchies are torn down with a loop instead of nested drops.
impl<M, T> Drop for RenderEntity<M, T> {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);

        while let Some(mut entity) = stack.pop() {
            stack.append(&mut entity.children);
        }
    }
}
