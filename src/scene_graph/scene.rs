use std::collections::HashSet;

use id_arena::Arena;

use crate::asset_pipeline::materials::{MaterialId, ReflectanceMaterial};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::geometry::{Geometry, GeometryId};
use crate::scene_graph::scene_node::{NodeId, SceneNode};

/// Reads a scene document (COLLADA, glTF, ...) into a [`Scene`].
pub trait SceneParser {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<Scene>;
}

/// One node reached by [`Scene::walk`]. `parent` indexes into the returned
/// steps; parents always come before their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkStep {
    pub node: NodeId,
    pub parent: Option<usize>,
    pub depth: usize,
}

/// A parsed scene. Nodes, geometries and materials live in arenas and refer
/// to each other by id; the scene is read-only while it is being converted.
pub struct Scene {
    pub nodes: Arena<SceneNode>,
    pub geometries: Arena<Geometry>,
    pub materials: Arena<ReflectanceMaterial>,
    root: NodeId,
}

impl Scene {
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(SceneNode::new(root_name));

        Self {
            nodes,
            geometries: Arena::new(),
            materials: Arena::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds `node` as the last child of `parent`.
    pub fn add_node(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        node.parent_id = Some(parent);
        let id = self.nodes.alloc(node);

        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.child_ids.push(id);
        }

        id
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.alloc(geometry)
    }

    pub fn add_material(&mut self, material: ReflectanceMaterial) -> MaterialId {
        self.materials.alloc(material)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&ReflectanceMaterial> {
        self.materials.get(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    /// Depth-first, pre-order walk from `start` using an explicit stack.
    ///
    /// Children keep their order. A node reachable through more than one
    /// path is only visited the first time. Without `recursive` only `start`
    /// is returned.
    pub fn walk(&self, start: NodeId, recursive: bool, diagnostics: Diagnostics) -> Vec<WalkStep> {
        let mut steps = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![WalkStep {
            node: start,
            parent: None,
            depth: 0,
        }];

        while let Some(step) = stack.pop() {
            let Some(node) = self.nodes.get(step.node) else {
                continue;
            };

            if !visited.insert(step.node) {
                diagnostics.report(Diagnostic::NodeRevisited {
                    name: node.display_name().to_string(),
                });
                continue;
            }

            let index = steps.len();
            steps.push(step);

            if !recursive {
                break;
            }

            for &child_id in node.child_ids.iter().rev() {
                stack.push(WalkStep {
                    node: child_id,
                    parent: Some(index),
                    depth: step.depth + 1,
                });
            }
        }

        steps
    }

    /// Every geometry-bearing node below and including `start`, in pre-order.
    pub fn geometry_nodes(&self, start: NodeId) -> Vec<NodeId> {
        self.walk(start, true, Diagnostics::default())
            .into_iter()
            .map(|step| step.node)
            .filter(|&id| self.nodes.get(id).is_some_and(|node| node.geometry.is_some()))
            .collect()
    }

    /// Emits the node hierarchy as `NodeVisited` events.
    pub fn dump(&self, diagnostics: Diagnostics) {
        for step in self.walk(self.root, true, diagnostics) {
            if let Some(node) = self.nodes.get(step.node) {
                diagnostics.report(Diagnostic::NodeVisited {
                    depth: step.depth,
                    name: node.display_name().to_string(),
                    has_geometry: node.geometry.is_some(),
                    child_count: node.child_ids.len(),
                });
            }
        }
    }
}
