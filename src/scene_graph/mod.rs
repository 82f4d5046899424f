pub mod scene;
pub mod scene_node;
pub mod transform;

pub use scene::{Scene, SceneParser, WalkStep};
pub use scene_node::{NodeId, SceneNode};
pub use transform::Transform;
