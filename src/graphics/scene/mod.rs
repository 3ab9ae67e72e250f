//! The draw-side view of a scene: meshes and the nodes which place them.

mod mesh;
mod scene_node;

pub use self::{
    mesh::{Mesh, ResourceMapping},
    scene_node::SceneNode,
};
