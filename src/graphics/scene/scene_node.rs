use {
    super::Mesh,
    crate::{
        graphics::{descriptor_set::DescriptorSet, resources::BufferResource},
        math::{mat4_bytes, Mat4},
    },
    std::rc::Rc,
};

/// A mesh placed in the world.
///
/// The node's world matrix lives in a uniform buffer which is bound at
/// descriptor set 2 when the node is drawn.
pub struct SceneNode {
    mesh: Rc<Mesh>,
    world_matrix: Mat4,
    uniform_buffer: Rc<BufferResource>,
    descriptor_set: DescriptorSet,
}

impl SceneNode {
    /// The size of the node uniform block in bytes.
    pub const UNIFORM_SIZE: u64 = 64;

    /// Nodes are created by the renderer, which owns the descriptor pools.
    pub(crate) fn new(
        mesh: Rc<Mesh>,
        uniform_buffer: Rc<BufferResource>,
        descriptor_set: DescriptorSet,
    ) -> Self {
        debug_assert!(uniform_buffer.size() >= Self::UNIFORM_SIZE);
        Self {
            mesh,
            world_matrix: Mat4::identity(),
            uniform_buffer,
            descriptor_set,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Takes effect the next time the node is set up for drawing.
    pub fn set_world_matrix(&mut self, world_matrix: Mat4) {
        self.world_matrix = world_matrix;
    }

    pub fn uniform_buffer(&self) -> &Rc<BufferResource> {
        &self.uniform_buffer
    }

    /// The bytes uploaded to the uniform buffer.
    pub fn uniform_data(&self) -> Vec<u8> {
        mat4_bytes(&self.world_matrix).collect()
    }

    pub fn descriptor_set(&self) -> &DescriptorSet {
        &self.descriptor_set
    }
}

impl std::fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("mesh", &self.mesh)
            .field("world_matrix", &self.world_matrix)
            .field("descriptor_set", &self.descriptor_set)
            .finish()
    }
}
