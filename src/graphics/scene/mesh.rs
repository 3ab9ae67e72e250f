use {
    crate::graphics::{
        material::{Material, BINDING_SLOT_COUNT},
        resources::{
            BufferResource, ResourceMap, ResourceRef, FIRST_USABLE_SLOT,
            RESOURCE_MAP_SLOTS,
        },
    },
    ash::vk,
    std::rc::Rc,
};

/// A resource the mesh puts into the resource map before it is drawn.
#[derive(Debug, Clone)]
pub struct ResourceMapping {
    pub resource_map_slot: usize,
    pub resource: ResourceRef,
}

/// Indexed geometry drawn with a graphics material.
pub struct Mesh {
    vertex_buffer: Rc<BufferResource>,
    index_buffer: Rc<BufferResource>,
    index_type: vk::IndexType,
    index_count: u32,
    material: Rc<Material>,
    resource_mappings: Vec<ResourceMapping>,
}

impl Mesh {
    pub fn new(
        vertex_buffer: Rc<BufferResource>,
        index_buffer: Rc<BufferResource>,
        index_type: vk::IndexType,
        index_count: u32,
        material: Rc<Material>,
    ) -> Self {
        assert!(
            material.is_graphics(),
            "meshes can only be drawn with graphics materials"
        );
        Self {
            vertex_buffer,
            index_buffer,
            index_type,
            index_count,
            material,
            resource_mappings: vec![],
        }
    }

    pub fn vertex_buffer(&self) -> &Rc<BufferResource> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Rc<BufferResource> {
        &self.index_buffer
    }

    pub fn index_type(&self) -> vk::IndexType {
        self.index_type
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn resource_mappings(&self) -> &[ResourceMapping] {
        &self.resource_mappings
    }

    /// Put `resource` into `resource_map_slot` whenever this mesh is set
    /// up or drawn.
    pub fn add_resource_mapping(
        &mut self,
        resource_map_slot: usize,
        resource: impl Into<ResourceRef>,
    ) {
        assert!(
            (FIRST_USABLE_SLOT..RESOURCE_MAP_SLOTS).contains(&resource_map_slot),
            "meshes cannot override resource map slot {}",
            resource_map_slot
        );
        assert!(
            self.resource_mappings.len() < BINDING_SLOT_COUNT,
            "a mesh maps at most {} resources",
            BINDING_SLOT_COUNT
        );
        self.resource_mappings.push(ResourceMapping {
            resource_map_slot,
            resource: resource.into(),
        });
    }

    pub fn update_resource_map(&self, resource_map: &mut ResourceMap) {
        for mapping in &self.resource_mappings {
            resource_map.set(mapping.resource_map_slot, mapping.resource.clone());
        }
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("vertex_buffer", &self.vertex_buffer)
            .field("index_buffer", &self.index_buffer)
            .field("index_type", &self.index_type)
            .field("index_count", &self.index_count)
            .field("resource_mappings", &self.resource_mappings.len())
            .finish()
    }
}
