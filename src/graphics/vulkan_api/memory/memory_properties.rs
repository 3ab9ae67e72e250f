use {crate::logging::PrettyList, ash::vk};

/// Memory type bit-masks derived from the physical device memory
/// properties.
///
/// The masks are meant to be passed as the memory type constraint when
/// allocating buffers and images.
#[derive(Debug, Clone, Copy)]
pub struct MemoryProperties {
    properties: vk::PhysicalDeviceMemoryProperties,
    device_local_bits: u32,
    host_visible_bits: u32,
}

impl MemoryProperties {
    pub fn new(properties: vk::PhysicalDeviceMemoryProperties) -> Self {
        let mut device_local_bits = 0;
        let mut host_visible_bits = 0;
        let types = &properties.memory_types
            [..properties.memory_type_count as usize];
        for (index, memory_type) in types.iter().enumerate() {
            let flags = memory_type.property_flags;
            if flags.contains(vk::MemoryPropertyFlags::DEVICE_LOCAL) {
                device_local_bits |= 1 << index;
            }
            if flags.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
                host_visible_bits |= 1 << index;
            }
        }

        let descriptions: Vec<String> = types
            .iter()
            .enumerate()
            .map(|(index, memory_type)| {
                format!(
                    "{}: heap {} {:?}",
                    index, memory_type.heap_index, memory_type.property_flags
                )
            })
            .collect();
        log::debug!("Device memory types {}", PrettyList(&descriptions));

        Self {
            properties,
            device_local_bits,
            host_visible_bits,
        }
    }

    /// Every memory type with the DEVICE_LOCAL property.
    pub fn device_local_bits(&self) -> u32 {
        self.device_local_bits
    }

    /// Every memory type with the HOST_VISIBLE property.
    pub fn host_visible_bits(&self) -> u32 {
        self.host_visible_bits
    }

    pub fn memory_type_count(&self) -> u32 {
        self.properties.memory_type_count
    }

    pub fn property_flags(
        &self,
        memory_type_index: u32,
    ) -> vk::MemoryPropertyFlags {
        self.properties.memory_types[memory_type_index as usize].property_flags
    }

    /// Host writes to coherent memory need no explicit flush or invalidate.
    pub fn is_host_coherent(&self, memory_type_index: u32) -> bool {
        self.property_flags(memory_type_index)
            .contains(vk::MemoryPropertyFlags::HOST_COHERENT)
    }
}
