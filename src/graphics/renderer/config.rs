use ash::vk;

/// How many descriptors of each kind a per-frame descriptor pool holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolLimits {
    pub max_sets: u32,
    pub samplers: u32,
    pub combined_image_samplers: u32,
    pub sampled_images: u32,
    pub storage_images: u32,
    pub uniform_buffers: u32,
    pub storage_buffers: u32,
}

impl Default for DescriptorPoolLimits {
    fn default() -> Self {
        Self {
            max_sets: 400,
            samplers: 50,
            combined_image_samplers: 1000,
            sampled_images: 1000,
            storage_images: 1000,
            uniform_buffers: 1000,
            storage_buffers: 1000,
        }
    }
}

impl DescriptorPoolLimits {
    pub fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        [
            (vk::DescriptorType::SAMPLER, self.samplers),
            (
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                self.combined_image_samplers,
            ),
            (vk::DescriptorType::SAMPLED_IMAGE, self.sampled_images),
            (vk::DescriptorType::STORAGE_IMAGE, self.storage_images),
            (vk::DescriptorType::UNIFORM_BUFFER, self.uniform_buffers),
            (vk::DescriptorType::STORAGE_BUFFER, self.storage_buffers),
        ]
        .into_iter()
        .map(|(ty, descriptor_count)| vk::DescriptorPoolSize {
            ty,
            descriptor_count,
        })
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// How many frames may be recorded before the oldest one must finish
    /// on the GPU.
    pub frames_in_flight: usize,

    pub descriptor_pool_limits: DescriptorPoolLimits,

    /// Memory types the default buffer and image may live in.
    pub default_resource_memory_type_bits: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            descriptor_pool_limits: DescriptorPoolLimits::default(),
            default_resource_memory_type_bits: !0,
        }
    }
}
