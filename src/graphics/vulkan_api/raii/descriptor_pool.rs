use {
    super::{raii_wrapper, DescriptorSetLayout},
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(
    DescriptorPool,
    vk::DescriptorPool,
    DESCRIPTOR_POOL,
    destroy_descriptor_pool
);

impl DescriptorPool {
    /// Create a new Vulkan descriptor pool using the max_sets and
    /// pool_sizes. Pool sizes with a zero count are skipped.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - descriptor pools must be destroyed before the Vulkan device is
    ///     dropped.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> Result<Self, VulkanError> {
        let non_empty: Vec<vk::DescriptorPoolSize> = pool_sizes
            .iter()
            .filter(|size| size.descriptor_count > 0)
            .copied()
            .collect();
        let raw = device.create_descriptor_pool(max_sets, &non_empty)?;
        Ok(Self::from_raw(device, raw))
    }

    /// Allocate a descriptor set from this pool.
    ///
    /// Note: The descriptor pool destroys all allocated sets when it is
    /// dropped. The caller must ensure that no descriptor sets are kept
    /// around after the pool is dropped.
    pub fn allocate(
        &self,
        layout: &DescriptorSetLayout,
    ) -> Result<vk::DescriptorSet, VulkanError> {
        unsafe { self.device.allocate_descriptor_set(self.raw, layout.raw()) }
    }
}
