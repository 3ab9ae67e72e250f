use {
    super::{raii_wrapper, DescriptorSetLayout},
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(
    PipelineLayout,
    vk::PipelineLayout,
    PIPELINE_LAYOUT,
    destroy_pipeline_layout
);

impl PipelineLayout {
    /// Create a pipeline layout where set `i` uses `set_layouts[i]`.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - The PipelineLayout must be dropped before the Vulkan device.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        set_layouts: &[&DescriptorSetLayout],
    ) -> Result<Self, VulkanError> {
        let raw_layouts: Vec<vk::DescriptorSetLayout> =
            set_layouts.iter().map(|layout| layout.raw()).collect();
        let raw = device.create_pipeline_layout(&raw_layouts)?;
        Ok(Self::from_raw(device, raw))
    }
}
