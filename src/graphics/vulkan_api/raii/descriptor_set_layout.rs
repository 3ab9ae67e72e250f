use {
    super::raii_wrapper,
    crate::graphics::vulkan_api::{
        DescriptorBindingDesc, GpuDevice, VulkanError,
    },
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(
    DescriptorSetLayout,
    vk::DescriptorSetLayout,
    DESCRIPTOR_SET_LAYOUT,
    destroy_descriptor_set_layout
);

impl DescriptorSetLayout {
    /// Create a new DescriptorSetLayout using the given bindings. An empty
    /// slice creates a layout with no bindings.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - The DescriptorSetLayout must be dropped before the Vulkan device.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        bindings: &[DescriptorBindingDesc],
    ) -> Result<Self, VulkanError> {
        let raw = device.create_descriptor_set_layout(bindings)?;
        Ok(Self::from_raw(device, raw))
    }
}
