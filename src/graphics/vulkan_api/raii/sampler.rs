use {
    super::raii_wrapper,
    crate::graphics::vulkan_api::{GpuDevice, SamplerParams, VulkanError},
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(Sampler, vk::Sampler, SAMPLER, destroy_sampler);

impl Sampler {
    /// Create a new sampler.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the sampler must be dropped before the device.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        params: &SamplerParams,
    ) -> Result<Self, VulkanError> {
        let raw = device.create_sampler(params)?;
        Ok(Self::from_raw(device, raw))
    }
}
