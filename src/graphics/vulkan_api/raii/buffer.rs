use {
    super::raii_wrapper,
    crate::graphics::vulkan_api::{BufferCreateParams, GpuDevice, VulkanError},
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(Buffer, vk::Buffer, BUFFER, destroy_buffer);

impl Buffer {
    /// Create a new Vulkan buffer. No memory is bound.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the buffer must be dropped before the device.
    ///   - the buffer must have memory bound before it is used by the GPU.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        params: &BufferCreateParams,
    ) -> Result<Self, VulkanError> {
        let raw = device.create_buffer(params)?;
        Ok(Self::from_raw(device, raw))
    }

    /// The size, alignment and allowed memory types for this buffer.
    pub fn memory_requirements(&self) -> vk::MemoryRequirements {
        self.device.buffer_memory_requirements(self.raw)
    }
}
