use {
    super::raii_wrapper,
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(CommandPool, vk::CommandPool, COMMAND_POOL, destroy_command_pool);

impl CommandPool {
    /// Create a new transient command pool for the graphics queue.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - command pools must be destroyed before the Vulkan device is
    ///     dropped.
    pub unsafe fn new(device: Arc<dyn GpuDevice>) -> Result<Self, VulkanError> {
        let raw = device.create_command_pool()?;
        Ok(Self::from_raw(device, raw))
    }

    /// Allocate a primary command buffer and begin one-time-submit
    /// recording.
    ///
    /// Note: The command pool frees all allocated buffers when it is reset
    /// or dropped. The caller must ensure that no command buffers are kept
    /// around after that.
    pub fn begin_command_buffer(
        &self,
    ) -> Result<vk::CommandBuffer, VulkanError> {
        unsafe {
            let command_buffer = self.device.allocate_command_buffer(self.raw)?;
            self.device.begin_command_buffer(command_buffer)?;
            Ok(command_buffer)
        }
    }

    /// Reset the pool, returning every command buffer to the initial state.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - no command buffer allocated from this pool may still be pending
    ///     on the GPU.
    pub unsafe fn reset(&self) -> Result<(), VulkanError> {
        self.device.reset_command_pool(self.raw)
    }
}
