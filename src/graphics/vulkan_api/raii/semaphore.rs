use {
    super::raii_wrapper,
    crate::graphics::vulkan_api::{GpuDevice, TimelinePoint, VulkanError},
    ash::vk,
    std::sync::Arc,
};

raii_wrapper!(TimelineSemaphore, vk::Semaphore, SEMAPHORE, destroy_semaphore);

impl TimelineSemaphore {
    /// Create a new timeline semaphore.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - The semaphore must be dropped before the render device.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        initial_value: u64,
    ) -> Result<Self, VulkanError> {
        let raw = device.create_timeline_semaphore(initial_value)?;
        Ok(Self::from_raw(device, raw))
    }

    /// The value most recently reached by the GPU.
    pub fn value(&self) -> Result<u64, VulkanError> {
        self.device.semaphore_counter_value(self.raw)
    }

    /// A point on this semaphore's timeline.
    pub fn point(&self, value: u64) -> TimelinePoint {
        TimelinePoint {
            semaphore: self.raw,
            value,
        }
    }

    /// Block until the semaphore reaches `value`.
    ///
    /// # Returns
    ///
    /// `false` if the timeout elapsed first.
    pub fn wait(
        &self,
        value: u64,
        timeout_ns: u64,
    ) -> Result<bool, VulkanError> {
        self.device.wait_for_semaphore(self.raw, value, timeout_ns)
    }
}
