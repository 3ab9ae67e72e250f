use {
    super::Buffer,
    crate::graphics::vulkan_api::VulkanError,
    ash::vk::{self, Handle},
    std::rc::Rc,
};

/// A RAII Vulkan BufferView.
///
/// The view holds a strong reference to the buffer it was created from so
/// the buffer cannot be destroyed first.
pub struct BufferView {
    view: vk::BufferView,
    buffer: Rc<Buffer>,
}

impl BufferView {
    /// Create a texel view over `range` bytes of the buffer starting at
    /// `offset`.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the application must not use the view after the buffer's memory
    ///     has been released.
    pub unsafe fn new(
        buffer: Rc<Buffer>,
        format: vk::Format,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    ) -> Result<Self, VulkanError> {
        let view = buffer
            .device()
            .create_buffer_view(buffer.raw(), format, offset, range)?;
        Ok(Self { view, buffer })
    }

    /// Set the debug name for how this resource appears in Vulkan logs.
    pub fn set_debug_name(&self, name: impl Into<String>) {
        self.buffer.device().set_debug_name(
            vk::ObjectType::BUFFER_VIEW,
            self.view.as_raw(),
            &name.into(),
        )
    }

    /// Get the raw Vulkan BufferView handle.
    pub fn raw(&self) -> vk::BufferView {
        self.view
    }
}

impl Drop for BufferView {
    fn drop(&mut self) {
        unsafe { self.buffer.device().destroy_buffer_view(self.view) }
    }
}

impl std::fmt::Debug for BufferView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("view", &self.view)
            .field("buffer", &self.buffer.raw())
            .finish()
    }
}
