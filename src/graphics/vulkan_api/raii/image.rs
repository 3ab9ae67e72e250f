use {
    crate::graphics::vulkan_api::{GpuDevice, ImageCreateParams, VulkanError},
    ash::vk::{self, Handle},
    std::sync::Arc,
};

/// RAII Vulkan Image.
///
/// Images owned by someone else (swapchain images) can be wrapped with
/// [Image::external]. External images are never destroyed by the wrapper.
pub struct Image {
    raw: vk::Image,
    external: bool,
    device: Arc<dyn GpuDevice>,
}

impl Image {
    /// Create a new Vulkan image. No memory is bound.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the image must be dropped before the device.
    ///   - the image must have memory bound before it is used by the GPU.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        params: &ImageCreateParams,
    ) -> Result<Self, VulkanError> {
        let raw = device.create_image(params)?;
        Ok(Self {
            raw,
            external: false,
            device,
        })
    }

    /// Wrap an image whose lifetime is managed elsewhere.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the owner must keep the image alive for as long as this wrapper
    ///     or anything derived from it is in use.
    pub unsafe fn external(device: Arc<dyn GpuDevice>, raw: vk::Image) -> Self {
        Self {
            raw,
            external: true,
            device,
        }
    }

    /// Set the name which shows up in Vulkan debug logs for this resource.
    pub fn set_debug_name(&self, name: impl Into<String>) {
        self.device.set_debug_name(
            vk::ObjectType::IMAGE,
            self.raw.as_raw(),
            &name.into(),
        );
    }

    /// The size, alignment and allowed memory types for this image.
    pub fn memory_requirements(&self) -> vk::MemoryRequirements {
        self.device.image_memory_requirements(self.raw)
    }

    /// True when the image is owned by someone else.
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Get the raw Vulkan image handle.
    pub fn raw(&self) -> vk::Image {
        self.raw
    }

    /// The device which owns the handle.
    pub fn device(&self) -> &Arc<dyn GpuDevice> {
        &self.device
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        if !self.external {
            unsafe { self.device.destroy_image(self.raw) }
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("raw", &self.raw)
            .field("external", &self.external)
            .finish()
    }
}
