use {
    super::Image,
    crate::graphics::vulkan_api::{ImageViewCreateParams, VulkanError},
    ash::vk::{self, Handle},
    std::rc::Rc,
};

/// A RAII Vulkan Image View.
///
/// The view holds a strong reference to its image, so the image is only
/// destroyed once every view has been dropped.
pub struct ImageView {
    image_view: vk::ImageView,
    image: Rc<Image>,
}

impl ImageView {
    /// Create a new owned Image View which is destroyed when dropped.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the application must not use the view after the image's memory
    ///     has been released.
    pub unsafe fn new(
        image: Rc<Image>,
        params: &ImageViewCreateParams,
    ) -> Result<Self, VulkanError> {
        let image_view = image.device().create_image_view(image.raw(), params)?;
        Ok(Self { image_view, image })
    }

    /// Set the debug name for how this resource appears in Vulkan logs.
    pub fn set_debug_name(&self, name: impl Into<String>) {
        self.image.device().set_debug_name(
            vk::ObjectType::IMAGE_VIEW,
            self.image_view.as_raw(),
            &name.into(),
        )
    }

    /// Get the raw Vulkan ImageView handle.
    pub fn raw(&self) -> vk::ImageView {
        self.image_view
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe { self.image.device().destroy_image_view(self.image_view) }
    }
}

impl std::fmt::Debug for ImageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageView")
            .field("image_view", &self.image_view)
            .field("image", &self.image.raw())
            .finish()
    }
}
