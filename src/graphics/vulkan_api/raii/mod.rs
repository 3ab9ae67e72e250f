//! RAII wrappers for device objects.
//!
//! Each wrapper owns one Vulkan handle and destroys it through the
//! [crate::graphics::vulkan_api::GpuDevice] which created it when dropped.

/// Generate the ownership boilerplate shared by every wrapper: the struct,
/// raw handle access, debug naming, Drop and Debug.
macro_rules! raii_wrapper {
    ($name:ident, $raw_type:ty, $object_type:ident, $destroy:ident) => {
        pub struct $name {
            raw: $raw_type,
            device: std::sync::Arc<dyn $crate::graphics::vulkan_api::GpuDevice>,
        }

        impl $name {
            /// Take ownership of a raw handle which was created by `device`.
            ///
            /// # Safety
            ///
            /// Unsafe because:
            ///   - the handle is destroyed when this value is dropped, so it
            ///     must not be destroyed anywhere else.
            pub unsafe fn from_raw(
                device: std::sync::Arc<
                    dyn $crate::graphics::vulkan_api::GpuDevice,
                >,
                raw: $raw_type,
            ) -> Self {
                Self { raw, device }
            }

            /// Set the name which shows up in Vulkan debug logs for this
            /// resource.
            pub fn set_debug_name(&self, name: impl Into<String>) {
                self.device.set_debug_name(
                    ash::vk::ObjectType::$object_type,
                    ash::vk::Handle::as_raw(self.raw),
                    &name.into(),
                );
            }

            /// Get the raw Vulkan handle.
            pub fn raw(&self) -> $raw_type {
                self.raw
            }

            /// The device which owns the handle.
            pub fn device(
                &self,
            ) -> &std::sync::Arc<dyn $crate::graphics::vulkan_api::GpuDevice>
            {
                &self.device
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                unsafe { self.device.$destroy(self.raw) }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
            ) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("raw", &self.raw)
                    .finish()
            }
        }
    };
}

pub(crate) use raii_wrapper;

mod buffer;
mod buffer_view;
mod command_pool;
mod descriptor_pool;
mod descriptor_set_layout;
mod image;
mod image_view;
mod pipeline_layout;
mod sampler;
mod semaphore;

pub use self::{
    buffer::Buffer, buffer_view::BufferView, command_pool::CommandPool,
    descriptor_pool::DescriptorPool,
    descriptor_set_layout::DescriptorSetLayout, image::Image,
    image_view::ImageView, pipeline_layout::PipelineLayout, sampler::Sampler,
    semaphore::TimelineSemaphore,
};
