//! Buffers and images with tracked synchronization state.

mod buffer_resource;
mod image_resource;
mod resource_allocator;
mod resource_map;
mod sync_state;

use std::sync::atomic::{AtomicU64, Ordering};

use ash::vk;

pub use self::{
    buffer_resource::BufferResource,
    image_resource::{ImageResource, ImageViewParams},
    resource_allocator::{ResourceAllocator, MAX_MEMORY_TYPES},
    resource_map::{
        ResourceMap, ResourceRef, DEFAULT_BUFFER_SLOT, DEFAULT_IMAGE_SLOT,
        FIRST_USABLE_SLOT, RESOURCE_MAP_SLOTS,
    },
    sync_state::{aspect_from_format, has_write_access, SyncState},
};

/// A buffer view size meaning "to the end of the buffer".
pub const SIZE_FULL_RANGE: vk::DeviceSize = 0;

/// A view mip count meaning "every mip level".
pub const MIP_COUNT_FULL_RANGE: u32 = 0;

/// A view layer count meaning "every array layer".
pub const LAYER_COUNT_FULL_RANGE: u32 = 0;

/// The number of views each resource keeps cached.
pub const MAX_CACHED_VIEWS: usize = 20;

/// A process-wide unique identity for a resource. Only used to compare
/// resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::vulkan_api::{
        render_device::fake_device::{
            FakeDevice, DEVICE_LOCAL_TYPE, HOST_CACHED_TYPE,
            HOST_COHERENT_TYPE,
        },
        BufferCreateParams, HeapConfig, ImageCreateParams,
    };
    use std::rc::Rc;
    use std::sync::Arc;

    fn allocator() -> (Arc<FakeDevice>, Arc<ResourceAllocator>) {
        let device = FakeDevice::new();
        let allocator =
            ResourceAllocator::new(device.clone(), HeapConfig::default());
        (device, allocator)
    }

    fn buffer_params(size: vk::DeviceSize) -> BufferCreateParams {
        BufferCreateParams {
            size,
            usage: vk::BufferUsageFlags::STORAGE_BUFFER,
        }
    }

    #[test]
    fn every_resource_gets_a_distinct_id() {
        let (_device, allocator) = allocator();
        let a = allocator.alloc_buffer(&buffer_params(64), !0).unwrap();
        let b = allocator.alloc_buffer(&buffer_params(64), !0).unwrap();
        let image = allocator
            .alloc_image(&ImageCreateParams::default(), !0)
            .unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), image.id());
        assert_eq!(a.id(), a.clone().id());
        assert_eq!(ResourceRef::from(a.clone()).id(), a.id());
    }

    #[test]
    fn lowest_allowed_memory_type_is_picked() {
        let (device, allocator) = allocator();
        let host = allocator
            .alloc_buffer(
                &buffer_params(64),
                (1 << HOST_COHERENT_TYPE) | (1 << HOST_CACHED_TYPE),
            )
            .unwrap();
        let local = allocator.alloc_buffer(&buffer_params(64), !0).unwrap();

        assert_eq!(host.memory_type_index(), HOST_COHERENT_TYPE);
        assert_eq!(local.memory_type_index(), DEVICE_LOCAL_TYPE);
        assert_eq!(device.live_buffers(), 2);
    }

    #[test]
    fn incompatible_memory_types_are_an_error() {
        let (device, allocator) = allocator();
        let result = allocator.alloc_buffer(&buffer_params(64), 1 << 5);
        assert!(matches!(
            result,
            Err(crate::graphics::GraphicsError::NoCompatibleMemoryType(..))
        ));
        // the buffer created before the failure is destroyed again
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn incompatible_image_memory_types_are_an_error() {
        let (device, allocator) = allocator();
        let result =
            allocator.alloc_image(&ImageCreateParams::default(), 1 << 5);
        assert!(matches!(
            result,
            Err(crate::graphics::GraphicsError::NoCompatibleMemoryType(..))
        ));
        assert_eq!(device.live_images(), 0);
    }

    #[test]
    fn out_of_memory_is_propagated() {
        let (device, allocator) = allocator();
        device.fail_memory_allocations(true);
        let result = allocator.alloc_buffer(&buffer_params(64), !0);
        assert!(result.is_err());
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn dropping_resources_returns_memory() {
        let (device, allocator) = allocator();
        let buffers: Vec<Rc<BufferResource>> = (0..4)
            .map(|_| allocator.alloc_buffer(&buffer_params(1024), !0).unwrap())
            .collect();
        assert_eq!(allocator.pool_counts(DEVICE_LOCAL_TYPE), (1, 0));
        assert_eq!(device.live_memory_allocations(), 1);

        drop(buffers);
        assert_eq!(allocator.pool_counts(DEVICE_LOCAL_TYPE), (0, 0));
        assert_eq!(device.live_memory_allocations(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn large_buffers_get_dedicated_memory() {
        let (_device, allocator) = allocator();
        let big = allocator
            .alloc_buffer(&buffer_params(16 * 1024 * 1024), !0)
            .unwrap();
        assert_eq!(allocator.pool_counts(DEVICE_LOCAL_TYPE), (0, 1));
        drop(big);
        assert_eq!(allocator.pool_counts(DEVICE_LOCAL_TYPE), (0, 0));
    }

    #[test]
    fn buffer_views_are_cached() {
        let (device, allocator) = allocator();
        let buffer = allocator.alloc_buffer(&buffer_params(256), !0).unwrap();

        let a = buffer
            .view(vk::Format::R32_SFLOAT, 0, SIZE_FULL_RANGE)
            .unwrap();
        let b = buffer.view(vk::Format::R32_SFLOAT, 0, 256).unwrap();
        let c = buffer.view(vk::Format::R32_SFLOAT, 128, 128).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(buffer.cached_view_count(), 2);
        assert_eq!(device.live_buffer_views(), 2);

        drop((a, b, c));
        drop(buffer);
        assert_eq!(device.live_buffer_views(), 0);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn view_cache_evicts_after_twenty_views() {
        let (device, allocator) = allocator();
        let buffer = allocator.alloc_buffer(&buffer_params(4096), !0).unwrap();
        for i in 0..(MAX_CACHED_VIEWS as u64 + 5) {
            buffer.view(vk::Format::R8_UNORM, i * 64, 64).unwrap();
        }
        assert_eq!(buffer.cached_view_count(), MAX_CACHED_VIEWS);
        assert_eq!(device.live_buffer_views(), MAX_CACHED_VIEWS);
    }

    #[test]
    fn image_views_resolve_full_ranges() {
        let (device, allocator) = allocator();
        let image = allocator
            .alloc_image(
                &ImageCreateParams {
                    mip_levels: 4,
                    array_layers: 2,
                    ..ImageCreateParams::default()
                },
                !0,
            )
            .unwrap();

        let full = image
            .view(&ImageViewParams {
                view_type: vk::ImageViewType::TYPE_2D_ARRAY,
                ..ImageViewParams::default()
            })
            .unwrap();
        let explicit = image
            .view(&ImageViewParams {
                view_type: vk::ImageViewType::TYPE_2D_ARRAY,
                format: vk::Format::R8G8B8A8_UNORM,
                mip_count: 4,
                layer_count: 2,
                ..ImageViewParams::default()
            })
            .unwrap();
        assert!(Rc::ptr_eq(&full, &explicit));
        assert_eq!(device.live_image_views(), 1);
    }

    #[test]
    fn external_images_are_never_destroyed() {
        let (device, allocator) = allocator();
        let raw = unsafe {
            use crate::graphics::vulkan_api::GpuDevice;
            device.create_image(&ImageCreateParams::default()).unwrap()
        };
        let image = unsafe {
            allocator.register_external_image(raw, &ImageCreateParams::default())
        };
        assert!(image.is_external());
        assert_eq!(image.memory_type_index(), None);
        assert!(image.map().is_err());

        drop(image);
        assert_eq!(device.live_images(), 1);
        assert_eq!(device.live_memory_allocations(), 0);
    }

    #[test]
    fn host_visible_buffers_can_be_mapped() {
        let (device, allocator) = allocator();
        let buffer = allocator
            .alloc_buffer(&buffer_params(64), 1 << HOST_CACHED_TYPE)
            .unwrap();

        let ptr = buffer.map().unwrap();
        assert_eq!(buffer.map().unwrap(), ptr);
        unsafe { std::ptr::copy_nonoverlapping([1u8, 2, 3].as_ptr(), ptr, 3) };
        buffer.flush_mapped_range().unwrap();
        buffer.invalidate_mapped_range().unwrap();
        assert_eq!(device.read_buffer(buffer.raw(), 3), vec![1, 2, 3]);

        buffer.unmap();
        assert!(buffer.mapped_ptr().is_none());
    }

    #[test]
    fn resource_map_starts_with_defaults() {
        let (_device, allocator) = allocator();
        let buffer = allocator.alloc_buffer(&buffer_params(64), !0).unwrap();
        let image = allocator
            .alloc_image(&ImageCreateParams::default(), !0)
            .unwrap();
        let mut map = ResourceMap::new(buffer.clone(), image.clone());

        assert_eq!(map.get(DEFAULT_BUFFER_SLOT).id(), buffer.id());
        assert_eq!(map.get(DEFAULT_IMAGE_SLOT).id(), image.id());
        assert_eq!(map.get(RESOURCE_MAP_SLOTS - 1).id(), buffer.id());

        let other = allocator.alloc_buffer(&buffer_params(64), !0).unwrap();
        map.set(FIRST_USABLE_SLOT, other.clone());
        assert_eq!(map.get(FIRST_USABLE_SLOT).id(), other.id());
    }

    #[test]
    #[should_panic]
    fn default_slots_cannot_be_replaced() {
        let (_device, allocator) = allocator();
        let buffer = allocator.alloc_buffer(&buffer_params(64), !0).unwrap();
        let image = allocator
            .alloc_image(&ImageCreateParams::default(), !0)
            .unwrap();
        let mut map = ResourceMap::new(buffer.clone(), image);
        map.set(DEFAULT_IMAGE_SLOT, buffer);
    }
}
