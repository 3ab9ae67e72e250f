//! The device layer: the [GpuDevice] seam, its Vulkan implementation, RAII
//! wrappers for device objects and device memory suballocation.

mod error;

pub mod memory;
pub mod raii;
pub mod render_device;

pub use self::{
    error::VulkanError,
    memory::{
        align_up, AddressAllocator, Allocation, HeapConfig, MemoryBinding,
        MemoryHeap, MemoryPool, MemoryProperties, MAX_ALIGNMENT,
    },
    render_device::{
        BufferCreateParams, BufferMemoryBarrier, DescriptorBindingDesc,
        DescriptorInfo, DescriptorWrite, GpuDevice, ImageCreateParams,
        ImageMemoryBarrier, ImageViewCreateParams, RenderDevice, SamplerParams,
        TimelinePoint,
    },
};
