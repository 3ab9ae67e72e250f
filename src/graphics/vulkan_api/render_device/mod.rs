mod ash_device;
mod params;

#[cfg(test)]
pub(crate) mod fake_device;

use std::ffi::c_void;

use ash::vk;

use crate::graphics::vulkan_api::VulkanError;

pub use self::{
    ash_device::RenderDevice,
    params::{
        BufferCreateParams, BufferMemoryBarrier, DescriptorBindingDesc,
        DescriptorInfo, DescriptorWrite, ImageCreateParams,
        ImageMemoryBarrier, ImageViewCreateParams, SamplerParams,
        TimelinePoint,
    },
};

/// Every device operation the renderer core performs.
///
/// The core never talks to `ash` directly. It creates objects, binds memory
/// and records commands through this trait so the allocation, barrier and
/// lifetime bookkeeping stays independent from the driver.
/// [RenderDevice] is the Vulkan implementation.
///
/// Methods mirror the Vulkan entry points they wrap. Unsafe methods carry
/// the same external synchronization and lifetime requirements as the
/// Vulkan function of the same name.
pub trait GpuDevice: Send + Sync {
    /// Give a debug name to a Vulkan object. The name is visible in
    /// validation layer logs.
    fn set_debug_name(
        &self,
        object_type: vk::ObjectType,
        raw_handle: u64,
        name: &str,
    );

    // Memory

    /// The memory types and heaps exposed by the physical device.
    fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties;

    /// # Safety
    ///
    /// The memory must be freed before the device is dropped.
    unsafe fn allocate_memory(
        &self,
        size: vk::DeviceSize,
        memory_type_index: u32,
    ) -> Result<vk::DeviceMemory, VulkanError>;

    /// # Safety
    ///
    /// No buffer or image bound to the memory may still be in use.
    unsafe fn free_memory(&self, memory: vk::DeviceMemory);

    /// # Safety
    ///
    /// The memory must be host visible and not currently mapped.
    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<*mut c_void, VulkanError>;

    /// # Safety
    ///
    /// The memory must currently be mapped.
    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory);

    /// # Safety
    ///
    /// The range must be inside a currently mapped region.
    unsafe fn invalidate_mapped_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), VulkanError>;

    /// # Safety
    ///
    /// The range must be inside a currently mapped region.
    unsafe fn flush_mapped_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), VulkanError>;

    // Buffers and images

    /// # Safety
    ///
    /// The buffer must be destroyed before the device is dropped.
    unsafe fn create_buffer(
        &self,
        params: &BufferCreateParams,
    ) -> Result<vk::Buffer, VulkanError>;

    /// # Safety
    ///
    /// The buffer must not be in use by the GPU.
    unsafe fn destroy_buffer(&self, buffer: vk::Buffer);

    fn buffer_memory_requirements(
        &self,
        buffer: vk::Buffer,
    ) -> vk::MemoryRequirements;

    /// # Safety
    ///
    /// The buffer must not already have memory bound to it.
    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), VulkanError>;

    /// # Safety
    ///
    /// The image must be destroyed before the device is dropped.
    unsafe fn create_image(
        &self,
        params: &ImageCreateParams,
    ) -> Result<vk::Image, VulkanError>;

    /// # Safety
    ///
    /// The image must not be in use by the GPU.
    unsafe fn destroy_image(&self, image: vk::Image);

    fn image_memory_requirements(
        &self,
        image: vk::Image,
    ) -> vk::MemoryRequirements;

    /// # Safety
    ///
    /// The image must not already have memory bound to it.
    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), VulkanError>;

    /// # Safety
    ///
    /// The view must be destroyed before the buffer.
    unsafe fn create_buffer_view(
        &self,
        buffer: vk::Buffer,
        format: vk::Format,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    ) -> Result<vk::BufferView, VulkanError>;

    /// # Safety
    ///
    /// The view must not be in use by the GPU.
    unsafe fn destroy_buffer_view(&self, view: vk::BufferView);

    /// # Safety
    ///
    /// The view must be destroyed before the image.
    unsafe fn create_image_view(
        &self,
        image: vk::Image,
        params: &ImageViewCreateParams,
    ) -> Result<vk::ImageView, VulkanError>;

    /// # Safety
    ///
    /// The view must not be in use by the GPU.
    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    /// # Safety
    ///
    /// The sampler must be destroyed before the device is dropped.
    unsafe fn create_sampler(
        &self,
        params: &SamplerParams,
    ) -> Result<vk::Sampler, VulkanError>;

    /// # Safety
    ///
    /// The sampler must not be in use by the GPU.
    unsafe fn destroy_sampler(&self, sampler: vk::Sampler);

    // Descriptors and layouts

    /// # Safety
    ///
    /// The layout must be destroyed before the device is dropped.
    unsafe fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorBindingDesc],
    ) -> Result<vk::DescriptorSetLayout, VulkanError>;

    /// # Safety
    ///
    /// No pipeline layout or descriptor set allocation may still use it.
    unsafe fn destroy_descriptor_set_layout(
        &self,
        layout: vk::DescriptorSetLayout,
    );

    /// # Safety
    ///
    /// The layout must be destroyed before the device is dropped.
    unsafe fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> Result<vk::PipelineLayout, VulkanError>;

    /// # Safety
    ///
    /// The layout must not be in use by the GPU.
    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    /// # Safety
    ///
    /// The pool must be destroyed before the device is dropped.
    unsafe fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> Result<vk::DescriptorPool, VulkanError>;

    /// # Safety
    ///
    /// Every set allocated from the pool is freed with it and must not be
    /// in use by the GPU.
    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

    /// # Safety
    ///
    /// The set lives until its pool is destroyed.
    unsafe fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> Result<vk::DescriptorSet, VulkanError>;

    /// # Safety
    ///
    /// The written sets must not be in use by pending command buffers.
    unsafe fn update_descriptor_sets(&self, writes: &[DescriptorWrite]);

    // Command buffers

    /// Create a transient command pool for the graphics queue family.
    ///
    /// # Safety
    ///
    /// The pool must be destroyed before the device is dropped.
    unsafe fn create_command_pool(
        &self,
    ) -> Result<vk::CommandPool, VulkanError>;

    /// # Safety
    ///
    /// No command buffer from the pool may be pending.
    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool);

    /// # Safety
    ///
    /// No command buffer from the pool may be pending.
    unsafe fn reset_command_pool(
        &self,
        pool: vk::CommandPool,
    ) -> Result<(), VulkanError>;

    /// # Safety
    ///
    /// The command buffer is freed with the pool.
    unsafe fn allocate_command_buffer(
        &self,
        pool: vk::CommandPool,
    ) -> Result<vk::CommandBuffer, VulkanError>;

    /// Begin a one-time-submit recording.
    ///
    /// # Safety
    ///
    /// The command buffer must be in the initial state.
    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError>;

    /// # Safety
    ///
    /// The command buffer must be recording.
    unsafe fn end_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError>;

    // Synchronization

    /// # Safety
    ///
    /// The semaphore must be destroyed before the device is dropped.
    unsafe fn create_timeline_semaphore(
        &self,
        initial_value: u64,
    ) -> Result<vk::Semaphore, VulkanError>;

    /// # Safety
    ///
    /// No pending submission may still signal or wait on the semaphore.
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    /// The current counter value of a timeline semaphore.
    fn semaphore_counter_value(
        &self,
        semaphore: vk::Semaphore,
    ) -> Result<u64, VulkanError>;

    /// Block until the semaphore reaches `value` or the timeout elapses.
    ///
    /// # Returns
    ///
    /// `true` when the value was reached, `false` on timeout.
    fn wait_for_semaphore(
        &self,
        semaphore: vk::Semaphore,
        value: u64,
        timeout_ns: u64,
    ) -> Result<bool, VulkanError>;

    /// Submit command buffers to the graphics queue, in order, signaling the
    /// timeline point once they complete.
    ///
    /// # Safety
    ///
    /// Every command buffer must be executable and every resource they use
    /// must outlive the signal.
    unsafe fn submit(
        &self,
        command_buffers: &[vk::CommandBuffer],
        signal: TimelinePoint,
        signal_stages: vk::PipelineStageFlags2,
    ) -> Result<(), VulkanError>;

    /// Stall the thread until the GPU is done with all operations.
    fn wait_idle(&self) -> Result<(), VulkanError>;

    // Commands

    /// # Safety
    ///
    /// The command buffer must be recording outside of a render pass.
    unsafe fn cmd_pipeline_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer_barriers: &[BufferMemoryBarrier],
        image_barriers: &[ImageMemoryBarrier],
    );

    /// # Safety
    ///
    /// Both buffers must be valid with bound memory.
    unsafe fn cmd_copy_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    );

    /// # Safety
    ///
    /// The image must be in `dst_layout` when the copy executes.
    unsafe fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        regions: &[vk::BufferImageCopy],
    );

    /// # Safety
    ///
    /// `data` must be at most 65536 bytes and a multiple of 4.
    unsafe fn cmd_update_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        data: &[u8],
    );

    /// # Safety
    ///
    /// The command buffer must be recording.
    unsafe fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    );

    /// # Safety
    ///
    /// The sets must be compatible with the layout at `first_set`.
    unsafe fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
    );

    /// # Safety
    ///
    /// The buffer must have VERTEX_BUFFER usage.
    unsafe fn cmd_bind_vertex_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
    );

    /// # Safety
    ///
    /// The buffer must have INDEX_BUFFER usage.
    unsafe fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    );

    /// # Safety
    ///
    /// A compute pipeline must be bound.
    unsafe fn cmd_dispatch(
        &self,
        command_buffer: vk::CommandBuffer,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    );

    /// # Safety
    ///
    /// A graphics pipeline, vertex and index buffers must be bound inside a
    /// render pass.
    unsafe fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
    );

    /// # Safety
    ///
    /// The framebuffer must be compatible with the render pass.
    unsafe fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    );

    /// # Safety
    ///
    /// A render pass must be active.
    unsafe fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);
}
