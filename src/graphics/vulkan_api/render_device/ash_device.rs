use std::{ffi::c_void, sync::Mutex};

use ash::vk;

use super::{
    BufferCreateParams, BufferMemoryBarrier, DescriptorBindingDesc,
    DescriptorInfo, DescriptorWrite, GpuDevice, ImageCreateParams,
    ImageMemoryBarrier, ImageViewCreateParams, SamplerParams, TimelinePoint,
};
use crate::graphics::vulkan_api::VulkanError;

/// The Vulkan logical device and the graphics queue all rendering work is
/// submitted to.
///
/// Instance, physical device and logical device creation belong to the
/// application's window/surface setup. The RenderDevice takes ownership of
/// the logical device and destroys it when dropped.
pub struct RenderDevice {
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    graphics_queue_family_index: u32,
    graphics_queue: Mutex<vk::Queue>,
    debug_utils: Option<ash::ext::debug_utils::Device>,
    logical_device: ash::Device,
}

impl RenderDevice {
    /// Wrap an existing logical device.
    ///
    /// # Params
    ///
    /// * `graphics_queue_family_index` - queue 0 of this family receives all
    ///   submissions. The device must have been created with at least one
    ///   queue from it, with the `timelineSemaphore` and
    ///   `synchronization2` features enabled.
    /// * `enable_debug_names` - requires the VK_EXT_debug_utils instance
    ///   extension.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the instance must outlive the RenderDevice.
    ///   - every object created through the RenderDevice must be destroyed
    ///     before it is dropped.
    pub unsafe fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        logical_device: ash::Device,
        graphics_queue_family_index: u32,
        enable_debug_names: bool,
    ) -> Self {
        let memory_properties =
            instance.get_physical_device_memory_properties(physical_device);
        let graphics_queue =
            logical_device.get_device_queue(graphics_queue_family_index, 0);
        let debug_utils = if enable_debug_names {
            Some(ash::ext::debug_utils::Device::new(instance, &logical_device))
        } else {
            None
        };
        Self {
            memory_properties,
            graphics_queue_family_index,
            graphics_queue: Mutex::new(graphics_queue),
            debug_utils,
            logical_device,
        }
    }

    /// The raw ash logical device.
    pub fn device(&self) -> &ash::Device {
        &self.logical_device
    }
}

impl Drop for RenderDevice {
    /// # DANGER
    ///
    /// There is no checking that every object created through this device
    /// has been destroyed.
    fn drop(&mut self) {
        unsafe {
            self.logical_device.destroy_device(None);
        }
    }
}

impl std::fmt::Debug for RenderDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDevice")
            .field(
                "graphics_queue_family_index",
                &self.graphics_queue_family_index,
            )
            .field("debug_names", &self.debug_utils.is_some())
            .finish()
    }
}

impl GpuDevice for RenderDevice {
    fn set_debug_name(
        &self,
        object_type: vk::ObjectType,
        raw_handle: u64,
        name: &str,
    ) {
        let debug_utils = match &self.debug_utils {
            Some(debug_utils) => debug_utils,
            None => return,
        };
        let cname = match std::ffi::CString::new(name) {
            Ok(cname) => cname,
            Err(_) => {
                log::warn!("Debug name {:?} contains a nul byte", name);
                return;
            }
        };
        let name_info = vk::DebugUtilsObjectNameInfoEXT {
            object_type,
            object_handle: raw_handle,
            p_object_name: cname.as_ptr(),
            ..Default::default()
        };
        let result =
            unsafe { debug_utils.set_debug_utils_object_name(&name_info) };
        if let Err(err) = result {
            log::warn!("Unable to set debug name {:?}: {:?}", name, err);
        }
    }

    fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties {
        self.memory_properties
    }

    unsafe fn allocate_memory(
        &self,
        size: vk::DeviceSize,
        memory_type_index: u32,
    ) -> Result<vk::DeviceMemory, VulkanError> {
        let allocate_info = vk::MemoryAllocateInfo {
            allocation_size: size,
            memory_type_index,
            ..Default::default()
        };
        self.logical_device
            .allocate_memory(&allocate_info, None)
            .map_err(|err| {
                VulkanError::UnableToAllocateDeviceMemory(
                    err,
                    size,
                    memory_type_index,
                )
            })
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        self.logical_device.free_memory(memory, None)
    }

    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<*mut c_void, VulkanError> {
        self.logical_device
            .map_memory(memory, offset, size, vk::MemoryMapFlags::empty())
            .map_err(VulkanError::UnableToMapDeviceMemory)
    }

    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory) {
        self.logical_device.unmap_memory(memory)
    }

    unsafe fn invalidate_mapped_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        let range = vk::MappedMemoryRange {
            memory,
            offset,
            size,
            ..Default::default()
        };
        self.logical_device
            .invalidate_mapped_memory_ranges(&[range])
            .map_err(VulkanError::UnableToInvalidateMappedMemory)
    }

    unsafe fn flush_mapped_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        let range = vk::MappedMemoryRange {
            memory,
            offset,
            size,
            ..Default::default()
        };
        self.logical_device
            .flush_mapped_memory_ranges(&[range])
            .map_err(VulkanError::UnableToFlushMappedMemory)
    }

    unsafe fn create_buffer(
        &self,
        params: &BufferCreateParams,
    ) -> Result<vk::Buffer, VulkanError> {
        let create_info = vk::BufferCreateInfo {
            size: params.size,
            usage: params.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        self.logical_device
            .create_buffer(&create_info, None)
            .map_err(VulkanError::UnableToCreateBuffer)
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.logical_device.destroy_buffer(buffer, None)
    }

    fn buffer_memory_requirements(
        &self,
        buffer: vk::Buffer,
    ) -> vk::MemoryRequirements {
        unsafe { self.logical_device.get_buffer_memory_requirements(buffer) }
    }

    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        self.logical_device
            .bind_buffer_memory(buffer, memory, offset)
            .map_err(VulkanError::UnableToBindBufferMemory)
    }

    unsafe fn create_image(
        &self,
        params: &ImageCreateParams,
    ) -> Result<vk::Image, VulkanError> {
        let create_info = vk::ImageCreateInfo {
            flags: params.flags,
            image_type: params.image_type,
            format: params.format,
            extent: params.extent,
            mip_levels: params.mip_levels,
            array_layers: params.array_layers,
            samples: params.samples,
            tiling: params.tiling,
            usage: params.usage,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            ..Default::default()
        };
        self.logical_device
            .create_image(&create_info, None)
            .map_err(VulkanError::UnableToCreateImage)
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        self.logical_device.destroy_image(image, None)
    }

    fn image_memory_requirements(
        &self,
        image: vk::Image,
    ) -> vk::MemoryRequirements {
        unsafe { self.logical_device.get_image_memory_requirements(image) }
    }

    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        self.logical_device
            .bind_image_memory(image, memory, offset)
            .map_err(VulkanError::UnableToBindImageMemory)
    }

    unsafe fn create_buffer_view(
        &self,
        buffer: vk::Buffer,
        format: vk::Format,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    ) -> Result<vk::BufferView, VulkanError> {
        let create_info = vk::BufferViewCreateInfo {
            buffer,
            format,
            offset,
            range,
            ..Default::default()
        };
        self.logical_device
            .create_buffer_view(&create_info, None)
            .map_err(VulkanError::UnableToCreateBufferView)
    }

    unsafe fn destroy_buffer_view(&self, view: vk::BufferView) {
        self.logical_device.destroy_buffer_view(view, None)
    }

    unsafe fn create_image_view(
        &self,
        image: vk::Image,
        params: &ImageViewCreateParams,
    ) -> Result<vk::ImageView, VulkanError> {
        let create_info = vk::ImageViewCreateInfo {
            image,
            view_type: params.view_type,
            format: params.format,
            subresource_range: params.subresource_range,
            ..Default::default()
        };
        self.logical_device
            .create_image_view(&create_info, None)
            .map_err(VulkanError::UnableToCreateImageView)
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.logical_device.destroy_image_view(view, None)
    }

    unsafe fn create_sampler(
        &self,
        params: &SamplerParams,
    ) -> Result<vk::Sampler, VulkanError> {
        let create_info = vk::SamplerCreateInfo {
            mag_filter: params.mag_filter,
            min_filter: params.min_filter,
            mipmap_mode: params.mipmap_mode,
            address_mode_u: params.address_mode_u,
            address_mode_v: params.address_mode_v,
            address_mode_w: params.address_mode_w,
            anisotropy_enable: params.max_anisotropy.is_some().into(),
            max_anisotropy: params.max_anisotropy.unwrap_or(1.0),
            compare_enable: params.compare_op.is_some().into(),
            compare_op: params.compare_op.unwrap_or(vk::CompareOp::NEVER),
            min_lod: params.min_lod,
            max_lod: params.max_lod,
            border_color: params.border_color,
            ..Default::default()
        };
        self.logical_device
            .create_sampler(&create_info, None)
            .map_err(VulkanError::UnableToCreateSampler)
    }

    unsafe fn destroy_sampler(&self, sampler: vk::Sampler) {
        self.logical_device.destroy_sampler(sampler, None)
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorBindingDesc],
    ) -> Result<vk::DescriptorSetLayout, VulkanError> {
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
            .iter()
            .map(|binding| vk::DescriptorSetLayoutBinding {
                binding: binding.binding,
                descriptor_type: binding.descriptor_type,
                descriptor_count: 1,
                stage_flags: binding.stage_flags,
                ..Default::default()
            })
            .collect();
        let create_info =
            vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);
        self.logical_device
            .create_descriptor_set_layout(&create_info, None)
            .map_err(VulkanError::UnableToCreateDescriptorSetLayout)
    }

    unsafe fn destroy_descriptor_set_layout(
        &self,
        layout: vk::DescriptorSetLayout,
    ) {
        self.logical_device
            .destroy_descriptor_set_layout(layout, None)
    }

    unsafe fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> Result<vk::PipelineLayout, VulkanError> {
        let create_info =
            vk::PipelineLayoutCreateInfo::default().set_layouts(set_layouts);
        self.logical_device
            .create_pipeline_layout(&create_info, None)
            .map_err(VulkanError::UnableToCreatePipelineLayout)
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.logical_device.destroy_pipeline_layout(layout, None)
    }

    unsafe fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> Result<vk::DescriptorPool, VulkanError> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);
        self.logical_device
            .create_descriptor_pool(&create_info, None)
            .map_err(VulkanError::UnableToCreateDescriptorPool)
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.logical_device.destroy_descriptor_pool(pool, None)
    }

    unsafe fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> Result<vk::DescriptorSet, VulkanError> {
        let layouts = [layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);
        let sets = self
            .logical_device
            .allocate_descriptor_sets(&allocate_info)
            .map_err(VulkanError::UnableToAllocateDescriptorSet)?;
        Ok(sets[0])
    }

    unsafe fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        let mut buffer_infos = Vec::with_capacity(writes.len());
        let mut image_infos = Vec::with_capacity(writes.len());
        let mut texel_views = Vec::with_capacity(writes.len());
        for write in writes {
            match write.info {
                DescriptorInfo::Buffer {
                    buffer,
                    offset,
                    range,
                } => buffer_infos.push(vk::DescriptorBufferInfo {
                    buffer,
                    offset,
                    range,
                }),
                DescriptorInfo::TexelBuffer(view) => texel_views.push(view),
                DescriptorInfo::Image {
                    view,
                    sampler,
                    layout,
                } => image_infos.push(vk::DescriptorImageInfo {
                    sampler,
                    image_view: view,
                    image_layout: layout,
                }),
            }
        }

        let (mut next_buffer, mut next_image, mut next_texel) = (0, 0, 0);
        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .map(|write| {
                let vk_write = vk::WriteDescriptorSet::default()
                    .dst_set(write.set)
                    .dst_binding(write.binding)
                    .descriptor_type(write.descriptor_type);
                match write.info {
                    DescriptorInfo::Buffer { .. } => {
                        next_buffer += 1;
                        vk_write.buffer_info(std::slice::from_ref(
                            &buffer_infos[next_buffer - 1],
                        ))
                    }
                    DescriptorInfo::TexelBuffer(_) => {
                        next_texel += 1;
                        vk_write.texel_buffer_view(std::slice::from_ref(
                            &texel_views[next_texel - 1],
                        ))
                    }
                    DescriptorInfo::Image { .. } => {
                        next_image += 1;
                        vk_write.image_info(std::slice::from_ref(
                            &image_infos[next_image - 1],
                        ))
                    }
                }
            })
            .collect();

        self.logical_device.update_descriptor_sets(&vk_writes, &[]);
    }

    unsafe fn create_command_pool(
        &self,
    ) -> Result<vk::CommandPool, VulkanError> {
        let create_info = vk::CommandPoolCreateInfo {
            flags: vk::CommandPoolCreateFlags::TRANSIENT,
            queue_family_index: self.graphics_queue_family_index,
            ..Default::default()
        };
        self.logical_device
            .create_command_pool(&create_info, None)
            .map_err(VulkanError::UnableToCreateCommandPool)
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.logical_device.destroy_command_pool(pool, None)
    }

    unsafe fn reset_command_pool(
        &self,
        pool: vk::CommandPool,
    ) -> Result<(), VulkanError> {
        self.logical_device
            .reset_command_pool(pool, vk::CommandPoolResetFlags::empty())
            .map_err(VulkanError::UnableToResetCommandPool)
    }

    unsafe fn allocate_command_buffer(
        &self,
        pool: vk::CommandPool,
    ) -> Result<vk::CommandBuffer, VulkanError> {
        let allocate_info = vk::CommandBufferAllocateInfo {
            command_pool: pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            ..Default::default()
        };
        let command_buffers = self
            .logical_device
            .allocate_command_buffers(&allocate_info)
            .map_err(VulkanError::UnableToAllocateCommandBuffer)?;
        Ok(command_buffers[0])
    }

    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        let begin_info = vk::CommandBufferBeginInfo {
            flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            ..Default::default()
        };
        self.logical_device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(VulkanError::UnableToBeginCommandBuffer)
    }

    unsafe fn end_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        self.logical_device
            .end_command_buffer(command_buffer)
            .map_err(VulkanError::UnableToEndCommandBuffer)
    }

    unsafe fn create_timeline_semaphore(
        &self,
        initial_value: u64,
    ) -> Result<vk::Semaphore, VulkanError> {
        let mut type_info = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(initial_value);
        let create_info =
            vk::SemaphoreCreateInfo::default().push_next(&mut type_info);
        self.logical_device
            .create_semaphore(&create_info, None)
            .map_err(VulkanError::UnableToCreateSemaphore)
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.logical_device.destroy_semaphore(semaphore, None)
    }

    fn semaphore_counter_value(
        &self,
        semaphore: vk::Semaphore,
    ) -> Result<u64, VulkanError> {
        unsafe {
            self.logical_device
                .get_semaphore_counter_value(semaphore)
                .map_err(VulkanError::UnableToGetSemaphoreCounterValue)
        }
    }

    fn wait_for_semaphore(
        &self,
        semaphore: vk::Semaphore,
        value: u64,
        timeout_ns: u64,
    ) -> Result<bool, VulkanError> {
        let semaphores = [semaphore];
        let values = [value];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores)
            .values(&values);
        let result =
            unsafe { self.logical_device.wait_semaphores(&wait_info, timeout_ns) };
        match result {
            Ok(()) => Ok(true),
            Err(vk::Result::TIMEOUT) => Ok(false),
            Err(err) => Err(VulkanError::UnexpectedSemaphoreWaitError(err)),
        }
    }

    unsafe fn submit(
        &self,
        command_buffers: &[vk::CommandBuffer],
        signal: TimelinePoint,
        signal_stages: vk::PipelineStageFlags2,
    ) -> Result<(), VulkanError> {
        let command_buffer_infos: Vec<vk::CommandBufferSubmitInfo> =
            command_buffers
                .iter()
                .map(|&command_buffer| {
                    vk::CommandBufferSubmitInfo::default()
                        .command_buffer(command_buffer)
                })
                .collect();
        let signal_infos = [vk::SemaphoreSubmitInfo::default()
            .semaphore(signal.semaphore)
            .value(signal.value)
            .stage_mask(signal_stages)];
        let submit_info = vk::SubmitInfo2::default()
            .command_buffer_infos(&command_buffer_infos)
            .signal_semaphore_infos(&signal_infos);

        let queue = self
            .graphics_queue
            .lock()
            .expect("unable to acquire the graphics queue lock");
        self.logical_device
            .queue_submit2(*queue, &[submit_info], vk::Fence::null())
            .map_err(VulkanError::UnableToSubmitCommandBuffers)
    }

    fn wait_idle(&self) -> Result<(), VulkanError> {
        unsafe {
            self.logical_device
                .device_wait_idle()
                .map_err(VulkanError::UnableToWaitForDeviceToIdle)
        }
    }

    unsafe fn cmd_pipeline_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer_barriers: &[BufferMemoryBarrier],
        image_barriers: &[ImageMemoryBarrier],
    ) {
        let buffer_memory_barriers: Vec<vk::BufferMemoryBarrier2> =
            buffer_barriers
                .iter()
                .map(|barrier| vk::BufferMemoryBarrier2 {
                    src_stage_mask: barrier.src_stages,
                    src_access_mask: barrier.src_access,
                    dst_stage_mask: barrier.dst_stages,
                    dst_access_mask: barrier.dst_access,
                    src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    buffer: barrier.buffer,
                    offset: barrier.offset,
                    size: barrier.size,
                    ..Default::default()
                })
                .collect();
        let image_memory_barriers: Vec<vk::ImageMemoryBarrier2> =
            image_barriers
                .iter()
                .map(|barrier| vk::ImageMemoryBarrier2 {
                    src_stage_mask: barrier.src_stages,
                    src_access_mask: barrier.src_access,
                    dst_stage_mask: barrier.dst_stages,
                    dst_access_mask: barrier.dst_access,
                    old_layout: barrier.old_layout,
                    new_layout: barrier.new_layout,
                    src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                    image: barrier.image,
                    subresource_range: barrier.subresource_range,
                    ..Default::default()
                })
                .collect();
        let dependency_info = vk::DependencyInfo::default()
            .buffer_memory_barriers(&buffer_memory_barriers)
            .image_memory_barriers(&image_memory_barriers);
        self.logical_device
            .cmd_pipeline_barrier2(command_buffer, &dependency_info);
    }

    unsafe fn cmd_copy_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    ) {
        self.logical_device
            .cmd_copy_buffer(command_buffer, src, dst, regions)
    }

    unsafe fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        regions: &[vk::BufferImageCopy],
    ) {
        self.logical_device.cmd_copy_buffer_to_image(
            command_buffer,
            src,
            dst,
            dst_layout,
            regions,
        )
    }

    unsafe fn cmd_update_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        data: &[u8],
    ) {
        self.logical_device
            .cmd_update_buffer(command_buffer, dst, offset, data)
    }

    unsafe fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        self.logical_device
            .cmd_bind_pipeline(command_buffer, bind_point, pipeline)
    }

    unsafe fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
    ) {
        self.logical_device.cmd_bind_descriptor_sets(
            command_buffer,
            bind_point,
            layout,
            first_set,
            sets,
            &[],
        )
    }

    unsafe fn cmd_bind_vertex_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
    ) {
        self.logical_device.cmd_bind_vertex_buffers(
            command_buffer,
            0,
            &[buffer],
            &[offset],
        )
    }

    unsafe fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        self.logical_device.cmd_bind_index_buffer(
            command_buffer,
            buffer,
            offset,
            index_type,
        )
    }

    unsafe fn cmd_dispatch(
        &self,
        command_buffer: vk::CommandBuffer,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) {
        self.logical_device.cmd_dispatch(
            command_buffer,
            group_count_x,
            group_count_y,
            group_count_z,
        )
    }

    unsafe fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
    ) {
        self.logical_device.cmd_draw_indexed(
            command_buffer,
            index_count,
            instance_count,
            0,
            0,
            0,
        )
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) {
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);
        self.logical_device.cmd_begin_render_pass(
            command_buffer,
            &begin_info,
            vk::SubpassContents::INLINE,
        )
    }

    unsafe fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        self.logical_device.cmd_end_render_pass(command_buffer)
    }
}
