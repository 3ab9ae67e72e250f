//! A software stand-in for the Vulkan device used by unit tests.
//!
//! Handles are unique integers, device memory is host bytes, and recorded
//! commands are kept so tests can inspect exactly what would have reached
//! the GPU. Submitting executes buffer copies and buffer updates, then
//! signals the timeline semaphore.

use std::{
    collections::HashMap,
    ffi::c_void,
    sync::{Arc, Mutex, MutexGuard},
};

use ash::vk::{self, Handle};

use super::{
    BufferCreateParams, BufferMemoryBarrier, DescriptorBindingDesc,
    DescriptorWrite, GpuDevice, ImageCreateParams, ImageMemoryBarrier,
    ImageViewCreateParams, SamplerParams, TimelinePoint,
};
use crate::graphics::vulkan_api::VulkanError;

pub const DEVICE_LOCAL_TYPE: u32 = 0;
pub const HOST_COHERENT_TYPE: u32 = 1;
pub const HOST_CACHED_TYPE: u32 = 2;

const BUFFER_ALIGNMENT: vk::DeviceSize = 256;
const IMAGE_ALIGNMENT: vk::DeviceSize = 1024;

/// A command captured from a command buffer.
#[derive(Debug, Clone)]
pub enum Command {
    PipelineBarrier {
        buffers: Vec<BufferMemoryBarrier>,
        images: Vec<ImageMemoryBarrier>,
    },
    CopyBuffer {
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: Vec<vk::BufferCopy>,
    },
    CopyBufferToImage {
        src: vk::Buffer,
        dst: vk::Image,
        layout: vk::ImageLayout,
        regions: Vec<vk::BufferImageCopy>,
    },
    UpdateBuffer {
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        data: Vec<u8>,
    },
    BindPipeline {
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    },
    BindDescriptorSets {
        bind_point: vk::PipelineBindPoint,
        first_set: u32,
        sets: Vec<vk::DescriptorSet>,
    },
    BindVertexBuffer(vk::Buffer),
    BindIndexBuffer(vk::Buffer, vk::IndexType),
    Dispatch(u32, u32, u32),
    DrawIndexed(u32),
    BeginRenderPass {
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        clear_value_count: usize,
    },
    EndRenderPass,
}

struct FakeMemory {
    bytes: Box<[u8]>,
    memory_type_index: u32,
}

#[derive(Clone, Copy)]
struct Binding {
    memory: u64,
    offset: vk::DeviceSize,
}

#[derive(Default)]
struct FakeState {
    next_handle: u64,
    memory: HashMap<u64, FakeMemory>,
    buffers: HashMap<u64, (BufferCreateParams, Option<Binding>)>,
    images: HashMap<u64, (ImageCreateParams, Option<Binding>)>,
    buffer_views: usize,
    image_views: usize,
    samplers: usize,
    semaphores: HashMap<u64, u64>,
    recording: HashMap<u64, Vec<Command>>,
    descriptor_writes: Vec<DescriptorWrite>,
    submissions: Vec<Vec<vk::CommandBuffer>>,
    memory_allocation_count: usize,
    fail_memory_allocations: bool,
    execute_on_submit: bool,
}

impl FakeState {
    fn next_raw(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn buffer_binding(&self, buffer: vk::Buffer) -> Binding {
        self.buffers[&buffer.as_raw()]
            .1
            .expect("buffer has no memory bound")
    }

    fn execute(&mut self, command_buffer: vk::CommandBuffer) {
        let commands = self
            .recording
            .get(&command_buffer.as_raw())
            .cloned()
            .unwrap_or_default();
        for command in commands {
            match command {
                Command::CopyBuffer { src, dst, regions } => {
                    let src_binding = self.buffer_binding(src);
                    let dst_binding = self.buffer_binding(dst);
                    for region in regions {
                        let src_start =
                            (src_binding.offset + region.src_offset) as usize;
                        let bytes = self.memory[&src_binding.memory].bytes
                            [src_start..src_start + region.size as usize]
                            .to_vec();
                        let dst_start =
                            (dst_binding.offset + region.dst_offset) as usize;
                        self.memory
                            .get_mut(&dst_binding.memory)
                            .expect("memory was freed")
                            .bytes[dst_start..dst_start + bytes.len()]
                            .copy_from_slice(&bytes);
                    }
                }
                Command::UpdateBuffer { dst, offset, data } => {
                    let binding = self.buffer_binding(dst);
                    let start = (binding.offset + offset) as usize;
                    self.memory
                        .get_mut(&binding.memory)
                        .expect("memory was freed")
                        .bytes[start..start + data.len()]
                        .copy_from_slice(&data);
                }
                _ => (),
            }
        }
    }
}

pub struct FakeDevice {
    state: Mutex<FakeState>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                execute_on_submit: true,
                ..FakeState::default()
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake device state poisoned")
    }

    /// Every memory_type bit the fake device reports for resources.
    pub fn all_memory_types() -> u32 {
        0b111
    }

    /// When disabled, submissions are stored but the timeline is not
    /// advanced. Tests advance it with [Self::signal].
    pub fn set_execute_on_submit(&self, execute: bool) {
        self.state().execute_on_submit = execute;
    }

    pub fn fail_memory_allocations(&self, fail: bool) {
        self.state().fail_memory_allocations = fail;
    }

    /// Set a timeline semaphore's counter, as the GPU would.
    pub fn signal(&self, semaphore: vk::Semaphore, value: u64) {
        self.state().semaphores.insert(semaphore.as_raw(), value);
    }

    /// Execute a previously recorded command buffer's copies and updates.
    pub fn execute(&self, command_buffer: vk::CommandBuffer) {
        self.state().execute(command_buffer);
    }

    pub fn commands(&self, command_buffer: vk::CommandBuffer) -> Vec<Command> {
        self.state()
            .recording
            .get(&command_buffer.as_raw())
            .cloned()
            .unwrap_or_default()
    }

    pub fn descriptor_writes(&self) -> Vec<DescriptorWrite> {
        self.state().descriptor_writes.clone()
    }

    pub fn submissions(&self) -> Vec<Vec<vk::CommandBuffer>> {
        self.state().submissions.clone()
    }

    /// Number of device memory objects currently allocated.
    pub fn live_memory_allocations(&self) -> usize {
        self.state().memory.len()
    }

    /// Number of calls to allocate_memory that succeeded.
    pub fn memory_allocation_count(&self) -> usize {
        self.state().memory_allocation_count
    }

    pub fn memory_type_of(&self, memory: vk::DeviceMemory) -> u32 {
        self.state().memory[&memory.as_raw()].memory_type_index
    }

    pub fn live_buffers(&self) -> usize {
        self.state().buffers.len()
    }

    pub fn live_images(&self) -> usize {
        self.state().images.len()
    }

    pub fn live_buffer_views(&self) -> usize {
        self.state().buffer_views
    }

    pub fn live_image_views(&self) -> usize {
        self.state().image_views
    }

    pub fn live_samplers(&self) -> usize {
        self.state().samplers
    }

    /// Read `len` bytes of a buffer's bound memory.
    pub fn read_buffer(&self, buffer: vk::Buffer, len: usize) -> Vec<u8> {
        let state = self.state();
        let binding = state.buffer_binding(buffer);
        let start = binding.offset as usize;
        state.memory[&binding.memory].bytes[start..start + len].to_vec()
    }

    fn record(&self, command_buffer: vk::CommandBuffer, command: Command) {
        self.state()
            .recording
            .entry(command_buffer.as_raw())
            .or_default()
            .push(command);
    }
}

impl GpuDevice for FakeDevice {
    fn set_debug_name(
        &self,
        _object_type: vk::ObjectType,
        _raw_handle: u64,
        _name: &str,
    ) {
    }

    fn memory_properties(&self) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 3,
            memory_heap_count: 2,
            ..Default::default()
        };
        properties.memory_types[DEVICE_LOCAL_TYPE as usize] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            heap_index: 0,
        };
        properties.memory_types[HOST_COHERENT_TYPE as usize] =
            vk::MemoryType {
                property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
                    | vk::MemoryPropertyFlags::HOST_COHERENT,
                heap_index: 1,
            };
        properties.memory_types[HOST_CACHED_TYPE as usize] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
                | vk::MemoryPropertyFlags::HOST_CACHED,
            heap_index: 1,
        };
        properties.memory_heaps[0] = vk::MemoryHeap {
            size: 1 << 32,
            flags: vk::MemoryHeapFlags::DEVICE_LOCAL,
        };
        properties.memory_heaps[1] = vk::MemoryHeap {
            size: 1 << 30,
            flags: vk::MemoryHeapFlags::empty(),
        };
        properties
    }

    unsafe fn allocate_memory(
        &self,
        size: vk::DeviceSize,
        memory_type_index: u32,
    ) -> Result<vk::DeviceMemory, VulkanError> {
        let mut state = self.state();
        if state.fail_memory_allocations {
            return Err(VulkanError::UnableToAllocateDeviceMemory(
                vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
                size,
                memory_type_index,
            ));
        }
        let raw = state.next_raw();
        state.memory.insert(
            raw,
            FakeMemory {
                bytes: vec![0; size as usize].into_boxed_slice(),
                memory_type_index,
            },
        );
        state.memory_allocation_count += 1;
        Ok(vk::DeviceMemory::from_raw(raw))
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        let removed = self.state().memory.remove(&memory.as_raw());
        assert!(removed.is_some(), "double free of {:?}", memory);
    }

    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        _size: vk::DeviceSize,
    ) -> Result<*mut c_void, VulkanError> {
        let mut state = self.state();
        let fake = state
            .memory
            .get_mut(&memory.as_raw())
            .expect("mapping unknown memory");
        Ok(fake.bytes.as_mut_ptr().add(offset as usize) as *mut c_void)
    }

    unsafe fn unmap_memory(&self, _memory: vk::DeviceMemory) {}

    unsafe fn invalidate_mapped_memory(
        &self,
        _memory: vk::DeviceMemory,
        _offset: vk::DeviceSize,
        _size: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        Ok(())
    }

    unsafe fn flush_mapped_memory(
        &self,
        _memory: vk::DeviceMemory,
        _offset: vk::DeviceSize,
        _size: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        Ok(())
    }

    unsafe fn create_buffer(
        &self,
        params: &BufferCreateParams,
    ) -> Result<vk::Buffer, VulkanError> {
        let mut state = self.state();
        let raw = state.next_raw();
        state.buffers.insert(raw, (*params, None));
        Ok(vk::Buffer::from_raw(raw))
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        let removed = self.state().buffers.remove(&buffer.as_raw());
        assert!(removed.is_some(), "double destroy of {:?}", buffer);
    }

    fn buffer_memory_requirements(
        &self,
        buffer: vk::Buffer,
    ) -> vk::MemoryRequirements {
        let state = self.state();
        let (params, _) = &state.buffers[&buffer.as_raw()];
        vk::MemoryRequirements {
            size: params.size,
            alignment: BUFFER_ALIGNMENT,
            memory_type_bits: Self::all_memory_types(),
        }
    }

    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        let mut state = self.state();
        assert_eq!(offset % BUFFER_ALIGNMENT, 0, "misaligned buffer binding");
        let entry = state
            .buffers
            .get_mut(&buffer.as_raw())
            .expect("binding unknown buffer");
        assert!(entry.1.is_none(), "buffer memory bound twice");
        entry.1 = Some(Binding {
            memory: memory.as_raw(),
            offset,
        });
        Ok(())
    }

    unsafe fn create_image(
        &self,
        params: &ImageCreateParams,
    ) -> Result<vk::Image, VulkanError> {
        let mut state = self.state();
        let raw = state.next_raw();
        state.images.insert(raw, (*params, None));
        Ok(vk::Image::from_raw(raw))
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        let removed = self.state().images.remove(&image.as_raw());
        assert!(removed.is_some(), "double destroy of {:?}", image);
    }

    fn image_memory_requirements(
        &self,
        image: vk::Image,
    ) -> vk::MemoryRequirements {
        let state = self.state();
        let (params, _) = &state.images[&image.as_raw()];
        let texels = params.extent.width as u64
            * params.extent.height as u64
            * params.extent.depth as u64
            * params.array_layers as u64;
        vk::MemoryRequirements {
            size: texels * 4 * params.mip_levels as u64,
            alignment: IMAGE_ALIGNMENT,
            memory_type_bits: Self::all_memory_types(),
        }
    }

    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), VulkanError> {
        let mut state = self.state();
        assert_eq!(offset % IMAGE_ALIGNMENT, 0, "misaligned image binding");
        let entry = state
            .images
            .get_mut(&image.as_raw())
            .expect("binding unknown image");
        entry.1 = Some(Binding {
            memory: memory.as_raw(),
            offset,
        });
        Ok(())
    }

    unsafe fn create_buffer_view(
        &self,
        _buffer: vk::Buffer,
        _format: vk::Format,
        _offset: vk::DeviceSize,
        _range: vk::DeviceSize,
    ) -> Result<vk::BufferView, VulkanError> {
        let mut state = self.state();
        state.buffer_views += 1;
        Ok(vk::BufferView::from_raw(state.next_raw()))
    }

    unsafe fn destroy_buffer_view(&self, _view: vk::BufferView) {
        self.state().buffer_views -= 1;
    }

    unsafe fn create_image_view(
        &self,
        _image: vk::Image,
        _params: &ImageViewCreateParams,
    ) -> Result<vk::ImageView, VulkanError> {
        let mut state = self.state();
        state.image_views += 1;
        Ok(vk::ImageView::from_raw(state.next_raw()))
    }

    unsafe fn destroy_image_view(&self, _view: vk::ImageView) {
        self.state().image_views -= 1;
    }

    unsafe fn create_sampler(
        &self,
        _params: &SamplerParams,
    ) -> Result<vk::Sampler, VulkanError> {
        let mut state = self.state();
        state.samplers += 1;
        Ok(vk::Sampler::from_raw(state.next_raw()))
    }

    unsafe fn destroy_sampler(&self, _sampler: vk::Sampler) {
        self.state().samplers -= 1;
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        _bindings: &[DescriptorBindingDesc],
    ) -> Result<vk::DescriptorSetLayout, VulkanError> {
        Ok(vk::DescriptorSetLayout::from_raw(self.state().next_raw()))
    }

    unsafe fn destroy_descriptor_set_layout(
        &self,
        _layout: vk::DescriptorSetLayout,
    ) {
    }

    unsafe fn create_pipeline_layout(
        &self,
        _set_layouts: &[vk::DescriptorSetLayout],
    ) -> Result<vk::PipelineLayout, VulkanError> {
        Ok(vk::PipelineLayout::from_raw(self.state().next_raw()))
    }

    unsafe fn destroy_pipeline_layout(&self, _layout: vk::PipelineLayout) {}

    unsafe fn create_descriptor_pool(
        &self,
        _max_sets: u32,
        _pool_sizes: &[vk::DescriptorPoolSize],
    ) -> Result<vk::DescriptorPool, VulkanError> {
        Ok(vk::DescriptorPool::from_raw(self.state().next_raw()))
    }

    unsafe fn destroy_descriptor_pool(&self, _pool: vk::DescriptorPool) {}

    unsafe fn allocate_descriptor_set(
        &self,
        _pool: vk::DescriptorPool,
        _layout: vk::DescriptorSetLayout,
    ) -> Result<vk::DescriptorSet, VulkanError> {
        Ok(vk::DescriptorSet::from_raw(self.state().next_raw()))
    }

    unsafe fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        self.state().descriptor_writes.extend_from_slice(writes);
    }

    unsafe fn create_command_pool(
        &self,
    ) -> Result<vk::CommandPool, VulkanError> {
        Ok(vk::CommandPool::from_raw(self.state().next_raw()))
    }

    unsafe fn destroy_command_pool(&self, _pool: vk::CommandPool) {}

    unsafe fn reset_command_pool(
        &self,
        _pool: vk::CommandPool,
    ) -> Result<(), VulkanError> {
        Ok(())
    }

    unsafe fn allocate_command_buffer(
        &self,
        _pool: vk::CommandPool,
    ) -> Result<vk::CommandBuffer, VulkanError> {
        Ok(vk::CommandBuffer::from_raw(self.state().next_raw()))
    }

    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        self.state()
            .recording
            .insert(command_buffer.as_raw(), vec![]);
        Ok(())
    }

    unsafe fn end_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
    ) -> Result<(), VulkanError> {
        Ok(())
    }

    unsafe fn create_timeline_semaphore(
        &self,
        initial_value: u64,
    ) -> Result<vk::Semaphore, VulkanError> {
        let mut state = self.state();
        let raw = state.next_raw();
        state.semaphores.insert(raw, initial_value);
        Ok(vk::Semaphore::from_raw(raw))
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.state().semaphores.remove(&semaphore.as_raw());
    }

    fn semaphore_counter_value(
        &self,
        semaphore: vk::Semaphore,
    ) -> Result<u64, VulkanError> {
        self.state()
            .semaphores
            .get(&semaphore.as_raw())
            .copied()
            .ok_or(VulkanError::UnableToGetSemaphoreCounterValue(
                vk::Result::ERROR_DEVICE_LOST,
            ))
    }

    fn wait_for_semaphore(
        &self,
        semaphore: vk::Semaphore,
        value: u64,
        _timeout_ns: u64,
    ) -> Result<bool, VulkanError> {
        Ok(self.semaphore_counter_value(semaphore)? >= value)
    }

    unsafe fn submit(
        &self,
        command_buffers: &[vk::CommandBuffer],
        signal: TimelinePoint,
        _signal_stages: vk::PipelineStageFlags2,
    ) -> Result<(), VulkanError> {
        let mut state = self.state();
        state.submissions.push(command_buffers.to_vec());
        if state.execute_on_submit {
            for &command_buffer in command_buffers {
                state.execute(command_buffer);
            }
            state
                .semaphores
                .insert(signal.semaphore.as_raw(), signal.value);
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), VulkanError> {
        Ok(())
    }

    unsafe fn cmd_pipeline_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer_barriers: &[BufferMemoryBarrier],
        image_barriers: &[ImageMemoryBarrier],
    ) {
        self.record(
            command_buffer,
            Command::PipelineBarrier {
                buffers: buffer_barriers.to_vec(),
                images: image_barriers.to_vec(),
            },
        );
    }

    unsafe fn cmd_copy_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        regions: &[vk::BufferCopy],
    ) {
        self.record(
            command_buffer,
            Command::CopyBuffer {
                src,
                dst,
                regions: regions.to_vec(),
            },
        );
    }

    unsafe fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        dst_layout: vk::ImageLayout,
        regions: &[vk::BufferImageCopy],
    ) {
        self.record(
            command_buffer,
            Command::CopyBufferToImage {
                src,
                dst,
                layout: dst_layout,
                regions: regions.to_vec(),
            },
        );
    }

    unsafe fn cmd_update_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        dst: vk::Buffer,
        offset: vk::DeviceSize,
        data: &[u8],
    ) {
        self.record(
            command_buffer,
            Command::UpdateBuffer {
                dst,
                offset,
                data: data.to_vec(),
            },
        );
    }

    unsafe fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        self.record(
            command_buffer,
            Command::BindPipeline {
                bind_point,
                pipeline,
            },
        );
    }

    unsafe fn cmd_bind_descriptor_sets(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        _layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
    ) {
        self.record(
            command_buffer,
            Command::BindDescriptorSets {
                bind_point,
                first_set,
                sets: sets.to_vec(),
            },
        );
    }

    unsafe fn cmd_bind_vertex_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        _offset: vk::DeviceSize,
    ) {
        self.record(command_buffer, Command::BindVertexBuffer(buffer));
    }

    unsafe fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        _offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        self.record(command_buffer, Command::BindIndexBuffer(buffer, index_type));
    }

    unsafe fn cmd_dispatch(
        &self,
        command_buffer: vk::CommandBuffer,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) {
        self.record(
            command_buffer,
            Command::Dispatch(group_count_x, group_count_y, group_count_z),
        );
    }

    unsafe fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        _instance_count: u32,
    ) {
        self.record(command_buffer, Command::DrawIndexed(index_count));
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        _render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) {
        self.record(
            command_buffer,
            Command::BeginRenderPass {
                render_pass,
                framebuffer,
                clear_value_count: clear_values.len(),
            },
        );
    }

    unsafe fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        self.record(command_buffer, Command::EndRenderPass);
    }
}
