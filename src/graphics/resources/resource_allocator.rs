use {
    super::{BufferResource, ImageResource},
    crate::graphics::{
        vulkan_api::{
            raii, Allocation, BufferCreateParams, GpuDevice, HeapConfig,
            ImageCreateParams, MemoryHeap, MemoryProperties, VulkanError,
        },
        GraphicsError,
    },
    ash::vk,
    std::{
        cell::Cell,
        rc::Rc,
        sync::{Arc, Mutex, MutexGuard},
    },
};

/// Vulkan never reports more memory types than this.
pub const MAX_MEMORY_TYPES: usize = vk::MAX_MEMORY_TYPES;

/// The largest nonCoherentAtomSize a Vulkan implementation may report.
/// Flushed and invalidated ranges start at a multiple of this.
const NON_COHERENT_ATOM_SIZE: vk::DeviceSize = 256;

/// Creates buffers and images and binds them to suballocated device memory.
///
/// There is one [MemoryHeap] per memory type. The heaps are behind a lock so
/// resources can return their memory from wherever they are dropped.
pub struct ResourceAllocator {
    heaps: Mutex<Vec<MemoryHeap>>,
    memory_properties: MemoryProperties,
    device: Arc<dyn GpuDevice>,
}

impl ResourceAllocator {
    pub fn new(device: Arc<dyn GpuDevice>, config: HeapConfig) -> Arc<Self> {
        let memory_properties = MemoryProperties::new(device.memory_properties());
        let heaps = (0..MAX_MEMORY_TYPES as u32)
            .map(|index| MemoryHeap::new(device.clone(), index, config))
            .collect();
        Arc::new(Self {
            heaps: Mutex::new(heaps),
            memory_properties,
            device,
        })
    }

    /// Create a buffer bound to memory from the lowest memory type allowed
    /// by both the buffer and `memory_type_bits`.
    ///
    /// An empty intersection of the allowed memory types is returned as
    /// [GraphicsError::NoCompatibleMemoryType] instead of aborting, and the
    /// freshly created buffer is destroyed again.
    pub fn alloc_buffer(
        self: &Arc<Self>,
        params: &BufferCreateParams,
        memory_type_bits: u32,
    ) -> Result<Rc<BufferResource>, GraphicsError> {
        let buffer = unsafe { raii::Buffer::new(self.device.clone(), params)? };
        let requirements = buffer.memory_requirements();
        let memory = self.allocate(&requirements, memory_type_bits)?;
        unsafe {
            self.device.bind_buffer_memory(
                buffer.raw(),
                memory.allocation.binding.memory,
                memory.allocation.binding.offset,
            )?;
        }
        Ok(Rc::new(BufferResource::new(
            Rc::new(buffer),
            *params,
            memory,
        )))
    }

    /// Create an image bound to memory from the lowest memory type allowed
    /// by both the image and `memory_type_bits`.
    ///
    /// An empty intersection of the allowed memory types is returned as
    /// [GraphicsError::NoCompatibleMemoryType] instead of aborting, and the
    /// freshly created image is destroyed again.
    pub fn alloc_image(
        self: &Arc<Self>,
        params: &ImageCreateParams,
        memory_type_bits: u32,
    ) -> Result<Rc<ImageResource>, GraphicsError> {
        let image = unsafe { raii::Image::new(self.device.clone(), params)? };
        let requirements = image.memory_requirements();
        let memory = self.allocate(&requirements, memory_type_bits)?;
        unsafe {
            self.device.bind_image_memory(
                image.raw(),
                memory.allocation.binding.memory,
                memory.allocation.binding.offset,
            )?;
        }
        Ok(Rc::new(ImageResource::new(
            Rc::new(image),
            *params,
            Some(memory),
        )))
    }

    /// Wrap an image the allocator does not own, like a swapchain image.
    /// The resulting resource tracks state like any other image but never
    /// destroys the image or releases memory.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the image's owner must keep it alive for as long as the resource
    ///     or any of its views are in use.
    pub unsafe fn register_external_image(
        &self,
        image: vk::Image,
        params: &ImageCreateParams,
    ) -> Rc<ImageResource> {
        let image = raii::Image::external(self.device.clone(), image);
        Rc::new(ImageResource::new(Rc::new(image), *params, None))
    }

    pub fn memory_properties(&self) -> &MemoryProperties {
        &self.memory_properties
    }

    pub fn device(&self) -> &Arc<dyn GpuDevice> {
        &self.device
    }

    /// The number of live shared and dedicated pools for a memory type.
    pub fn pool_counts(&self, memory_type_index: u32) -> (usize, usize) {
        let heaps = self.heaps();
        let heap = &heaps[memory_type_index as usize];
        (heap.pool_count(), heap.dedicated_pool_count())
    }

    fn heaps(&self) -> MutexGuard<'_, Vec<MemoryHeap>> {
        self.heaps
            .lock()
            .expect("unable to acquire the memory heap lock")
    }

    /// Pick a memory type and allocate. Dropping the result releases the
    /// memory, so a failed bind cleans up on its own.
    fn allocate(
        self: &Arc<Self>,
        requirements: &vk::MemoryRequirements,
        memory_type_bits: u32,
    ) -> Result<ResourceMemory, GraphicsError> {
        let allowed = requirements.memory_type_bits & memory_type_bits;
        if allowed == 0 {
            return Err(GraphicsError::NoCompatibleMemoryType(
                requirements.memory_type_bits,
                memory_type_bits,
            ));
        }
        let memory_type_index = allowed.trailing_zeros();

        let allocation = unsafe {
            self.heaps()[memory_type_index as usize].allocate(
                requirements.size,
                requirements.alignment,
                false,
            )?
        };
        Ok(ResourceMemory {
            allocation,
            size: requirements.size,
            mapped: Cell::new(None),
            allocator: self.clone(),
        })
    }

    unsafe fn deallocate(&self, allocation: &Allocation, size: vk::DeviceSize) {
        self.heaps()[allocation.memory_type_index as usize]
            .deallocate(allocation, size);
    }

    unsafe fn map(&self, allocation: &Allocation) -> Result<*mut u8, VulkanError> {
        let ptr =
            self.heaps()[allocation.memory_type_index as usize].map(allocation)?;
        Ok(ptr as *mut u8)
    }

    unsafe fn unmap(&self, allocation: &Allocation) {
        self.heaps()[allocation.memory_type_index as usize].unmap(allocation);
    }
}

impl std::fmt::Debug for ResourceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceAllocator")
            .field("memory_properties", &self.memory_properties)
            .finish()
    }
}

/// Device memory backing one resource. Released when dropped.
pub(crate) struct ResourceMemory {
    allocation: Allocation,
    size: vk::DeviceSize,
    mapped: Cell<Option<*mut u8>>,
    allocator: Arc<ResourceAllocator>,
}

impl ResourceMemory {
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Map the memory and return a pointer to the first byte of the
    /// resource. Mapping an already mapped resource returns the same
    /// pointer.
    pub fn map(&self) -> Result<*mut u8, GraphicsError> {
        if let Some(ptr) = self.mapped.get() {
            return Ok(ptr);
        }
        let ptr = unsafe { self.allocator.map(&self.allocation)? };
        self.mapped.set(Some(ptr));
        Ok(ptr)
    }

    pub fn unmap(&self) {
        if self.mapped.take().is_some() {
            unsafe { self.allocator.unmap(&self.allocation) }
        }
    }

    pub fn mapped_ptr(&self) -> Option<*mut u8> {
        self.mapped.get()
    }

    /// Make device writes visible to the host. Coherent memory needs no
    /// invalidation.
    pub fn invalidate(&self) -> Result<(), GraphicsError> {
        if self.is_host_coherent() {
            return Ok(());
        }
        let (offset, size) = self.atom_range();
        unsafe {
            self.allocator.device.invalidate_mapped_memory(
                self.allocation.binding.memory,
                offset,
                size,
            )?;
        }
        Ok(())
    }

    /// Make host writes visible to the device. Coherent memory needs no
    /// flush.
    pub fn flush(&self) -> Result<(), GraphicsError> {
        if self.is_host_coherent() {
            return Ok(());
        }
        let (offset, size) = self.atom_range();
        unsafe {
            self.allocator.device.flush_mapped_memory(
                self.allocation.binding.memory,
                offset,
                size,
            )?;
        }
        Ok(())
    }

    fn is_host_coherent(&self) -> bool {
        self.allocator
            .memory_properties
            .is_host_coherent(self.allocation.memory_type_index)
    }

    /// The resource's range widened to whole non-coherent atoms. The pool is
    /// mapped in full so running to the end of the mapping is always valid.
    fn atom_range(&self) -> (vk::DeviceSize, vk::DeviceSize) {
        let offset = self.allocation.binding.offset / NON_COHERENT_ATOM_SIZE
            * NON_COHERENT_ATOM_SIZE;
        (offset, vk::WHOLE_SIZE)
    }
}

impl Drop for ResourceMemory {
    fn drop(&mut self) {
        self.unmap();
        unsafe { self.allocator.deallocate(&self.allocation, self.size) }
    }
}

impl std::fmt::Debug for ResourceMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceMemory")
            .field("allocation", &self.allocation)
            .field("size", &self.size)
            .field("mapped", &self.mapped.get().is_some())
            .finish()
    }
}
