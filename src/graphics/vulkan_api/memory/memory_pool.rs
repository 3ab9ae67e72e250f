use {
    super::AddressAllocator,
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk,
    std::{ffi::c_void, sync::Arc},
};

/// A location inside device memory where a buffer or image is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBinding {
    pub memory: vk::DeviceMemory,
    pub offset: vk::DeviceSize,
}

/// One device memory allocation which is suballocated for many resources.
pub struct MemoryPool {
    memory: vk::DeviceMemory,
    memory_type_index: u32,
    address_allocator: AddressAllocator,
    mapped: Option<(*mut c_void, usize)>,
    device: Arc<dyn GpuDevice>,
}

// The mapped pointer is only handed out through the owning heap, which is
// always accessed behind a lock.
unsafe impl Send for MemoryPool {}

impl MemoryPool {
    /// Allocate a new pool of at least `size` bytes. The size is rounded up
    /// to a whole number of `block_size` blocks.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the pool frees its device memory when dropped, so every resource
    ///     bound to it must be destroyed first.
    pub unsafe fn new(
        device: Arc<dyn GpuDevice>,
        memory_type_index: u32,
        size: vk::DeviceSize,
        block_size: vk::DeviceSize,
    ) -> Result<Self, VulkanError> {
        let rounded_size = super::align_up(size, block_size).ok_or(
            VulkanError::UnableToAllocateDeviceMemory(
                vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
                size,
                memory_type_index,
            ),
        )?;
        let memory = device.allocate_memory(rounded_size, memory_type_index)?;
        log::trace!(
            "Allocated a {} byte pool from memory type {}",
            rounded_size,
            memory_type_index
        );
        Ok(Self {
            memory,
            memory_type_index,
            address_allocator: AddressAllocator::new(rounded_size, block_size),
            mapped: None,
            device,
        })
    }

    /// Reserve `size` bytes aligned to `alignment` inside the pool.
    ///
    /// # Returns
    ///
    /// `None` when the pool does not have a large enough free range or the
    /// alignment is larger than [super::MAX_ALIGNMENT].
    pub fn allocate(
        &mut self,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
    ) -> Option<MemoryBinding> {
        let offset = self
            .address_allocator
            .alloc(size, alignment.max(1))?;
        Some(MemoryBinding {
            memory: self.memory,
            offset,
        })
    }

    /// Release a range previously returned by [Self::allocate].
    ///
    /// # Returns
    ///
    /// True when the pool no longer holds any allocation and may be
    /// destroyed.
    pub fn deallocate(
        &mut self,
        binding: &MemoryBinding,
        size: vk::DeviceSize,
    ) -> bool {
        debug_assert_eq!(
            binding.memory, self.memory,
            "binding does not belong to this pool"
        );
        self.address_allocator.free(binding.offset, size);
        self.address_allocator.is_empty()
    }

    /// Map the whole pool into host memory and return a pointer to the
    /// byte at `offset`. Maps are counted: the memory stays mapped until
    /// every call has been matched by [Self::unmap].
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the memory type must be HOST_VISIBLE.
    ///   - the pointer is only valid until the matching unmap.
    pub unsafe fn map(
        &mut self,
        offset: vk::DeviceSize,
    ) -> Result<*mut c_void, VulkanError> {
        let base = match &mut self.mapped {
            Some((ptr, count)) => {
                *count += 1;
                *ptr
            }
            None => {
                let ptr =
                    self.device.map_memory(self.memory, 0, vk::WHOLE_SIZE)?;
                self.mapped = Some((ptr, 1));
                ptr
            }
        };
        Ok((base as *mut u8).add(offset as usize) as *mut c_void)
    }

    /// Release one map reference. The memory is unmapped when the count
    /// reaches zero.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - pointers returned by the matching map must no longer be used.
    pub unsafe fn unmap(&mut self) {
        match &mut self.mapped {
            Some((_, count)) if *count > 1 => *count -= 1,
            Some(_) => {
                self.device.unmap_memory(self.memory);
                self.mapped = None;
            }
            None => debug_assert!(false, "unmap without a matching map"),
        }
    }

    /// The device memory owned by this pool.
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// The memory type the pool was allocated from.
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// Total size of the pool in bytes.
    pub fn size(&self) -> vk::DeviceSize {
        self.address_allocator.total_size()
    }

    /// Bytes not currently handed out.
    pub fn free_size(&self) -> vk::DeviceSize {
        self.address_allocator.free_size()
    }
}

impl Drop for MemoryPool {
    /// # DANGER
    ///
    /// Resources bound to this pool's memory must be destroyed before the
    /// pool is dropped.
    fn drop(&mut self) {
        unsafe {
            if self.mapped.is_some() {
                self.device.unmap_memory(self.memory);
            }
            self.device.free_memory(self.memory)
        }
    }
}

impl std::fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPool")
            .field("memory", &self.memory)
            .field("memory_type_index", &self.memory_type_index)
            .field("size", &self.size())
            .field("free_size", &self.free_size())
            .field("mapped", &self.mapped.is_some())
            .finish()
    }
}
