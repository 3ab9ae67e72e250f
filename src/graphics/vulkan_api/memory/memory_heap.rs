use {
    super::{MemoryBinding, MemoryPool, MAX_ALIGNMENT},
    crate::graphics::vulkan_api::{GpuDevice, VulkanError},
    ash::vk,
    std::{ffi::c_void, sync::Arc},
};

/// Tunables shared by every [MemoryHeap].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// The size of each shared pool.
    pub pool_size: vk::DeviceSize,

    /// Requests larger than this get a dedicated pool.
    pub max_placed_allocation_size: vk::DeviceSize,

    /// Allocation granularity inside a pool.
    pub block_size: vk::DeviceSize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            pool_size: 1 << 26,
            max_placed_allocation_size: 1 << 23,
            block_size: 64,
        }
    }
}

/// Memory handed out by a [MemoryHeap].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub binding: MemoryBinding,
    pub memory_type_index: u32,
    pub dedicated: bool,
}

/// All pools for a single memory type.
///
/// Small and medium requests are packed into shared pools of
/// [HeapConfig::pool_size] bytes. Requests larger than
/// [HeapConfig::max_placed_allocation_size], requests which ask for it, and
/// requests with an alignment the shared pools cannot honor get a dedicated
/// pool sized exactly to the request. Any pool which becomes empty is
/// destroyed immediately.
pub struct MemoryHeap {
    memory_type_index: u32,
    config: HeapConfig,
    pools: Vec<MemoryPool>,
    dedicated_pools: Vec<MemoryPool>,
    device: Arc<dyn GpuDevice>,
}

impl MemoryHeap {
    pub fn new(
        device: Arc<dyn GpuDevice>,
        memory_type_index: u32,
        config: HeapConfig,
    ) -> Self {
        assert!(
            config.pool_size
                >= config.max_placed_allocation_size + MAX_ALIGNMENT,
            "shared pools must fit the largest placed allocation: {:?}",
            config
        );
        Self {
            memory_type_index,
            config,
            pools: vec![],
            dedicated_pools: vec![],
            device,
        }
    }

    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the allocation must be returned with [Self::deallocate] before
    ///     the heap is dropped.
    pub unsafe fn allocate(
        &mut self,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
        force_dedicated: bool,
    ) -> Result<Allocation, VulkanError> {
        let dedicated = force_dedicated
            || size > self.config.max_placed_allocation_size
            || alignment > MAX_ALIGNMENT;

        if dedicated {
            let mut pool = MemoryPool::new(
                self.device.clone(),
                self.memory_type_index,
                size,
                self.config.block_size,
            )?;
            // offset 0 of a fresh pool satisfies any alignment
            let binding = pool
                .allocate(size, 1)
                .expect("dedicated pools always fit their allocation");
            log::debug!(
                "Dedicated {} byte pool for memory type {}",
                pool.size(),
                self.memory_type_index
            );
            self.dedicated_pools.push(pool);
            return Ok(self.allocation(binding, true));
        }

        for pool in &mut self.pools {
            if let Some(binding) = pool.allocate(size, alignment) {
                return Ok(self.allocation(binding, false));
            }
        }

        let mut pool = MemoryPool::new(
            self.device.clone(),
            self.memory_type_index,
            self.config.pool_size,
            self.config.block_size,
        )?;
        let binding = pool
            .allocate(size, alignment)
            .expect("brand new pools always fit a placed allocation");
        log::info!(
            "Memory type {} grew to {} shared pools",
            self.memory_type_index,
            self.pools.len() + 1
        );
        self.pools.push(pool);
        Ok(self.allocation(binding, false))
    }

    /// Return an allocation made by this heap. `size` must be the size
    /// which was requested. Pools left empty are destroyed.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - nothing bound to the allocation may still be used by the GPU.
    pub unsafe fn deallocate(
        &mut self,
        allocation: &Allocation,
        size: vk::DeviceSize,
    ) {
        debug_assert_eq!(allocation.memory_type_index, self.memory_type_index);
        let pools = if allocation.dedicated {
            &mut self.dedicated_pools
        } else {
            &mut self.pools
        };
        let index = pools
            .iter()
            .position(|pool| pool.memory() == allocation.binding.memory);
        let index = match index {
            Some(index) => index,
            None => {
                debug_assert!(
                    false,
                    "allocation {:?} does not belong to any pool",
                    allocation
                );
                return;
            }
        };
        if pools[index].deallocate(&allocation.binding, size) {
            let pool = pools.swap_remove(index);
            log::debug!(
                "Released empty {} byte pool of memory type {}",
                pool.size(),
                self.memory_type_index
            );
        }
    }

    /// Map the pool holding `allocation` and return a pointer to the start
    /// of the allocation.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///   - the memory type must be HOST_VISIBLE.
    ///   - every map must be matched by a call to [Self::unmap].
    pub unsafe fn map(
        &mut self,
        allocation: &Allocation,
    ) -> Result<*mut c_void, VulkanError> {
        let pool = self
            .owning_pool(allocation)
            .expect("mapping an allocation which belongs to no pool");
        pool.map(allocation.binding.offset)
    }

    /// # Safety
    ///
    /// Unsafe because:
    ///   - pointers returned by the matching [Self::map] must no longer be
    ///     used.
    pub unsafe fn unmap(&mut self, allocation: &Allocation) {
        if let Some(pool) = self.owning_pool(allocation) {
            pool.unmap();
        }
    }

    /// The number of shared pools currently alive.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// The number of dedicated pools currently alive.
    pub fn dedicated_pool_count(&self) -> usize {
        self.dedicated_pools.len()
    }

    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    fn owning_pool(
        &mut self,
        allocation: &Allocation,
    ) -> Option<&mut MemoryPool> {
        let pools = if allocation.dedicated {
            &mut self.dedicated_pools
        } else {
            &mut self.pools
        };
        pools
            .iter_mut()
            .find(|pool| pool.memory() == allocation.binding.memory)
    }

    fn allocation(&self, binding: MemoryBinding, dedicated: bool) -> Allocation {
        log::trace!(
            "Allocation at {:?}+{} (type {}, dedicated: {})",
            binding.memory,
            binding.offset,
            self.memory_type_index,
            dedicated
        );
        Allocation {
            binding,
            memory_type_index: self.memory_type_index,
            dedicated,
        }
    }
}

impl std::fmt::Debug for MemoryHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHeap")
            .field("memory_type_index", &self.memory_type_index)
            .field("pools", &self.pools)
            .field("dedicated_pools", &self.dedicated_pools)
            .finish()
    }
}
