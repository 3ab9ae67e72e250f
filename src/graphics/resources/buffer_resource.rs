use {
    super::{
        resource_allocator::ResourceMemory, ResourceId, SyncState,
        MAX_CACHED_VIEWS, SIZE_FULL_RANGE,
    },
    crate::graphics::{
        vulkan_api::{raii, BufferCreateParams},
        GraphicsError, LruCache,
    },
    ash::vk,
    std::{
        cell::{Cell, RefCell},
        rc::Rc,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferViewKey {
    format: vk::Format,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
}

/// A buffer bound to suballocated memory, along with the synchronization
/// state of its last recorded use.
pub struct BufferResource {
    id: ResourceId,
    params: BufferCreateParams,
    state: Cell<SyncState>,
    views: RefCell<LruCache<BufferViewKey, raii::BufferView>>,

    // Field order matters: the buffer is destroyed before its memory is
    // released.
    buffer: Rc<raii::Buffer>,
    memory: ResourceMemory,
}

impl BufferResource {
    pub(super) fn new(
        buffer: Rc<raii::Buffer>,
        params: BufferCreateParams,
        memory: ResourceMemory,
    ) -> Self {
        Self {
            id: ResourceId::next(),
            params,
            state: Cell::new(SyncState::INITIAL),
            views: RefCell::new(LruCache::new(MAX_CACHED_VIEWS)),
            buffer,
            memory,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The raw Vulkan buffer handle.
    pub fn raw(&self) -> vk::Buffer {
        self.buffer.raw()
    }

    /// The size requested when the buffer was created.
    pub fn size(&self) -> vk::DeviceSize {
        self.params.size
    }

    pub fn usage(&self) -> vk::BufferUsageFlags {
        self.params.usage
    }

    /// The memory type the buffer was allocated from.
    pub fn memory_type_index(&self) -> u32 {
        self.memory.allocation().memory_type_index
    }

    pub fn set_debug_name(&self, name: impl Into<String>) {
        self.buffer.set_debug_name(name);
    }

    /// The last recorded use of the buffer.
    pub fn sync_state(&self) -> SyncState {
        self.state.get()
    }

    /// Replace the last recorded use. Only the command recorder should call
    /// this while recording.
    pub fn set_sync_state(&self, state: SyncState) {
        self.state.set(state);
    }

    /// Get a texel view of `size` bytes starting at `offset`. Views are
    /// cached, so asking for the same range twice returns the same view.
    /// [SIZE_FULL_RANGE] means "to the end of the buffer".
    pub fn view(
        &self,
        format: vk::Format,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<Rc<raii::BufferView>, GraphicsError> {
        let key = if size == SIZE_FULL_RANGE {
            BufferViewKey {
                format,
                offset: 0,
                size: self.size(),
            }
        } else {
            BufferViewKey {
                format,
                offset,
                size,
            }
        };
        let view = self.views.borrow_mut().get_or_try_insert_with(key, || unsafe {
            raii::BufferView::new(
                self.buffer.clone(),
                key.format,
                key.offset,
                key.size,
            )
        })?;
        Ok(view)
    }

    /// The number of views currently cached.
    pub fn cached_view_count(&self) -> usize {
        self.views.borrow().len()
    }

    /// Map the buffer's memory. The memory must be HOST_VISIBLE.
    pub fn map(&self) -> Result<*mut u8, GraphicsError> {
        self.memory.map()
    }

    pub fn unmap(&self) {
        self.memory.unmap()
    }

    /// The pointer returned by the last [Self::map], if still mapped.
    pub fn mapped_ptr(&self) -> Option<*mut u8> {
        self.memory.mapped_ptr()
    }

    pub fn invalidate_mapped_range(&self) -> Result<(), GraphicsError> {
        self.memory.invalidate()
    }

    pub fn flush_mapped_range(&self) -> Result<(), GraphicsError> {
        self.memory.flush()
    }
}

impl Drop for BufferResource {
    fn drop(&mut self) {
        self.views.get_mut().clear();
        debug_assert!(
            Rc::strong_count(&self.buffer) == 1,
            "buffer {:?} is still referenced when its memory is released",
            self.buffer.raw()
        );
    }
}

impl std::fmt::Debug for BufferResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferResource")
            .field("id", &self.id)
            .field("buffer", &self.buffer.raw())
            .field("size", &self.params.size)
            .field("state", &self.state.get())
            .field("memory", &self.memory)
            .finish()
    }
}
