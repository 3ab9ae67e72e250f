use {
    super::{
        aspect_from_format, resource_allocator::ResourceMemory, ResourceId,
        SyncState, LAYER_COUNT_FULL_RANGE, MAX_CACHED_VIEWS,
        MIP_COUNT_FULL_RANGE,
    },
    crate::graphics::{
        vulkan_api::{raii, ImageCreateParams, ImageViewCreateParams},
        GraphicsError, LruCache,
    },
    anyhow::anyhow,
    ash::vk,
    std::{
        cell::{Cell, RefCell},
        rc::Rc,
    },
};

/// Describes a view of an image.
///
/// A `format` of UNDEFINED means "the image's own format". A mip or layer
/// count of zero means "every remaining level/layer".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewParams {
    pub view_type: vk::ImageViewType,
    pub format: vk::Format,
    pub aspect: vk::ImageAspectFlags,
    pub base_mip_level: u32,
    pub mip_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

impl Default for ImageViewParams {
    fn default() -> Self {
        Self {
            view_type: vk::ImageViewType::TYPE_2D,
            format: vk::Format::UNDEFINED,
            aspect: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            mip_count: MIP_COUNT_FULL_RANGE,
            base_array_layer: 0,
            layer_count: LAYER_COUNT_FULL_RANGE,
        }
    }
}

/// An image and the synchronization state of its last recorded use.
///
/// Images are either bound to memory from the [super::ResourceAllocator] or
/// external (swapchain images) in which case there is no memory to manage.
pub struct ImageResource {
    id: ResourceId,
    params: ImageCreateParams,
    state: Cell<SyncState>,
    views: RefCell<LruCache<ImageViewParams, raii::ImageView>>,

    // Field order matters: the image is destroyed before its memory is
    // released.
    image: Rc<raii::Image>,
    memory: Option<ResourceMemory>,
}

impl ImageResource {
    pub(super) fn new(
        image: Rc<raii::Image>,
        params: ImageCreateParams,
        memory: Option<ResourceMemory>,
    ) -> Self {
        Self {
            id: ResourceId::next(),
            params,
            state: Cell::new(SyncState::INITIAL),
            views: RefCell::new(LruCache::new(MAX_CACHED_VIEWS)),
            image,
            memory,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The raw Vulkan image handle.
    pub fn raw(&self) -> vk::Image {
        self.image.raw()
    }

    /// The parameters the image was created with.
    pub fn params(&self) -> &ImageCreateParams {
        &self.params
    }

    pub fn format(&self) -> vk::Format {
        self.params.format
    }

    pub fn extent(&self) -> vk::Extent3D {
        self.params.extent
    }

    pub fn mip_levels(&self) -> u32 {
        self.params.mip_levels
    }

    pub fn array_layers(&self) -> u32 {
        self.params.array_layers
    }

    /// The aspects covered by barriers on this image.
    pub fn aspect(&self) -> vk::ImageAspectFlags {
        aspect_from_format(self.params.format)
    }

    /// Every mip level and array layer of the image.
    pub fn full_subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect(),
            base_mip_level: 0,
            level_count: self.params.mip_levels,
            base_array_layer: 0,
            layer_count: self.params.array_layers,
        }
    }

    /// True for images registered with
    /// [super::ResourceAllocator::register_external_image].
    pub fn is_external(&self) -> bool {
        self.image.is_external()
    }

    pub fn memory_type_index(&self) -> Option<u32> {
        self.memory
            .as_ref()
            .map(|memory| memory.allocation().memory_type_index)
    }

    pub fn set_debug_name(&self, name: impl Into<String>) {
        self.image.set_debug_name(name);
    }

    pub fn sync_state(&self) -> SyncState {
        self.state.get()
    }

    /// The layout the image was left in by the last recorded use.
    pub fn layout(&self) -> vk::ImageLayout {
        self.state.get().layout
    }

    /// Replace the last recorded use. Only the command recorder should call
    /// this while recording.
    pub fn set_sync_state(&self, state: SyncState) {
        self.state.set(state);
    }

    /// Record the layout an image was left in by something other than a
    /// barrier, like the final layout of a render pass attachment.
    pub fn set_layout(&self, layout: vk::ImageLayout) {
        let mut state = self.state.get();
        state.layout = layout;
        self.state.set(state);
    }

    /// Get a cached view of the image.
    pub fn view(
        &self,
        params: &ImageViewParams,
    ) -> Result<Rc<raii::ImageView>, GraphicsError> {
        let key = self.resolve_view_params(params);
        let view = self.views.borrow_mut().get_or_try_insert_with(key, || unsafe {
            raii::ImageView::new(
                self.image.clone(),
                &ImageViewCreateParams {
                    view_type: key.view_type,
                    format: key.format,
                    subresource_range: vk::ImageSubresourceRange {
                        aspect_mask: key.aspect,
                        base_mip_level: key.base_mip_level,
                        level_count: key.mip_count,
                        base_array_layer: key.base_array_layer,
                        layer_count: key.layer_count,
                    },
                },
            )
        })?;
        Ok(view)
    }

    pub fn cached_view_count(&self) -> usize {
        self.views.borrow().len()
    }

    /// Map the image's memory. Only linear images in HOST_VISIBLE memory
    /// can be meaningfully mapped.
    pub fn map(&self) -> Result<*mut u8, GraphicsError> {
        self.owned_memory()?.map()
    }

    pub fn unmap(&self) {
        if let Some(memory) = &self.memory {
            memory.unmap();
        }
    }

    pub fn mapped_ptr(&self) -> Option<*mut u8> {
        self.memory.as_ref().and_then(ResourceMemory::mapped_ptr)
    }

    pub fn invalidate_mapped_range(&self) -> Result<(), GraphicsError> {
        self.owned_memory()?.invalidate()
    }

    pub fn flush_mapped_range(&self) -> Result<(), GraphicsError> {
        self.owned_memory()?.flush()
    }

    fn owned_memory(&self) -> Result<&ResourceMemory, GraphicsError> {
        self.memory.as_ref().ok_or_else(|| {
            GraphicsError::RuntimeError(anyhow!(
                "image {:?} is external and has no memory to map",
                self.image.raw()
            ))
        })
    }

    /// Replace the "whole image" sentinels with concrete values.
    fn resolve_view_params(&self, params: &ImageViewParams) -> ImageViewParams {
        let mut resolved = *params;
        if resolved.format == vk::Format::UNDEFINED {
            resolved.format = self.params.format;
        }
        if resolved.mip_count == MIP_COUNT_FULL_RANGE {
            resolved.base_mip_level = 0;
            resolved.mip_count = self.params.mip_levels;
        }
        if resolved.layer_count == LAYER_COUNT_FULL_RANGE {
            resolved.base_array_layer = 0;
            resolved.layer_count = self.params.array_layers;
        }
        resolved
    }
}

impl Drop for ImageResource {
    fn drop(&mut self) {
        self.views.get_mut().clear();
        debug_assert!(
            Rc::strong_count(&self.image) == 1,
            "image {:?} is still referenced when its memory is released",
            self.image.raw()
        );
    }
}

impl std::fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResource")
            .field("id", &self.id)
            .field("image", &self.image.raw())
            .field("format", &self.params.format)
            .field("extent", &self.params.extent)
            .field("state", &self.state.get())
            .field("memory", &self.memory)
            .finish()
    }
}
