use {
    crate::graphics::{
        resources::{has_write_access, BufferResource, ImageResource, SyncState},
        vulkan_api::{BufferMemoryBarrier, ImageMemoryBarrier},
    },
    ash::vk,
};

/// The most buffer barriers, and separately image barriers, recorded by a
/// single pipeline barrier command.
pub const MAX_BARRIERS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Nothing is pending.
    Idle,

    /// Barriers are pending and more may be pushed.
    Accumulating,

    /// The pending barriers are being recorded.
    Flushing,
}

/// Collects barriers until they have to be recorded.
///
/// Pushing a barrier immediately updates the resource's tracked state to
/// the destination state, so a second push for the same resource in the
/// same batch starts from where the first one left off.
#[derive(Debug)]
pub struct BarrierBatch {
    state: BatchState,
    buffers: Vec<BufferMemoryBarrier>,
    images: Vec<ImageMemoryBarrier>,
}

impl Default for BarrierBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl BarrierBatch {
    pub fn new() -> Self {
        Self {
            state: BatchState::Idle,
            buffers: Vec::with_capacity(MAX_BARRIERS),
            images: Vec::with_capacity(MAX_BARRIERS),
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn pending_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn pending_images(&self) -> usize {
        self.images.len()
    }

    /// True when pushing one more buffer barrier would overflow the batch.
    pub fn buffers_full(&self) -> bool {
        self.buffers.len() + 1 > MAX_BARRIERS
    }

    /// True when pushing one more image barrier would overflow the batch.
    pub fn images_full(&self) -> bool {
        self.images.len() + 1 > MAX_BARRIERS
    }

    /// Move `buffer` to a new access and stage.
    ///
    /// A barrier is only added when the previous access wrote to the
    /// buffer. The tracked state is updated either way.
    ///
    /// # Returns
    ///
    /// `true` when a barrier was added.
    pub fn push_buffer(
        &mut self,
        buffer: &BufferResource,
        access: vk::AccessFlags2,
        stages: vk::PipelineStageFlags2,
    ) -> bool {
        assert!(!self.buffers_full(), "flush before pushing more barriers");
        let src = buffer.sync_state();
        let needed = has_write_access(src.access);
        if needed {
            self.buffers.push(BufferMemoryBarrier {
                buffer: buffer.raw(),
                src_stages: src.stages,
                src_access: src.access,
                dst_stages: stages,
                dst_access: access,
                offset: 0,
                size: buffer.size(),
            });
            self.state = BatchState::Accumulating;
        }
        buffer.set_sync_state(SyncState {
            access,
            stages,
            layout: vk::ImageLayout::UNDEFINED,
        });
        needed
    }

    /// Move `image` to a new access, stage and layout.
    ///
    /// A layout of UNDEFINED keeps the current layout. A barrier is added
    /// when the layout changes or the previous access wrote to the image.
    ///
    /// # Returns
    ///
    /// `true` when a barrier was added.
    pub fn push_image(
        &mut self,
        image: &ImageResource,
        access: vk::AccessFlags2,
        stages: vk::PipelineStageFlags2,
        layout: vk::ImageLayout,
    ) -> bool {
        assert!(!self.images_full(), "flush before pushing more barriers");
        let src = image.sync_state();
        let dst_layout = if layout == vk::ImageLayout::UNDEFINED {
            src.layout
        } else {
            layout
        };
        let needed = src.layout != dst_layout || has_write_access(src.access);
        if needed {
            self.images.push(ImageMemoryBarrier {
                image: image.raw(),
                src_stages: src.stages,
                src_access: src.access,
                dst_stages: stages,
                dst_access: access,
                old_layout: src.layout,
                new_layout: dst_layout,
                subresource_range: image.full_subresource_range(),
            });
            self.state = BatchState::Accumulating;
        }
        image.set_sync_state(SyncState {
            access,
            stages,
            layout: if needed { dst_layout } else { src.layout },
        });
        needed
    }

    /// Hand every pending barrier to `record` as a single batch, then
    /// clear the batch.
    ///
    /// # Returns
    ///
    /// `false` when nothing was pending and `record` was not called.
    pub fn flush(
        &mut self,
        record: impl FnOnce(&[BufferMemoryBarrier], &[ImageMemoryBarrier]),
    ) -> bool {
        if self.state == BatchState::Idle {
            return false;
        }
        self.state = BatchState::Flushing;
        log::trace!(
            "Flushing {} buffer and {} image barriers",
            self.buffers.len(),
            self.images.len()
        );
        record(&self.buffers, &self.images);
        self.buffers.clear();
        self.images.clear();
        self.state = BatchState::Idle;
        true
    }
}
