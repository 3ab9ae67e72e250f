use {
    crate::graphics::{
        commands::CommandRecorder,
        resources::{BufferResource, ImageResource, ResourceAllocator},
        vulkan_api::{AddressAllocator, BufferCreateParams},
        GraphicsError,
    },
    anyhow::Context,
    ash::vk,
    std::{rc::Rc, sync::Arc},
};

/// Sizing for the staging arena used by [ResourceUtils].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingConfig {
    /// The size of the host visible staging buffer in bytes.
    pub size: vk::DeviceSize,

    /// The alignment of every upload inside the staging buffer.
    pub alignment: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            size: 1 << 24,
            alignment: 64,
        }
    }
}

/// Uploads data to device local resources through a mapped staging
/// buffer.
///
/// Data is copied into the staging buffer immediately and the GPU copy is
/// recorded into the wrapped [CommandRecorder]. The copies read the
/// staging buffer only once the recorder is submitted, so the arena is
/// never reclaimed while the recorder holds copies and must be sized for
/// everything uploaded through one recorder.
pub struct ResourceUtils {
    staging: Rc<BufferResource>,
    mapped: *mut u8,
    arena: AddressAllocator,
    alignment: u64,
    recorder: CommandRecorder,
    recorded_copies: usize,
}

impl ResourceUtils {
    pub fn new(
        allocator: &Arc<ResourceAllocator>,
        recorder: CommandRecorder,
        config: StagingConfig,
    ) -> Result<Self, GraphicsError> {
        let staging = allocator
            .alloc_buffer(
                &BufferCreateParams {
                    size: config.size,
                    usage: vk::BufferUsageFlags::TRANSFER_SRC,
                },
                allocator.memory_properties().host_visible_bits(),
            )
            .with_context(|| {
                format!("Unable to allocate a {} byte staging buffer", config.size)
            })?;
        staging.set_debug_name("staging buffer");
        let mapped = staging
            .map()
            .context("Unable to map the staging buffer")?;
        Ok(Self {
            staging,
            mapped,
            arena: AddressAllocator::new(config.size, config.alignment),
            alignment: config.alignment,
            recorder,
            recorded_copies: 0,
        })
    }

    /// Reclaim the whole staging arena.
    ///
    /// # Returns
    ///
    /// `false` when copies recorded into the current recorder still read
    /// from the arena. New uploads would overwrite their data before the
    /// recorder is submitted, so the arena is left untouched.
    pub fn begin_transfer_pass(&mut self) -> bool {
        if self.recorded_copies > 0 {
            log::warn!(
                "Not reclaiming the staging arena, {} recorded copies still read from it",
                self.recorded_copies
            );
            return false;
        }
        self.arena.reset();
        true
    }

    /// Bytes still available in the staging arena.
    pub fn staging_free_size(&self) -> u64 {
        self.arena.free_size()
    }

    pub fn staging_buffer(&self) -> &Rc<BufferResource> {
        &self.staging
    }

    /// Copy `bytes` into `dst` starting at `offset`.
    ///
    /// # Returns
    ///
    /// `false` when the staging arena is exhausted. Nothing is recorded in
    /// that case.
    pub fn upload_buffer_data(
        &mut self,
        dst: &Rc<BufferResource>,
        offset: vk::DeviceSize,
        bytes: &[u8],
    ) -> Result<bool, GraphicsError> {
        if bytes.is_empty() {
            return Ok(true);
        }
        let Some(src_offset) = self.stage(bytes)? else {
            return Ok(false);
        };
        self.recorder.copy_buffer(
            &self.staging,
            dst,
            &[vk::BufferCopy {
                src_offset,
                dst_offset: offset,
                size: bytes.len() as u64,
            }],
        );
        self.recorded_copies += 1;
        Ok(true)
    }

    /// Copy texel data into `dst`. Region buffer offsets are relative to
    /// the start of `bytes`.
    ///
    /// # Returns
    ///
    /// `false` when the staging arena is exhausted. Nothing is recorded in
    /// that case.
    pub fn upload_image_data(
        &mut self,
        dst: &Rc<ImageResource>,
        regions: &[vk::BufferImageCopy],
        bytes: &[u8],
    ) -> Result<bool, GraphicsError> {
        if bytes.is_empty() || regions.is_empty() {
            return Ok(true);
        }
        let Some(src_offset) = self.stage(bytes)? else {
            return Ok(false);
        };
        let regions: Vec<vk::BufferImageCopy> = regions
            .iter()
            .map(|region| vk::BufferImageCopy {
                buffer_offset: region.buffer_offset + src_offset,
                ..*region
            })
            .collect();
        self.recorder
            .copy_buffer_to_image(&self.staging, dst, &regions);
        self.recorded_copies += 1;
        Ok(true)
    }

    pub fn recorder(&mut self) -> &mut CommandRecorder {
        &mut self.recorder
    }

    /// Give back the recorder holding the recorded copies. The recorder
    /// keeps the staging buffer alive for as long as it needs it.
    pub fn into_recorder(self) -> CommandRecorder {
        self.recorder
    }

    /// Reserve arena space and copy `bytes` into it.
    fn stage(&mut self, bytes: &[u8]) -> Result<Option<u64>, GraphicsError> {
        let size = bytes.len() as u64;
        let Some(offset) = self.arena.alloc(size, self.alignment) else {
            log::warn!(
                "Staging buffer exhausted: {} bytes requested, {} of {} free",
                size,
                self.arena.free_size(),
                self.arena.total_size()
            );
            return Ok(None);
        };
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.mapped.add(offset as usize),
                bytes.len(),
            );
        }
        self.staging.flush_mapped_range()?;

        // the host write is what the transfer has to wait for
        self.recorder.push_buffer_barrier(
            &self.staging,
            vk::AccessFlags2::HOST_WRITE,
            vk::PipelineStageFlags2::HOST,
        );
        Ok(Some(offset))
    }
}

impl std::fmt::Debug for ResourceUtils {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceUtils")
            .field("staging", &self.staging)
            .field("arena", &self.arena)
            .field("recorded_copies", &self.recorded_copies)
            .field("recorder", &self.recorder)
            .finish()
    }
}
