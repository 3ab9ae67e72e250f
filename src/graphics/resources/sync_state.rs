use ash::vk;

/// The last observed use of a resource on the GPU timeline.
///
/// `layout` is only meaningful for images. Buffers keep it at UNDEFINED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub access: vk::AccessFlags2,
    pub stages: vk::PipelineStageFlags2,
    pub layout: vk::ImageLayout,
}

impl SyncState {
    /// The state of a resource which has never been used.
    pub const INITIAL: Self = Self {
        access: vk::AccessFlags2::NONE,
        stages: vk::PipelineStageFlags2::NONE,
        layout: vk::ImageLayout::UNDEFINED,
    };
}

impl Default for SyncState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Every access bit which writes memory, core and extension alike.
pub const WRITE_ACCESS: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
    vk::AccessFlags2::SHADER_WRITE.as_raw()
        | vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw()
        | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw()
        | vk::AccessFlags2::TRANSFER_WRITE.as_raw()
        | vk::AccessFlags2::HOST_WRITE.as_raw()
        | vk::AccessFlags2::MEMORY_WRITE.as_raw()
        | vk::AccessFlags2::ACCELERATION_STRUCTURE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_WRITE_EXT.as_raw()
        | vk::AccessFlags2::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT.as_raw()
        | vk::AccessFlags2::VIDEO_DECODE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::VIDEO_ENCODE_WRITE_KHR.as_raw()
        | vk::AccessFlags2::COMMAND_PREPROCESS_WRITE_NV.as_raw()
        | vk::AccessFlags2::MICROMAP_WRITE_EXT.as_raw()
        | vk::AccessFlags2::OPTICAL_FLOW_WRITE_NV.as_raw(),
);

/// True when `access` contains any kind of memory write.
pub fn has_write_access(access: vk::AccessFlags2) -> bool {
    access.intersects(WRITE_ACCESS)
}

/// The aspects covered by a whole-image barrier for the given format.
pub fn aspect_from_format(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM
        | vk::Format::X8_D24_UNORM_PACK32
        | vk::Format::D32_SFLOAT => vk::ImageAspectFlags::DEPTH,
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        vk::Format::S8_UINT => vk::ImageAspectFlags::STENCIL,
        _ => vk::ImageAspectFlags::COLOR,
    }
}
