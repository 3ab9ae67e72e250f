use ash::vk;
use thiserror::Error;

use crate::graphics::vulkan_api::VulkanError;

#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error(transparent)]
    VulkanError(#[from] VulkanError),

    #[error(transparent)]
    UnexpectedVulkanError(#[from] vk::Result),

    #[error(
        "No memory type satisfies both the resource requirements {:#b} and the requested memory type bits {:#b}",
        .0,
        .1
    )]
    NoCompatibleMemoryType(u32, u32),

    #[error("Timed out or failed while waiting for frame {} to complete", .0)]
    FrameWaitFailed(u64),

    #[error("The command recorder was created for {:?} but consumed as {:?}", .0, .1)]
    PassMismatch(Option<crate::graphics::Pass>, Option<crate::graphics::Pass>),

    #[error(transparent)]
    RuntimeError(#[from] anyhow::Error),
}
