use ash::vk;
use thiserror::Error;

/// Failures reported by individual Vulkan device calls.
#[derive(Debug, Error)]
pub enum VulkanError {
    #[error("Unable to allocate {1} bytes of device memory from type {2}: {0:?}")]
    UnableToAllocateDeviceMemory(#[source] vk::Result, vk::DeviceSize, u32),

    #[error("Unable to map device memory {:?}", .0)]
    UnableToMapDeviceMemory(#[source] vk::Result),

    #[error("Unable to invalidate mapped device memory {:?}", .0)]
    UnableToInvalidateMappedMemory(#[source] vk::Result),

    #[error("Unable to flush mapped device memory {:?}", .0)]
    UnableToFlushMappedMemory(#[source] vk::Result),

    #[error("Unable to create a buffer {:?}", .0)]
    UnableToCreateBuffer(#[source] vk::Result),

    #[error("Unable to bind memory to a buffer {:?}", .0)]
    UnableToBindBufferMemory(#[source] vk::Result),

    #[error("Unable to create an image {:?}", .0)]
    UnableToCreateImage(#[source] vk::Result),

    #[error("Unable to bind memory to an image {:?}", .0)]
    UnableToBindImageMemory(#[source] vk::Result),

    #[error("Unable to create a buffer view {:?}", .0)]
    UnableToCreateBufferView(#[source] vk::Result),

    #[error("Unable to create an image view {:?}", .0)]
    UnableToCreateImageView(#[source] vk::Result),

    #[error("Unable to create a sampler {:?}", .0)]
    UnableToCreateSampler(#[source] vk::Result),

    #[error("Unable to create a descriptor set layout {:?}", .0)]
    UnableToCreateDescriptorSetLayout(#[source] vk::Result),

    #[error("Unable to create a pipeline layout {:?}", .0)]
    UnableToCreatePipelineLayout(#[source] vk::Result),

    #[error("Unable to create a descriptor pool {:?}", .0)]
    UnableToCreateDescriptorPool(#[source] vk::Result),

    #[error("Unable to allocate a descriptor set {:?}", .0)]
    UnableToAllocateDescriptorSet(#[source] vk::Result),

    #[error("Unable to create a command pool {:?}", .0)]
    UnableToCreateCommandPool(#[source] vk::Result),

    #[error("Unable to reset a command pool {:?}", .0)]
    UnableToResetCommandPool(#[source] vk::Result),

    #[error("Unable to allocate a command buffer {:?}", .0)]
    UnableToAllocateCommandBuffer(#[source] vk::Result),

    #[error("Unable to begin a command buffer {:?}", .0)]
    UnableToBeginCommandBuffer(#[source] vk::Result),

    #[error("Unable to end a command buffer {:?}", .0)]
    UnableToEndCommandBuffer(#[source] vk::Result),

    #[error("Unable to create a timeline semaphore {:?}", .0)]
    UnableToCreateSemaphore(#[source] vk::Result),

    #[error("Unable to read the counter of a timeline semaphore {:?}", .0)]
    UnableToGetSemaphoreCounterValue(#[source] vk::Result),

    #[error("Unexpected error while waiting on a timeline semaphore {:?}", .0)]
    UnexpectedSemaphoreWaitError(#[source] vk::Result),

    #[error("Unable to submit command buffers {:?}", .0)]
    UnableToSubmitCommandBuffers(#[source] vk::Result),

    #[error("Error while waiting for the device to idle {:?}", .0)]
    UnableToWaitForDeviceToIdle(#[source] vk::Result),
}
