//! The renderer core: suballocated GPU resources with tracked
//! synchronization state, command recording with automatic barriers,
//! materials, scene nodes and frame pacing on a timeline semaphore.

mod camera;
mod descriptor_set;
mod error;
mod lifetime_tracker;
mod lru_cache;
mod renderer;
mod resource_utils;

pub mod commands;
pub mod material;
pub mod resources;
pub mod scene;
pub mod vulkan_api;

pub use self::{
    camera::{ortho_projection, Camera, CameraUniforms},
    commands::{CommandRecorder, DeferredDeletion, Framebuffer, RecordingResult},
    descriptor_set::DescriptorSet,
    error::GraphicsError,
    lifetime_tracker::LifetimeTracker,
    lru_cache::LruCache,
    material::{Binding, BindingSlot, Material, MaterialPipeline, Pass},
    renderer::{DescriptorPoolLimits, Renderer, RendererConfig},
    resource_utils::{ResourceUtils, StagingConfig},
    resources::{BufferResource, ImageResource, ResourceAllocator, ResourceMap},
    scene::{Mesh, SceneNode},
};
