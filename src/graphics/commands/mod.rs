//! Command recording with automatic barrier placement.

mod barrier_batch;
mod command_recorder;
mod deferred_deletion;
mod framebuffer;

pub use self::{
    barrier_batch::{BarrierBatch, BatchState, MAX_BARRIERS},
    command_recorder::{
        CommandRecorder, RecordingResult, CAMERA_SET_INDEX,
        MATERIAL_SET_INDEX, SCENE_NODE_SET_INDEX,
    },
    deferred_deletion::DeferredDeletion,
    framebuffer::{Attachment, Framebuffer, MAX_COLOR_ATTACHMENTS},
};
