//! Materials: a pipeline plus the resources its shaders read and write.
//!
//! A material names its resources indirectly through [ResourceMap] slots.
//! Every frame in flight has its own descriptor set, which is rewritten
//! lazily when the resource in a referenced slot changes.

mod binding;

use {
    crate::graphics::{
        descriptor_set::DescriptorSet,
        resources::{BufferResource, ImageResource, ResourceMap, ResourceRef},
        vulkan_api::{raii, GpuDevice},
        GraphicsError,
    },
    ash::vk,
    std::{
        cell::{Ref, RefCell},
        rc::Rc,
        sync::Arc,
    },
};

pub use self::binding::{
    Binding, BindingSlot, BufferBinding, ImageBinding, BINDING_SLOT_COUNT,
    BUFFER_BINDING_COUNT, TEXTURE_BINDING_COUNT,
};

/// The number of render passes a frame is made of.
pub const NUM_PASSES: usize = 1;

/// A render pass within a frame. Every pass is recorded into its own
/// command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Base = 0,
}

impl Pass {
    pub const ALL: [Pass; NUM_PASSES] = [Pass::Base];

    pub fn index(self) -> usize {
        self as usize
    }

    /// This pass's bit in a material pass mask.
    pub fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// The pipelines of a material, one per pass. A material is either
/// graphics or compute, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialPipeline {
    Graphics([Option<vk::Pipeline>; NUM_PASSES]),
    Compute([Option<vk::Pipeline>; NUM_PASSES]),
}

impl MaterialPipeline {
    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        match self {
            Self::Graphics(_) => vk::PipelineBindPoint::GRAPHICS,
            Self::Compute(_) => vk::PipelineBindPoint::COMPUTE,
        }
    }

    /// The stages where the material's shaders access bound resources.
    pub fn shader_stages(&self) -> vk::PipelineStageFlags2 {
        match self {
            Self::Graphics(_) => {
                vk::PipelineStageFlags2::VERTEX_SHADER
                    | vk::PipelineStageFlags2::FRAGMENT_SHADER
            }
            Self::Compute(_) => vk::PipelineStageFlags2::COMPUTE_SHADER,
        }
    }

    pub fn pipeline(&self, pass: Pass) -> Option<vk::Pipeline> {
        match self {
            Self::Graphics(pipelines) | Self::Compute(pipelines) => {
                pipelines[pass.index()]
            }
        }
    }
}

/// The state a material needs a resource to be in before its shaders run.
/// The command recorder turns these into barriers.
#[derive(Debug, Clone)]
pub enum ProtoBarrier {
    Buffer {
        buffer: Rc<BufferResource>,
        access: vk::AccessFlags2,
        stages: vk::PipelineStageFlags2,
    },
    Image {
        image: Rc<ImageResource>,
        access: vk::AccessFlags2,
        stages: vk::PipelineStageFlags2,
        layout: vk::ImageLayout,
    },
}

pub struct Material {
    pipeline: MaterialPipeline,
    pass_mask: u32,
    binding_mask: u16,
    bindings: Vec<Binding>,
    descriptor_sets: Vec<RefCell<DescriptorSet>>,
    default_sampler: Rc<raii::Sampler>,
    device: Arc<dyn GpuDevice>,
}

impl Material {
    /// Create a material with no active bindings.
    ///
    /// Every pass in `pass_mask` must have a pipeline. `descriptor_sets`
    /// holds one set per frame in flight.
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        pipeline: MaterialPipeline,
        pass_mask: u32,
        descriptor_sets: Vec<DescriptorSet>,
        default_sampler: Rc<raii::Sampler>,
    ) -> Self {
        assert!(pass_mask != 0, "a material must live in at least one pass");
        for pass in Pass::ALL {
            if pass_mask & pass.bit() != 0 {
                assert!(
                    pipeline.pipeline(pass).is_some(),
                    "material lives in {:?} but has no pipeline for it",
                    pass
                );
            }
        }
        Self {
            pipeline,
            pass_mask,
            binding_mask: 0,
            bindings: BindingSlot::ALL
                .iter()
                .map(|&slot| Binding::default_for(slot))
                .collect(),
            descriptor_sets: descriptor_sets
                .into_iter()
                .map(RefCell::new)
                .collect(),
            default_sampler,
            device,
        }
    }

    pub fn pipeline(&self) -> &MaterialPipeline {
        &self.pipeline
    }

    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        self.pipeline.bind_point()
    }

    pub fn is_graphics(&self) -> bool {
        matches!(self.pipeline, MaterialPipeline::Graphics(_))
    }

    pub fn pass_mask(&self) -> u32 {
        self.pass_mask
    }

    pub fn lives_in_pass(&self, pass: Pass) -> bool {
        self.pass_mask & pass.bit() != 0
    }

    pub fn binding_mask(&self) -> u16 {
        self.binding_mask
    }

    /// The binding in `slot`, if the slot is active.
    pub fn binding(&self, slot: BindingSlot) -> Option<&Binding> {
        if self.binding_mask & slot.bit() != 0 {
            Some(&self.bindings[slot.index()])
        } else {
            None
        }
    }

    /// Activate `slot` with the given binding.
    pub fn set_binding(&mut self, slot: BindingSlot, binding: Binding) {
        assert!(
            binding.fits(slot),
            "{:?} cannot hold binding {:?}",
            slot,
            binding
        );
        self.bindings[slot.index()] = binding;
        self.binding_mask |= slot.bit();
    }

    pub fn clear_binding(&mut self, slot: BindingSlot) {
        self.bindings[slot.index()] = Binding::default_for(slot);
        self.binding_mask &= !slot.bit();
    }

    pub fn frames_in_flight(&self) -> usize {
        self.descriptor_sets.len()
    }

    pub fn descriptor_set(&self, frame_slot: usize) -> Ref<'_, DescriptorSet> {
        self.descriptor_sets[frame_slot].borrow()
    }

    /// The resources referenced by the active bindings of a frame's
    /// descriptor set.
    pub fn bound_resources(&self, frame_slot: usize) -> Vec<ResourceRef> {
        let set = self.descriptor_set(frame_slot);
        BindingSlot::ALL
            .iter()
            .filter(|slot| self.binding_mask & slot.bit() != 0)
            .map(|slot| set.bound_resource(slot.index()).clone())
            .collect()
    }

    /// Bring a frame's descriptor set up to date with the resource map.
    ///
    /// Only bindings whose resource changed since the last write are
    /// rewritten. A barrier request is returned for every active binding,
    /// dirty or not.
    pub fn update_descriptor_set(
        &self,
        frame_slot: usize,
        resource_map: &ResourceMap,
    ) -> Result<Vec<ProtoBarrier>, GraphicsError> {
        let mut set = self.descriptor_sets[frame_slot].borrow_mut();
        let stages = self.pipeline.shader_stages();

        let mut writes = vec![];
        let mut barriers = vec![];
        for slot in BindingSlot::ALL {
            if self.binding_mask & slot.bit() == 0 {
                continue;
            }
            let binding = &self.bindings[slot.index()];
            let resource = resource_map.get(binding.resource_map_slot());
            let dirty = set.is_dirty(slot.index(), resource);

            match binding {
                Binding::Buffer(buffer_binding) => {
                    let Some(buffer) = resource.as_buffer() else {
                        panic!(
                            "{:?} needs a buffer but resource map slot {} holds an image",
                            slot, buffer_binding.resource_map_slot
                        );
                    };
                    if dirty {
                        writes.push(set.write_buffer(
                            slot.index(),
                            slot.descriptor_type(),
                            buffer,
                            buffer_binding.offset,
                            buffer_binding.range(),
                        ));
                    }
                    barriers.push(ProtoBarrier::Buffer {
                        buffer: buffer.clone(),
                        access: slot.access(),
                        stages,
                    });
                }
                Binding::Image(image_binding) => {
                    let Some(image) = resource.as_image() else {
                        panic!(
                            "{:?} needs an image but resource map slot {} holds a buffer",
                            slot, image_binding.resource_map_slot
                        );
                    };
                    if dirty {
                        let sampler = image_binding
                            .sampler
                            .as_ref()
                            .unwrap_or(&self.default_sampler);
                        writes.push(set.write_image(
                            slot.index(),
                            slot.descriptor_type(),
                            image,
                            &image_binding.view,
                            image_binding.layout,
                            sampler,
                        )?);
                    }
                    barriers.push(ProtoBarrier::Image {
                        image: image.clone(),
                        access: slot.access(),
                        stages,
                        layout: image_binding.layout,
                    });
                }
            }
        }

        if !writes.is_empty() {
            log::trace!(
                "Writing {} material descriptors for frame slot {}",
                writes.len(),
                frame_slot
            );
            unsafe { self.device.update_descriptor_sets(&writes) };
        }
        Ok(barriers)
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("pipeline", &self.pipeline)
            .field("pass_mask", &format_args!("{:#b}", self.pass_mask))
            .field("binding_mask", &format_args!("{:#018b}", self.binding_mask))
            .finish()
    }
}
