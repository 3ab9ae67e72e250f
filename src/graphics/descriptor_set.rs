use {
    crate::graphics::{
        resources::{BufferResource, ImageResource, ImageViewParams, ResourceRef},
        vulkan_api::{raii, DescriptorInfo, DescriptorWrite},
        GraphicsError,
    },
    ash::vk,
    std::rc::Rc,
};

/// Everything a single binding keeps alive while the descriptor set
/// references it.
///
/// The view is declared first so it is released before the image it was
/// created from.
#[derive(Debug, Clone)]
struct BoundDescriptor {
    image_view: Option<Rc<raii::ImageView>>,
    sampler: Option<Rc<raii::Sampler>>,
    resource: ResourceRef,
}

/// A descriptor set which remembers what was last written to each binding.
///
/// The remembered resource is only replaced when a write is actually
/// produced, so comparing it with the resource which should be bound is
/// enough to skip redundant descriptor updates. Image views and samplers
/// referenced by the set are held too: the view caches on the resources
/// may evict a view while the set still points at it.
pub struct DescriptorSet {
    raw: vk::DescriptorSet,
    bound: Vec<BoundDescriptor>,
    _descriptor_pool: Rc<raii::DescriptorPool>,
}

impl DescriptorSet {
    /// Wrap a set allocated from `descriptor_pool`.
    ///
    /// `initial` gives the resource each binding starts out with. The
    /// caller is responsible for issuing matching writes.
    pub fn new(
        descriptor_pool: Rc<raii::DescriptorPool>,
        raw: vk::DescriptorSet,
        initial: Vec<ResourceRef>,
    ) -> Self {
        Self {
            raw,
            bound: initial
                .into_iter()
                .map(|resource| BoundDescriptor {
                    resource,
                    image_view: None,
                    sampler: None,
                })
                .collect(),
            _descriptor_pool: descriptor_pool,
        }
    }

    pub fn raw(&self) -> vk::DescriptorSet {
        self.raw
    }

    pub fn binding_count(&self) -> usize {
        self.bound.len()
    }

    /// The resource last written to `binding`.
    pub fn bound_resource(&self, binding: usize) -> &ResourceRef {
        &self.bound[binding].resource
    }

    /// True when `resource` is not what the binding currently refers to.
    pub fn is_dirty(&self, binding: usize, resource: &ResourceRef) -> bool {
        self.bound[binding].resource.id() != resource.id()
    }

    /// Every resource currently referenced by the set.
    pub fn bound_resources(&self) -> impl Iterator<Item = &ResourceRef> {
        self.bound.iter().map(|bound| &bound.resource)
    }

    /// Point `binding` at a range of a buffer.
    pub fn write_buffer(
        &mut self,
        binding: usize,
        descriptor_type: vk::DescriptorType,
        buffer: &Rc<BufferResource>,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    ) -> DescriptorWrite {
        self.bound[binding] = BoundDescriptor {
            resource: ResourceRef::Buffer(buffer.clone()),
            image_view: None,
            sampler: None,
        };
        DescriptorWrite {
            set: self.raw,
            binding: binding as u32,
            descriptor_type,
            info: DescriptorInfo::Buffer {
                buffer: buffer.raw(),
                offset,
                range,
            },
        }
    }

    /// Point `binding` at a view of an image combined with `sampler`.
    pub fn write_image(
        &mut self,
        binding: usize,
        descriptor_type: vk::DescriptorType,
        image: &Rc<ImageResource>,
        view_params: &ImageViewParams,
        layout: vk::ImageLayout,
        sampler: &Rc<raii::Sampler>,
    ) -> Result<DescriptorWrite, GraphicsError> {
        let view = image.view(view_params)?;
        let write = DescriptorWrite {
            set: self.raw,
            binding: binding as u32,
            descriptor_type,
            info: DescriptorInfo::Image {
                view: view.raw(),
                sampler: sampler.raw(),
                layout,
            },
        };
        self.bound[binding] = BoundDescriptor {
            resource: ResourceRef::Image(image.clone()),
            image_view: Some(view),
            sampler: Some(sampler.clone()),
        };
        Ok(write)
    }
}

impl std::fmt::Debug for DescriptorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSet")
            .field("raw", &self.raw)
            .field(
                "bound",
                &self
                    .bound
                    .iter()
                    .map(|bound| bound.resource.id())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::{
        resources::ResourceAllocator,
        vulkan_api::{
            render_device::fake_device::FakeDevice, BufferCreateParams,
            HeapConfig, ImageCreateParams, SamplerParams,
        },
    };
    use std::sync::Arc;

    fn buffer(allocator: &Arc<ResourceAllocator>) -> Rc<BufferResource> {
        allocator
            .alloc_buffer(
                &BufferCreateParams {
                    size: 128,
                    usage: vk::BufferUsageFlags::STORAGE_BUFFER,
                },
                !0,
            )
            .unwrap()
    }

    fn descriptor_set(
        device: &Arc<FakeDevice>,
        initial: Vec<ResourceRef>,
    ) -> DescriptorSet {
        let pool = Rc::new(unsafe {
            raii::DescriptorPool::new(device.clone(), 1, &[]).unwrap()
        });
        let raw = unsafe {
            raii::DescriptorSetLayout::new(device.clone(), &[])
                .and_then(|layout| pool.allocate(&layout))
                .unwrap()
        };
        DescriptorSet::new(pool, raw, initial)
    }

    #[test]
    fn writes_only_change_the_bound_resource_when_issued() {
        let device = FakeDevice::new();
        let allocator =
            ResourceAllocator::new(device.clone(), HeapConfig::default());
        let default = buffer(&allocator);
        let other = buffer(&allocator);
        let mut set = descriptor_set(
            &device,
            vec![default.clone().into(), default.clone().into()],
        );

        let other_ref = ResourceRef::from(other.clone());
        assert!(!set.is_dirty(0, &default.clone().into()));
        assert!(set.is_dirty(1, &other_ref));

        let write = set.write_buffer(
            1,
            vk::DescriptorType::STORAGE_BUFFER,
            &other,
            0,
            vk::WHOLE_SIZE,
        );
        assert_eq!(write.binding, 1);
        assert_eq!(write.set, set.raw());

        // a second check against the same resource is clean
        assert!(!set.is_dirty(1, &other_ref));
        assert_eq!(set.bound_resource(1).id(), other.id());
        assert_eq!(set.bound_resource(0).id(), default.id());
    }

    #[test]
    fn image_writes_keep_the_view_alive() {
        let device = FakeDevice::new();
        let allocator =
            ResourceAllocator::new(device.clone(), HeapConfig::default());
        let image = allocator
            .alloc_image(&ImageCreateParams::default(), !0)
            .unwrap();
        let sampler = Rc::new(unsafe {
            raii::Sampler::new(device.clone(), &SamplerParams::default())
                .unwrap()
        });
        let mut set = descriptor_set(&device, vec![image.clone().into()]);

        set.write_image(
            0,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            &image,
            &ImageViewParams::default(),
            vk::ImageLayout::READ_ONLY_OPTIMAL,
            &sampler,
        )
        .unwrap();
        drop(sampler);
        drop(image);

        assert_eq!(device.live_image_views(), 1);
        assert_eq!(device.live_samplers(), 1);
        drop(set);
        assert_eq!(device.live_image_views(), 0);
        assert_eq!(device.live_samplers(), 0);
        assert_eq!(device.live_images(), 0);
    }
}
