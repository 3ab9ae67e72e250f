//! Frame pacing and the per-frame resources every recorder draws from.

mod config;

use {
    crate::graphics::{
        camera::{Camera, CameraUniforms},
        commands::{
            CommandRecorder, DeferredDeletion, RecordingResult, CAMERA_SET_INDEX,
        },
        descriptor_set::DescriptorSet,
        lifetime_tracker::LifetimeTracker,
        lru_cache::LruCache,
        material::{Binding, BindingSlot, Material, MaterialPipeline, Pass, NUM_PASSES},
        resource_utils::{ResourceUtils, StagingConfig},
        resources::{
            BufferResource, ImageResource, ResourceAllocator, ResourceMap,
            ResourceRef,
        },
        scene::{Mesh, SceneNode},
        vulkan_api::{
            raii, BufferCreateParams, DescriptorBindingDesc, GpuDevice,
            ImageCreateParams, SamplerParams, TimelinePoint,
        },
        GraphicsError,
    },
    anyhow::Context,
    ash::vk,
    std::{cell::RefCell, rc::Rc, sync::Arc},
};

pub use self::config::{DescriptorPoolLimits, RendererConfig};

/// Owns the frame timeline and everything recorders allocate from.
///
/// A frame goes through:
///
///   1. [Self::begin_frame] waits until the frame which last used this
///      frame slot is done, then records the camera upload.
///   2. Recorders from [Self::create_command_recorder] are filled and handed
///      back with [Self::consume_as_transfer] or [Self::consume_as_pass].
///   3. [Self::submit_frame] submits everything and signals the timeline
///      with the frame number.
///   4. [Self::end_frame] releases resources the GPU is done with and
///      advances to the next frame.
pub struct Renderer {
    current_frame: u64,
    frames_in_flight: usize,

    setup_commands: Option<vk::CommandBuffer>,
    transfer_commands: Vec<vk::CommandBuffer>,
    pass_commands: [Option<vk::CommandBuffer>; NUM_PASSES],

    lifetime_tracker: LifetimeTracker<DeferredDeletion>,
    sampler_cache: LruCache<SamplerParams, raii::Sampler>,
    resource_map: Rc<RefCell<ResourceMap>>,

    camera_buffer: Rc<BufferResource>,
    camera_set: DescriptorSet,

    pipeline_layout: raii::PipelineLayout,
    material_layout: raii::DescriptorSetLayout,
    scene_node_layout: raii::DescriptorSetLayout,
    _camera_layout: raii::DescriptorSetLayout,
    _empty_layout: raii::DescriptorSetLayout,

    descriptor_pools: Vec<Rc<raii::DescriptorPool>>,
    command_pools: Vec<raii::CommandPool>,
    timeline: raii::TimelineSemaphore,

    allocator: Arc<ResourceAllocator>,
    device: Arc<dyn GpuDevice>,
}

impl Renderer {
    /// Create the renderer's per-frame pools, descriptor layouts and default
    /// resources.
    ///
    /// Dropping the renderer waits for the device to go idle, so nothing it
    /// owns is destroyed while still in use by the GPU.
    pub fn new(
        device: Arc<dyn GpuDevice>,
        allocator: Arc<ResourceAllocator>,
        config: RendererConfig,
    ) -> Result<Self, GraphicsError> {
        assert!(
            config.frames_in_flight > 0,
            "the renderer needs at least one frame in flight"
        );

        let timeline = unsafe { raii::TimelineSemaphore::new(device.clone(), 0) }
            .context("Unable to create the frame timeline semaphore")?;
        timeline.set_debug_name("frame timeline");

        let limits = &config.descriptor_pool_limits;
        let pool_sizes = limits.pool_sizes();
        let mut command_pools = vec![];
        let mut descriptor_pools = vec![];
        for slot in 0..config.frames_in_flight {
            let command_pool = unsafe { raii::CommandPool::new(device.clone()) }
                .with_context(|| {
                    format!("Unable to create the command pool for frame slot {}", slot)
                })?;
            command_pool.set_debug_name(format!("frame slot {} commands", slot));
            command_pools.push(command_pool);

            let descriptor_pool = unsafe {
                raii::DescriptorPool::new(device.clone(), limits.max_sets, &pool_sizes)
            }
            .with_context(|| {
                format!("Unable to create the descriptor pool for frame slot {}", slot)
            })?;
            descriptor_pool.set_debug_name(format!("frame slot {} descriptors", slot));
            descriptor_pools.push(Rc::new(descriptor_pool));
        }

        let uniform_block = DescriptorBindingDesc {
            binding: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            stage_flags: vk::ShaderStageFlags::VERTEX,
        };
        let material_bindings: Vec<DescriptorBindingDesc> = BindingSlot::ALL
            .iter()
            .map(|slot| DescriptorBindingDesc {
                binding: slot.index() as u32,
                descriptor_type: slot.descriptor_type(),
                stage_flags: vk::ShaderStageFlags::VERTEX
                    | vk::ShaderStageFlags::FRAGMENT
                    | vk::ShaderStageFlags::COMPUTE,
            })
            .collect();
        let (empty_layout, camera_layout, scene_node_layout, material_layout) = unsafe {
            (
                raii::DescriptorSetLayout::new(device.clone(), &[])
                    .context("Unable to create the empty descriptor set layout")?,
                raii::DescriptorSetLayout::new(device.clone(), &[uniform_block])
                    .context("Unable to create the camera descriptor set layout")?,
                raii::DescriptorSetLayout::new(device.clone(), &[uniform_block])
                    .context("Unable to create the scene node descriptor set layout")?,
                raii::DescriptorSetLayout::new(device.clone(), &material_bindings)
                    .context("Unable to create the material descriptor set layout")?,
            )
        };
        let pipeline_layout = unsafe {
            raii::PipelineLayout::new(
                device.clone(),
                &[&empty_layout, &camera_layout, &scene_node_layout, &material_layout],
            )
        }
        .context("Unable to create the material pipeline layout")?;

        let default_buffer = allocator
            .alloc_buffer(
                &BufferCreateParams {
                    size: 64,
                    usage: vk::BufferUsageFlags::STORAGE_BUFFER,
                },
                config.default_resource_memory_type_bits,
            )
            .context("Unable to allocate the default buffer")?;
        default_buffer.set_debug_name("default buffer");
        let default_image = allocator
            .alloc_image(
                &ImageCreateParams {
                    format: vk::Format::R8_UNORM,
                    extent: vk::Extent3D {
                        width: 2,
                        height: 2,
                        depth: 1,
                    },
                    tiling: vk::ImageTiling::LINEAR,
                    ..ImageCreateParams::default()
                },
                config.default_resource_memory_type_bits,
            )
            .context("Unable to allocate the default image")?;
        default_image.set_debug_name("default image");

        let camera_buffer = allocator
            .alloc_buffer(
                &BufferCreateParams {
                    size: CameraUniforms::SIZE,
                    usage: vk::BufferUsageFlags::UNIFORM_BUFFER
                        | vk::BufferUsageFlags::TRANSFER_DST,
                },
                allocator.memory_properties().device_local_bits(),
            )
            .context("Unable to allocate the camera uniform buffer")?;
        camera_buffer.set_debug_name("camera uniforms");

        // camera and scene node sets live as long as the renderer, so they
        // all come from the first pool
        let camera_set = {
            let pool = &descriptor_pools[0];
            let raw = pool
                .allocate(&camera_layout)
                .context("Unable to allocate the camera descriptor set")?;
            let mut set =
                DescriptorSet::new(pool.clone(), raw, vec![camera_buffer.clone().into()]);
            let write = set.write_buffer(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                &camera_buffer,
                0,
                CameraUniforms::SIZE,
            );
            unsafe { device.update_descriptor_sets(&[write]) };
            set
        };

        log::info!(
            "Created renderer with {} frames in flight\n{:#?}",
            config.frames_in_flight,
            config.descriptor_pool_limits
        );

        Ok(Self {
            current_frame: 1,
            frames_in_flight: config.frames_in_flight,
            setup_commands: None,
            transfer_commands: vec![],
            pass_commands: [None; NUM_PASSES],
            lifetime_tracker: LifetimeTracker::new(device.clone()),
            sampler_cache: LruCache::new(limits.samplers.max(1) as usize),
            resource_map: Rc::new(RefCell::new(ResourceMap::new(
                default_buffer,
                default_image,
            ))),
            camera_buffer,
            camera_set,
            pipeline_layout,
            material_layout,
            scene_node_layout,
            _camera_layout: camera_layout,
            _empty_layout: empty_layout,
            descriptor_pools,
            command_pools,
            timeline,
            allocator,
            device,
        })
    }

    /// The value the timeline is signaled with once this frame completes.
    /// Starts at 1.
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Which set of per-frame pools the current frame records with.
    pub fn current_frame_slot(&self) -> usize {
        (self.current_frame % self.frames_in_flight as u64) as usize
    }

    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    /// The layout every material pipeline must be created with.
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout.raw()
    }

    pub fn resource_map(&self) -> &Rc<RefCell<ResourceMap>> {
        &self.resource_map
    }

    pub fn default_buffer(&self) -> Rc<BufferResource> {
        self.resource_map.borrow().default_buffer().clone()
    }

    pub fn default_image(&self) -> Rc<ImageResource> {
        self.resource_map.borrow().default_image().clone()
    }

    pub fn allocator(&self) -> &Arc<ResourceAllocator> {
        &self.allocator
    }

    // Frames

    /// Start recording a frame.
    ///
    /// Blocks until the GPU finishes the frame recorded `frames_in_flight`
    /// frames ago, because this frame reuses its command pool. Then records
    /// the camera uniform upload which is submitted ahead of everything
    /// else in the frame.
    pub fn begin_frame(&mut self, camera: &Camera) -> Result<(), GraphicsError> {
        let frames = self.frames_in_flight as u64;
        if self.current_frame > frames {
            let previous_use = self.current_frame - frames;
            log::debug!(
                "Frame {} waiting for frame {}",
                self.current_frame,
                previous_use
            );
            self.block_for_frame(previous_use)?;
        }

        let slot = self.current_frame_slot();
        unsafe { self.command_pools[slot].reset() }.with_context(|| {
            format!("Unable to reset the command pool for frame slot {}", slot)
        })?;

        let mut recorder = self.create_command_recorder(None)?;
        self.bind_camera(recorder.command_buffer());
        recorder.update_buffer(&self.camera_buffer, 0, &camera.uniforms().to_bytes());
        recorder.push_buffer_barrier(
            &self.camera_buffer,
            vk::AccessFlags2::UNIFORM_READ,
            vk::PipelineStageFlags2::VERTEX_SHADER,
        );
        let RecordingResult {
            command_buffer,
            deferred_deletion,
        } = recorder.end()?;
        self.setup_commands = Some(command_buffer);
        self.latch(deferred_deletion);
        Ok(())
    }

    /// Create a recorder for the current frame. Recorders for a pass start
    /// with the camera descriptor set bound.
    pub fn create_command_recorder(
        &self,
        pass: Option<Pass>,
    ) -> Result<CommandRecorder, GraphicsError> {
        let slot = self.current_frame_slot();
        let command_buffer = self.command_pools[slot].begin_command_buffer()?;
        if pass.is_some() {
            self.bind_camera(command_buffer);
        }
        Ok(CommandRecorder::new(
            self.device.clone(),
            command_buffer,
            slot,
            pass,
            self.pipeline_layout.raw(),
            self.resource_map.clone(),
        ))
    }

    /// A recorder with a staging arena for uploads in the current frame.
    pub fn create_resource_utils(
        &self,
        config: StagingConfig,
    ) -> Result<ResourceUtils, GraphicsError> {
        let recorder = self.create_command_recorder(None)?;
        ResourceUtils::new(&self.allocator, recorder, config)
    }

    /// End a recorder holding transfer work. Transfers are submitted after
    /// the frame setup and before every pass, in the order consumed.
    pub fn consume_as_transfer(
        &mut self,
        recorder: CommandRecorder,
    ) -> Result<(), GraphicsError> {
        if recorder.pass().is_some() {
            return Err(GraphicsError::PassMismatch(recorder.pass(), None));
        }
        let result = recorder.end()?;
        self.transfer_commands.push(result.command_buffer);
        self.latch(result.deferred_deletion);
        Ok(())
    }

    /// End the recorder holding `pass`. Each pass is consumed at most once
    /// per frame.
    pub fn consume_as_pass(
        &mut self,
        pass: Pass,
        recorder: CommandRecorder,
    ) -> Result<(), GraphicsError> {
        if recorder.pass() != Some(pass) {
            return Err(GraphicsError::PassMismatch(recorder.pass(), Some(pass)));
        }
        assert!(
            self.pass_commands[pass.index()].is_none(),
            "{:?} was already consumed in frame {}",
            pass,
            self.current_frame
        );
        let result = recorder.end()?;
        self.pass_commands[pass.index()] = Some(result.command_buffer);
        self.latch(result.deferred_deletion);
        Ok(())
    }

    /// Submit the frame's setup, transfer and pass command buffers in that
    /// order.
    ///
    /// # Returns
    ///
    /// The timeline point signaled once the frame completes.
    pub fn submit_frame(
        &mut self,
        signal_stages: vk::PipelineStageFlags2,
    ) -> Result<TimelinePoint, GraphicsError> {
        let Some(setup) = self.setup_commands.take() else {
            panic!("frame {} was never begun", self.current_frame);
        };
        let mut command_buffers = vec![setup];
        command_buffers.append(&mut self.transfer_commands);
        command_buffers.extend(self.pass_commands.iter_mut().filter_map(Option::take));

        let signal = self.timeline.point(self.current_frame);
        unsafe {
            self.device
                .submit(&command_buffers, signal, signal_stages)?;
        }
        log::trace!(
            "Submitted frame {} with {} command buffers",
            self.current_frame,
            command_buffers.len()
        );
        Ok(signal)
    }

    /// Release what finished frames kept alive and advance the frame
    /// counter.
    pub fn end_frame(&mut self) -> Result<(), GraphicsError> {
        self.lifetime_tracker.poll()?;
        self.current_frame += 1;
        Ok(())
    }

    /// Block until the current frame completes. Call before
    /// [Self::end_frame].
    pub fn block_for_current_frame(&self) -> Result<(), GraphicsError> {
        self.block_for_frame(self.current_frame)
    }

    /// Block until the previous frame completes. Call before
    /// [Self::end_frame].
    pub fn block_for_prev_frame(&self) -> Result<(), GraphicsError> {
        if self.current_frame <= 1 {
            return Ok(());
        }
        self.block_for_frame(self.current_frame - 1)
    }

    fn block_for_frame(&self, frame: u64) -> Result<(), GraphicsError> {
        if self.timeline.wait(frame, u64::MAX)? {
            Ok(())
        } else {
            Err(GraphicsError::FrameWaitFailed(frame))
        }
    }

    fn bind_camera(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.raw(),
                CAMERA_SET_INDEX,
                &[self.camera_set.raw()],
            );
        }
    }

    fn latch(&mut self, bundle: DeferredDeletion) {
        let point = self.timeline.point(self.current_frame);
        self.lifetime_tracker.latch(point, bundle);
    }

    // Objects

    /// A sampler with the given parameters, shared with every other user of
    /// the same parameters while it stays cached.
    pub fn get_sampler(
        &mut self,
        params: &SamplerParams,
    ) -> Result<Rc<raii::Sampler>, GraphicsError> {
        let device = self.device.clone();
        let sampler = self
            .sampler_cache
            .get_or_try_insert_with(*params, || unsafe {
                raii::Sampler::new(device, params)
            })?;
        Ok(sampler)
    }

    /// Create a graphics material. `pipelines` holds the pipeline for each
    /// pass in `pass_mask`, created with [Self::pipeline_layout].
    pub fn create_gfx_material(
        &mut self,
        pass_mask: u32,
        pipelines: [Option<vk::Pipeline>; NUM_PASSES],
    ) -> Result<Material, GraphicsError> {
        self.create_material(MaterialPipeline::Graphics(pipelines), pass_mask)
    }

    /// Create a compute material. `pipelines` holds the pipeline for each
    /// pass in `pass_mask`, created with [Self::pipeline_layout].
    pub fn create_compute_material(
        &mut self,
        pass_mask: u32,
        pipelines: [Option<vk::Pipeline>; NUM_PASSES],
    ) -> Result<Material, GraphicsError> {
        self.create_material(MaterialPipeline::Compute(pipelines), pass_mask)
    }

    fn create_material(
        &mut self,
        pipeline: MaterialPipeline,
        pass_mask: u32,
    ) -> Result<Material, GraphicsError> {
        let default_sampler = self.get_sampler(&SamplerParams::default())?;
        let default_buffer = self.default_buffer();
        let default_image = self.default_image();

        let mut writes = vec![];
        let mut descriptor_sets = vec![];
        for pool in &self.descriptor_pools {
            let raw = pool
                .allocate(&self.material_layout)
                .context("Unable to allocate a material descriptor set")?;
            let initial: Vec<ResourceRef> = BindingSlot::ALL
                .iter()
                .map(|slot| match slot.is_texture() {
                    true => default_image.clone().into(),
                    false => default_buffer.clone().into(),
                })
                .collect();
            let mut set = DescriptorSet::new(pool.clone(), raw, initial);
            for slot in BindingSlot::ALL {
                let write = match Binding::default_for(slot) {
                    Binding::Buffer(binding) => set.write_buffer(
                        slot.index(),
                        slot.descriptor_type(),
                        &default_buffer,
                        binding.offset,
                        binding.range(),
                    ),
                    Binding::Image(binding) => set.write_image(
                        slot.index(),
                        slot.descriptor_type(),
                        &default_image,
                        &binding.view,
                        binding.layout,
                        &default_sampler,
                    )?,
                };
                writes.push(write);
            }
            descriptor_sets.push(set);
        }
        unsafe { self.device.update_descriptor_sets(&writes) };

        Ok(Material::new(
            self.device.clone(),
            pipeline,
            pass_mask,
            descriptor_sets,
            default_sampler,
        ))
    }

    /// Create a node drawing `mesh` with an identity world matrix.
    pub fn create_scene_node(
        &self,
        mesh: Rc<Mesh>,
    ) -> Result<SceneNode, GraphicsError> {
        let uniform_buffer = self
            .allocator
            .alloc_buffer(
                &BufferCreateParams {
                    size: SceneNode::UNIFORM_SIZE,
                    usage: vk::BufferUsageFlags::UNIFORM_BUFFER
                        | vk::BufferUsageFlags::TRANSFER_DST,
                },
                self.allocator.memory_properties().device_local_bits(),
            )
            .context("Unable to allocate a scene node uniform buffer")?;

        let pool = &self.descriptor_pools[0];
        let raw = pool
            .allocate(&self.scene_node_layout)
            .context("Unable to allocate a scene node descriptor set")?;
        let mut set =
            DescriptorSet::new(pool.clone(), raw, vec![uniform_buffer.clone().into()]);
        let write = set.write_buffer(
            0,
            vk::DescriptorType::UNIFORM_BUFFER,
            &uniform_buffer,
            0,
            SceneNode::UNIFORM_SIZE,
        );
        unsafe { self.device.update_descriptor_sets(&[write]) };

        Ok(SceneNode::new(mesh, uniform_buffer, set))
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(error) = self.device.wait_idle() {
            log::error!("Unable to wait for the device to go idle: {}", error);
        }
        self.lifetime_tracker.drain();
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("current_frame", &self.current_frame)
            .field("frames_in_flight", &self.frames_in_flight)
            .field("pending_bundles", &self.lifetime_tracker.pending())
            .field("cached_samplers", &self.sampler_cache.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphics::{
        commands::MATERIAL_SET_INDEX,
        material::BINDING_SLOT_COUNT,
        vulkan_api::{
            render_device::fake_device::{Command, FakeDevice},
            HeapConfig,
        },
    };
    use ash::vk::Handle;

    fn renderer(device: &Arc<FakeDevice>) -> (Arc<ResourceAllocator>, Renderer) {
        let allocator = ResourceAllocator::new(device.clone(), HeapConfig::default());
        let renderer = Renderer::new(
            device.clone(),
            allocator.clone(),
            RendererConfig::default(),
        )
        .unwrap();
        (allocator, renderer)
    }

    fn buffer(
        allocator: &Arc<ResourceAllocator>,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
    ) -> Rc<BufferResource> {
        allocator
            .alloc_buffer(&BufferCreateParams { size, usage }, !0)
            .unwrap()
    }

    #[test]
    fn frames_cycle_through_the_slots() {
        let device = FakeDevice::new();
        let (_allocator, mut renderer) = renderer(&device);
        assert_eq!(renderer.current_frame(), 1);

        let mut slots = vec![];
        for _ in 0..4 {
            renderer.begin_frame(&Camera::default()).unwrap();
            slots.push(renderer.current_frame_slot());
            renderer.submit_frame(vk::PipelineStageFlags2::ALL_COMMANDS).unwrap();
            renderer.block_for_current_frame().unwrap();
            renderer.end_frame().unwrap();
        }
        assert_eq!(slots, vec![1, 2, 0, 1]);
        assert_eq!(renderer.current_frame(), 5);
    }

    #[test]
    fn a_frame_slot_is_reused_only_after_its_last_frame_completes() {
        let device = FakeDevice::new();
        device.set_execute_on_submit(false);
        let (_allocator, mut renderer) = renderer(&device);

        for _ in 0..3 {
            renderer.begin_frame(&Camera::default()).unwrap();
            renderer.submit_frame(vk::PipelineStageFlags2::ALL_COMMANDS).unwrap();
            renderer.end_frame().unwrap();
        }
        assert!(matches!(
            renderer.begin_frame(&Camera::default()),
            Err(GraphicsError::FrameWaitFailed(1))
        ));
        assert!(matches!(
            renderer.block_for_prev_frame(),
            Err(GraphicsError::FrameWaitFailed(3))
        ));
    }

    #[test]
    fn the_first_frame_has_no_previous_frame_to_wait_for() {
        let device = FakeDevice::new();
        device.set_execute_on_submit(false);
        let (_allocator, renderer) = renderer(&device);
        assert!(renderer.block_for_prev_frame().is_ok());
    }

    #[test]
    fn staged_upload_reaches_a_device_local_buffer() {
        let device = FakeDevice::new();
        let (allocator, mut renderer) = renderer(&device);
        let dst = allocator
            .alloc_buffer(
                &BufferCreateParams {
                    size: 1024,
                    usage: vk::BufferUsageFlags::STORAGE_BUFFER
                        | vk::BufferUsageFlags::TRANSFER_DST,
                },
                allocator.memory_properties().device_local_bits(),
            )
            .unwrap();
        let bytes: Vec<u8> = (0..=255).collect();

        renderer.begin_frame(&Camera::default()).unwrap();
        let mut utils = renderer
            .create_resource_utils(StagingConfig {
                size: 4096,
                alignment: 64,
            })
            .unwrap();
        assert!(utils.upload_buffer_data(&dst, 0, &bytes).unwrap());
        let staging = utils.staging_buffer().clone();
        let recorder = utils.into_recorder();

        let commands = device.commands(recorder.command_buffer());
        assert_eq!(commands.len(), 2);
        let Command::PipelineBarrier { buffers, images } = &commands[0] else {
            panic!("expected the staging barrier, got {:?}", commands[0]);
        };
        assert!(images.is_empty());
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].buffer, staging.raw());
        assert_eq!(buffers[0].src_access, vk::AccessFlags2::HOST_WRITE);
        assert_eq!(buffers[0].dst_access, vk::AccessFlags2::TRANSFER_READ);
        assert!(matches!(
            &commands[1],
            Command::CopyBuffer { dst: copied_to, .. } if *copied_to == dst.raw()
        ));
        drop(staging);

        renderer.consume_as_transfer(recorder).unwrap();
        let signal = renderer
            .submit_frame(vk::PipelineStageFlags2::ALL_COMMANDS)
            .unwrap();
        assert_eq!(signal.value, 1);
        renderer.block_for_current_frame().unwrap();

        assert_eq!(device.read_buffer(dst.raw(), 256), bytes);
        renderer.end_frame().unwrap();
    }

    #[test]
    fn recorded_resources_live_until_their_frame_completes() {
        let device = FakeDevice::new();
        device.set_execute_on_submit(false);
        let (allocator, mut renderer) = renderer(&device);
        let baseline = device.live_buffers();

        renderer.begin_frame(&Camera::default()).unwrap();
        let mut recorder = renderer.create_command_recorder(None).unwrap();
        {
            let usage = vk::BufferUsageFlags::TRANSFER_SRC
                | vk::BufferUsageFlags::TRANSFER_DST;
            let src = buffer(&allocator, 64, usage);
            let dst = buffer(&allocator, 64, usage);
            recorder.copy_buffer(
                &src,
                &dst,
                &[vk::BufferCopy {
                    src_offset: 0,
                    dst_offset: 0,
                    size: 64,
                }],
            );
        }
        renderer.consume_as_transfer(recorder).unwrap();
        let signal = renderer
            .submit_frame(vk::PipelineStageFlags2::ALL_COMMANDS)
            .unwrap();
        renderer.end_frame().unwrap();
        assert_eq!(device.live_buffers(), baseline + 2);

        device.signal(signal.semaphore, signal.value);
        renderer.end_frame().unwrap();
        assert_eq!(device.live_buffers(), baseline);
    }

    #[test]
    fn recorders_must_be_consumed_as_the_pass_they_were_made_for() {
        let device = FakeDevice::new();
        let (_allocator, mut renderer) = renderer(&device);
        renderer.begin_frame(&Camera::default()).unwrap();

        let transfer = renderer.create_command_recorder(None).unwrap();
        assert!(matches!(
            renderer.consume_as_pass(Pass::Base, transfer),
            Err(GraphicsError::PassMismatch(None, Some(Pass::Base)))
        ));

        let pass = renderer.create_command_recorder(Some(Pass::Base)).unwrap();
        assert!(matches!(
            renderer.consume_as_transfer(pass),
            Err(GraphicsError::PassMismatch(Some(Pass::Base), None))
        ));
    }

    #[test]
    fn samplers_are_shared_by_parameters() {
        let device = FakeDevice::new();
        let (_allocator, mut renderer) = renderer(&device);

        let a = renderer.get_sampler(&SamplerParams::default()).unwrap();
        let b = renderer.get_sampler(&SamplerParams::default()).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(device.live_samplers(), 1);

        let nearest = SamplerParams {
            mag_filter: vk::Filter::NEAREST,
            min_filter: vk::Filter::NEAREST,
            ..SamplerParams::default()
        };
        let c = renderer.get_sampler(&nearest).unwrap();
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(device.live_samplers(), 2);
    }

    #[test]
    fn scene_nodes_are_drawn_with_their_uniforms() {
        let device = FakeDevice::new();
        let (allocator, mut renderer) = renderer(&device);

        let writes_before = device.descriptor_writes().len();
        let material = renderer
            .create_gfx_material(
                Pass::Base.bit(),
                [Some(vk::Pipeline::from_raw(900))],
            )
            .unwrap();
        assert_eq!(
            device.descriptor_writes().len() - writes_before,
            BINDING_SLOT_COUNT * renderer.frames_in_flight()
        );
        let mesh = Mesh::new(
            buffer(&allocator, 256, vk::BufferUsageFlags::VERTEX_BUFFER),
            buffer(&allocator, 64, vk::BufferUsageFlags::INDEX_BUFFER),
            vk::IndexType::UINT16,
            6,
            Rc::new(material),
        );
        let mut node = renderer.create_scene_node(Rc::new(mesh)).unwrap();
        node.set_world_matrix(crate::math::Mat4::new_translation(
            &nalgebra::Vector3::new(1.0, 2.0, 3.0),
        ));

        renderer.begin_frame(&Camera::default()).unwrap();
        let mut recorder =
            renderer.create_command_recorder(Some(Pass::Base)).unwrap();
        recorder.setup_draw_scene_node(&node).unwrap();
        recorder.emit_barriers();
        recorder.draw_scene_node(&node, Pass::Base);
        let command_buffer = recorder.command_buffer();
        renderer.consume_as_pass(Pass::Base, recorder).unwrap();

        let commands = device.commands(command_buffer);
        assert!(matches!(
            &commands[0],
            Command::BindDescriptorSets {
                first_set: CAMERA_SET_INDEX,
                ..
            }
        ));
        assert!(commands.iter().any(|command| matches!(
            command,
            Command::BindDescriptorSets {
                first_set: MATERIAL_SET_INDEX,
                ..
            }
        )));
        assert!(matches!(commands.last(), Some(Command::DrawIndexed(6))));
        let barrier = commands
            .iter()
            .rposition(|c| matches!(c, Command::PipelineBarrier { .. }))
            .unwrap();
        let update = commands
            .iter()
            .rposition(|c| matches!(c, Command::UpdateBuffer { .. }))
            .unwrap();
        assert!(update < barrier);
        assert!(barrier < commands.len() - 1);

        renderer
            .submit_frame(vk::PipelineStageFlags2::ALL_GRAPHICS)
            .unwrap();
        assert_eq!(device.submissions().last().unwrap().len(), 2);
        renderer.block_for_current_frame().unwrap();
        assert_eq!(
            device.read_buffer(node.uniform_buffer().raw(), 64),
            node.uniform_data()
        );
        assert_eq!(
            device.read_buffer(renderer.camera_buffer.raw(), 176),
            Camera::default().uniforms().to_bytes()
        );
    }

    #[test]
    fn dropping_the_renderer_releases_its_resources() {
        let device = FakeDevice::new();
        let (_allocator, mut renderer) = renderer(&device);
        renderer.begin_frame(&Camera::default()).unwrap();
        renderer.submit_frame(vk::PipelineStageFlags2::ALL_COMMANDS).unwrap();
        assert!(device.live_buffers() > 0);

        drop(renderer);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_images(), 0);
    }
}
