use {
    super::{BarrierBatch, BatchState, DeferredDeletion, Framebuffer},
    crate::graphics::{
        material::{Material, Pass, ProtoBarrier},
        resources::{BufferResource, ImageResource, ResourceMap, ResourceRef},
        scene::{Mesh, SceneNode},
        vulkan_api::GpuDevice,
        GraphicsError,
    },
    ash::vk,
    std::{cell::RefCell, rc::Rc, sync::Arc},
};

/// The descriptor set index of the camera uniforms.
pub const CAMERA_SET_INDEX: u32 = 1;

/// The descriptor set index of the per scene node uniforms.
pub const SCENE_NODE_SET_INDEX: u32 = 2;

/// The descriptor set index of the material bindings.
pub const MATERIAL_SET_INDEX: u32 = 3;

/// The largest inline buffer update Vulkan allows.
const MAX_INLINE_UPDATE_SIZE: usize = 65536;

/// What is left once a recorder is ended: the executable command buffer
/// and everything that has to stay alive until it completes.
#[derive(Debug)]
pub struct RecordingResult {
    pub command_buffer: vk::CommandBuffer,
    pub deferred_deletion: DeferredDeletion,
}

/// Records commands into one command buffer while tracking resource state.
///
/// Every operation which touches a resource moves the resource into the
/// state the operation needs, adding a barrier only when one is required.
/// Barriers are batched and recorded right before the command which
/// depends on them. Each touched resource is retained until the recorder
/// is ended and its bundle is handed to the renderer's lifetime tracker.
pub struct CommandRecorder {
    device: Arc<dyn GpuDevice>,
    command_buffer: vk::CommandBuffer,
    frame_slot: usize,
    pass: Option<Pass>,
    pipeline_layout: vk::PipelineLayout,
    resource_map: Rc<RefCell<ResourceMap>>,
    barriers: BarrierBatch,
    deferred_deletion: DeferredDeletion,
}

impl CommandRecorder {
    /// Wrap a command buffer which has already begun recording.
    pub(crate) fn new(
        device: Arc<dyn GpuDevice>,
        command_buffer: vk::CommandBuffer,
        frame_slot: usize,
        pass: Option<Pass>,
        pipeline_layout: vk::PipelineLayout,
        resource_map: Rc<RefCell<ResourceMap>>,
    ) -> Self {
        Self {
            device,
            command_buffer,
            frame_slot,
            pass,
            pipeline_layout,
            resource_map,
            barriers: BarrierBatch::new(),
            deferred_deletion: DeferredDeletion::new(),
        }
    }

    /// The pass this recorder was created for. `None` for setup and
    /// transfer work.
    pub fn pass(&self) -> Option<Pass> {
        self.pass
    }

    pub fn frame_slot(&self) -> usize {
        self.frame_slot
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn resource_map(&self) -> &Rc<RefCell<ResourceMap>> {
        &self.resource_map
    }

    /// Keep a resource alive until the recorded commands complete.
    pub fn retain(&mut self, resource: impl Into<ResourceRef>) {
        self.deferred_deletion.add(resource);
    }

    // Barriers

    /// Move a buffer to a new access and stage, flushing the pending
    /// barriers first if the batch is full.
    pub fn push_buffer_barrier(
        &mut self,
        buffer: &Rc<BufferResource>,
        access: vk::AccessFlags2,
        stages: vk::PipelineStageFlags2,
    ) {
        if self.barriers.buffers_full() {
            self.emit_barriers();
        }
        self.barriers.push_buffer(buffer, access, stages);
        self.deferred_deletion.add(buffer.clone());
    }

    /// Move an image to a new access, stage and layout, flushing the
    /// pending barriers first if the batch is full. UNDEFINED keeps the
    /// current layout.
    pub fn push_image_barrier(
        &mut self,
        image: &Rc<ImageResource>,
        access: vk::AccessFlags2,
        stages: vk::PipelineStageFlags2,
        layout: vk::ImageLayout,
    ) {
        if self.barriers.images_full() {
            self.emit_barriers();
        }
        self.barriers.push_image(image, access, stages, layout);
        self.deferred_deletion.add(image.clone());
    }

    /// Record every pending barrier as one pipeline barrier command.
    pub fn emit_barriers(&mut self) {
        let device = &self.device;
        let command_buffer = self.command_buffer;
        self.barriers.flush(|buffers, images| unsafe {
            device.cmd_pipeline_barrier(command_buffer, buffers, images);
        });
    }

    // Transfers

    pub fn copy_buffer(
        &mut self,
        src: &Rc<BufferResource>,
        dst: &Rc<BufferResource>,
        regions: &[vk::BufferCopy],
    ) {
        self.push_buffer_barrier(
            src,
            vk::AccessFlags2::TRANSFER_READ,
            vk::PipelineStageFlags2::COPY,
        );
        self.push_buffer_barrier(
            dst,
            vk::AccessFlags2::TRANSFER_WRITE,
            vk::PipelineStageFlags2::COPY,
        );
        self.emit_barriers();
        unsafe {
            self.device.cmd_copy_buffer(
                self.command_buffer,
                src.raw(),
                dst.raw(),
                regions,
            );
        }
    }

    /// Copy texels from a buffer. The image is moved to
    /// TRANSFER_DST_OPTIMAL first.
    pub fn copy_buffer_to_image(
        &mut self,
        src: &Rc<BufferResource>,
        dst: &Rc<ImageResource>,
        regions: &[vk::BufferImageCopy],
    ) {
        self.push_buffer_barrier(
            src,
            vk::AccessFlags2::TRANSFER_READ,
            vk::PipelineStageFlags2::COPY,
        );
        self.push_image_barrier(
            dst,
            vk::AccessFlags2::TRANSFER_WRITE,
            vk::PipelineStageFlags2::COPY,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        self.emit_barriers();
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                src.raw(),
                dst.raw(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                regions,
            );
        }
    }

    /// Write a small amount of data into a buffer from the command buffer
    /// itself.
    pub fn update_buffer(
        &mut self,
        dst: &Rc<BufferResource>,
        offset: vk::DeviceSize,
        data: &[u8],
    ) {
        assert!(
            data.len() <= MAX_INLINE_UPDATE_SIZE
                && data.len() % 4 == 0
                && offset % 4 == 0,
            "inline updates must be at most 64KiB with 4 byte granularity"
        );
        self.push_buffer_barrier(
            dst,
            vk::AccessFlags2::TRANSFER_WRITE,
            vk::PipelineStageFlags2::ALL_TRANSFER,
        );
        self.emit_barriers();
        unsafe {
            self.device.cmd_update_buffer(
                self.command_buffer,
                dst.raw(),
                offset,
                data,
            );
        }
    }

    // Materials

    /// Bring the material's descriptor set for this frame up to date and
    /// queue the barriers its bindings need.
    pub fn setup_material(
        &mut self,
        material: &Material,
    ) -> Result<(), GraphicsError> {
        let barriers = material
            .update_descriptor_set(self.frame_slot, &self.resource_map.borrow())?;
        for barrier in barriers {
            match barrier {
                ProtoBarrier::Buffer {
                    buffer,
                    access,
                    stages,
                } => self.push_buffer_barrier(&buffer, access, stages),
                ProtoBarrier::Image {
                    image,
                    access,
                    stages,
                    layout,
                } => self.push_image_barrier(&image, access, stages, layout),
            }
        }
        Ok(())
    }

    pub fn set_gfx_material(&mut self, material: &Material, pass: Pass) {
        assert!(material.is_graphics(), "{:?} is not graphics", material);
        self.set_material(material, pass);
    }

    pub fn set_compute_material(&mut self, material: &Material, pass: Pass) {
        assert!(!material.is_graphics(), "{:?} is not compute", material);
        self.set_material(material, pass);
    }

    fn set_material(&mut self, material: &Material, pass: Pass) {
        assert!(
            material.lives_in_pass(pass),
            "{:?} is not used in {:?}",
            material,
            pass
        );
        let Some(pipeline) = material.pipeline().pipeline(pass) else {
            panic!("{:?} has no pipeline for {:?}", material, pass);
        };
        let bind_point = material.bind_point();
        unsafe {
            self.device
                .cmd_bind_pipeline(self.command_buffer, bind_point, pipeline);
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                bind_point,
                self.pipeline_layout,
                MATERIAL_SET_INDEX,
                &[material.descriptor_set(self.frame_slot).raw()],
            );
        }
        self.deferred_deletion
            .extend(material.bound_resources(self.frame_slot));
    }

    /// Bind a compute material, flush pending barriers and dispatch.
    pub fn dispatch(
        &mut self,
        material: &Material,
        pass: Pass,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) {
        self.set_compute_material(material, pass);
        self.emit_barriers();
        unsafe {
            self.device.cmd_dispatch(
                self.command_buffer,
                group_count_x,
                group_count_y,
                group_count_z,
            );
        }
    }

    // Meshes and scene nodes

    /// Prepare everything a mesh draw reads. Must be called outside of a
    /// render pass, before [Self::draw_mesh].
    pub fn setup_draw_mesh(&mut self, mesh: &Mesh) -> Result<(), GraphicsError> {
        mesh.update_resource_map(&mut self.resource_map.borrow_mut());
        self.push_buffer_barrier(
            mesh.vertex_buffer(),
            vk::AccessFlags2::VERTEX_ATTRIBUTE_READ,
            vk::PipelineStageFlags2::VERTEX_ATTRIBUTE_INPUT,
        );
        self.push_buffer_barrier(
            mesh.index_buffer(),
            vk::AccessFlags2::INDEX_READ,
            vk::PipelineStageFlags2::INDEX_INPUT,
        );
        self.setup_material(mesh.material())
    }

    /// Draw a mesh prepared by [Self::setup_draw_mesh]. Its barriers must
    /// already be emitted, which beginning a render pass does.
    pub fn draw_mesh(&mut self, mesh: &Mesh, pass: Pass) {
        assert!(
            mesh.material().lives_in_pass(pass),
            "mesh is not drawn in {:?}",
            pass
        );
        debug_assert!(
            self.barriers.state() == BatchState::Idle,
            "drawing with barriers still pending, emit them first"
        );
        unsafe {
            self.device.cmd_bind_vertex_buffer(
                self.command_buffer,
                mesh.vertex_buffer().raw(),
                0,
            );
            self.device.cmd_bind_index_buffer(
                self.command_buffer,
                mesh.index_buffer().raw(),
                0,
                mesh.index_type(),
            );
        }
        self.retain(mesh.vertex_buffer().clone());
        self.retain(mesh.index_buffer().clone());

        mesh.update_resource_map(&mut self.resource_map.borrow_mut());
        self.set_gfx_material(mesh.material(), pass);

        unsafe {
            self.device.cmd_draw_indexed(
                self.command_buffer,
                mesh.index_count(),
                1,
            );
        }
    }

    /// Upload the node's uniforms and prepare its mesh. Must be called
    /// outside of a render pass, before [Self::draw_scene_node].
    pub fn setup_draw_scene_node(
        &mut self,
        node: &SceneNode,
    ) -> Result<(), GraphicsError> {
        let uniforms = node.uniform_buffer();
        self.update_buffer(uniforms, 0, &node.uniform_data());
        self.push_buffer_barrier(
            uniforms,
            vk::AccessFlags2::UNIFORM_READ,
            vk::PipelineStageFlags2::VERTEX_SHADER,
        );
        self.setup_draw_mesh(node.mesh())
    }

    pub fn draw_scene_node(&mut self, node: &SceneNode, pass: Pass) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout,
                SCENE_NODE_SET_INDEX,
                &[node.descriptor_set().raw()],
            );
        }
        self.retain(node.uniform_buffer().clone());
        self.draw_mesh(node.mesh(), pass);
    }

    // Render passes

    /// Move every attachment into its initial layout and begin the render
    /// pass. Clear values are given to color attachments first, then to
    /// the depth attachment.
    pub fn begin_render_pass(
        &mut self,
        framebuffer: &Framebuffer,
        render_area: vk::Rect2D,
        clear_color: vk::ClearColorValue,
        clear_depth: vk::ClearDepthStencilValue,
    ) {
        let mut clear_values = vec![];
        for color in framebuffer.colors() {
            self.push_image_barrier(
                &color.image,
                vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                color.initial_layout,
            );
            clear_values.push(vk::ClearValue { color: clear_color });
        }
        if let Some(depth) = framebuffer.depth() {
            self.push_image_barrier(
                &depth.image,
                vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ
                    | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
                depth.initial_layout,
            );
            clear_values.push(vk::ClearValue {
                depth_stencil: clear_depth,
            });
        }
        self.emit_barriers();
        unsafe {
            self.device.cmd_begin_render_pass(
                self.command_buffer,
                framebuffer.render_pass(),
                framebuffer.raw(),
                render_area,
                &clear_values,
            );
        }
    }

    /// End the render pass and record the layouts it left the attachments
    /// in. When `present` names a color attachment, that attachment is
    /// moved to PRESENT_SRC_KHR.
    pub fn end_render_pass(
        &mut self,
        framebuffer: &Framebuffer,
        present: Option<usize>,
    ) {
        unsafe { self.device.cmd_end_render_pass(self.command_buffer) };

        for color in framebuffer.colors() {
            color.image.set_layout(color.final_layout);
        }
        if let Some(depth) = framebuffer.depth() {
            depth.image.set_layout(depth.final_layout);
        }

        if let Some(index) = present {
            self.push_image_barrier(
                &framebuffer.colors()[index].image,
                vk::AccessFlags2::NONE,
                vk::PipelineStageFlags2::NONE,
                vk::ImageLayout::PRESENT_SRC_KHR,
            );
            self.emit_barriers();
        }
    }

    /// Flush pending barriers and finish recording.
    pub fn end(mut self) -> Result<RecordingResult, GraphicsError> {
        self.emit_barriers();
        unsafe { self.device.end_command_buffer(self.command_buffer)? };
        log::trace!(
            "Recorded {:?} for {:?}, retaining {} resources",
            self.command_buffer,
            self.pass,
            self.deferred_deletion.len()
        );
        Ok(RecordingResult {
            command_buffer: self.command_buffer,
            deferred_deletion: self.deferred_deletion,
        })
    }
}

impl std::fmt::Debug for CommandRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRecorder")
            .field("command_buffer", &self.command_buffer)
            .field("frame_slot", &self.frame_slot)
            .field("pass", &self.pass)
            .field("barriers", &self.barriers.state())
            .finish()
    }
}
