use {
    crate::graphics::resources::ImageResource,
    ash::vk,
    std::rc::Rc,
};

/// The most color attachments a framebuffer can have.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// An image used as a render pass attachment.
///
/// The layouts must match the attachment description the render pass was
/// created with.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub image: Rc<ImageResource>,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

/// A render pass and framebuffer along with the images they render to.
///
/// The native objects are owned by whoever creates the swapchain and
/// pipelines. This only describes them so the recorder can move the
/// attachments into place.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
    colors: Vec<Attachment>,
    depth: Option<Attachment>,
}

impl Framebuffer {
    pub fn new(
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        colors: Vec<Attachment>,
        depth: Option<Attachment>,
    ) -> Self {
        assert!(
            colors.len() <= MAX_COLOR_ATTACHMENTS,
            "{} color attachments requested, at most {} are supported",
            colors.len(),
            MAX_COLOR_ATTACHMENTS
        );
        Self {
            render_pass,
            framebuffer,
            extent,
            colors,
            depth,
        }
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn raw(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// A render area covering the whole framebuffer.
    pub fn full_area(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        }
    }

    pub fn colors(&self) -> &[Attachment] {
        &self.colors
    }

    pub fn depth(&self) -> Option<&Attachment> {
        self.depth.as_ref()
    }
}
