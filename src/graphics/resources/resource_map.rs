use {
    super::{BufferResource, ImageResource, ResourceId},
    std::rc::Rc,
};

/// The number of slots in a [ResourceMap].
pub const RESOURCE_MAP_SLOTS: usize = 256;

/// Always holds the renderer's default buffer.
pub const DEFAULT_BUFFER_SLOT: usize = 0;

/// Always holds the renderer's default image.
pub const DEFAULT_IMAGE_SLOT: usize = 1;

/// The first slot meshes and applications may overwrite.
pub const FIRST_USABLE_SLOT: usize = DEFAULT_IMAGE_SLOT + 1;

/// A strong reference to either kind of resource.
#[derive(Debug, Clone)]
pub enum ResourceRef {
    Buffer(Rc<BufferResource>),
    Image(Rc<ImageResource>),
}

impl ResourceRef {
    pub fn id(&self) -> ResourceId {
        match self {
            Self::Buffer(buffer) => buffer.id(),
            Self::Image(image) => image.id(),
        }
    }

    pub fn as_buffer(&self) -> Option<&Rc<BufferResource>> {
        match self {
            Self::Buffer(buffer) => Some(buffer),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&Rc<ImageResource>> {
        match self {
            Self::Image(image) => Some(image),
            Self::Buffer(_) => None,
        }
    }
}

impl From<Rc<BufferResource>> for ResourceRef {
    fn from(buffer: Rc<BufferResource>) -> Self {
        Self::Buffer(buffer)
    }
}

impl From<Rc<ImageResource>> for ResourceRef {
    fn from(image: Rc<ImageResource>) -> Self {
        Self::Image(image)
    }
}

/// An indirection table between materials and resources.
///
/// Materials name resources by slot, so swapping the resource in a slot
/// rebinds every material which uses it. Slots are never empty: slot
/// [DEFAULT_BUFFER_SLOT] holds the default buffer, slot
/// [DEFAULT_IMAGE_SLOT] the default image and every other slot starts out
/// holding the default buffer.
pub struct ResourceMap {
    slots: Vec<ResourceRef>,
}

impl ResourceMap {
    pub fn new(
        default_buffer: Rc<BufferResource>,
        default_image: Rc<ImageResource>,
    ) -> Self {
        let mut slots =
            vec![ResourceRef::Buffer(default_buffer); RESOURCE_MAP_SLOTS];
        slots[DEFAULT_IMAGE_SLOT] = ResourceRef::Image(default_image);
        Self { slots }
    }

    pub fn get(&self, slot: usize) -> &ResourceRef {
        &self.slots[slot]
    }

    /// Put a resource in a slot. The default slots cannot be replaced.
    pub fn set(&mut self, slot: usize, resource: impl Into<ResourceRef>) {
        assert!(
            (FIRST_USABLE_SLOT..RESOURCE_MAP_SLOTS).contains(&slot),
            "resource map slot {} is reserved or out of range",
            slot
        );
        self.slots[slot] = resource.into();
    }

    pub fn default_buffer(&self) -> &Rc<BufferResource> {
        self.slots[DEFAULT_BUFFER_SLOT]
            .as_buffer()
            .expect("the default buffer slot always holds a buffer")
    }

    pub fn default_image(&self) -> &Rc<ImageResource> {
        self.slots[DEFAULT_IMAGE_SLOT]
            .as_image()
            .expect("the default image slot always holds an image")
    }
}
