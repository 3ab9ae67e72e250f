use {
    crate::graphics::{
        resources::{
            ImageViewParams, DEFAULT_BUFFER_SLOT, DEFAULT_IMAGE_SLOT,
            SIZE_FULL_RANGE,
        },
        vulkan_api::raii,
    },
    ash::vk,
    std::rc::Rc,
};

/// The number of storage buffer bindings in a material descriptor set.
pub const BUFFER_BINDING_COUNT: usize = 8;

/// The number of combined image sampler bindings in a material descriptor
/// set.
pub const TEXTURE_BINDING_COUNT: usize = 8;

/// The total number of bindings in a material descriptor set.
pub const BINDING_SLOT_COUNT: usize = BUFFER_BINDING_COUNT + TEXTURE_BINDING_COUNT;

/// A binding in the material descriptor set. `B*` slots are storage
/// buffers, `T*` slots are combined image samplers. The discriminant is
/// the binding number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BindingSlot {
    B0 = 0,
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
}

impl BindingSlot {
    pub const ALL: [BindingSlot; BINDING_SLOT_COUNT] = [
        Self::B0,
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
        Self::B5,
        Self::B6,
        Self::B7,
        Self::T0,
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T7,
    ];

    /// The slot for a binding number, if there is one.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// This slot's bit in a material binding mask.
    pub fn bit(self) -> u16 {
        1 << self as u16
    }

    pub fn is_buffer(self) -> bool {
        self.index() < BUFFER_BINDING_COUNT
    }

    pub fn is_texture(self) -> bool {
        !self.is_buffer()
    }

    pub fn descriptor_type(self) -> vk::DescriptorType {
        if self.is_buffer() {
            vk::DescriptorType::STORAGE_BUFFER
        } else {
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        }
    }

    /// How shaders access the resource bound to this slot.
    pub fn access(self) -> vk::AccessFlags2 {
        if self.is_buffer() {
            vk::AccessFlags2::SHADER_STORAGE_READ
                | vk::AccessFlags2::SHADER_STORAGE_WRITE
        } else {
            vk::AccessFlags2::SHADER_SAMPLED_READ
        }
    }
}

/// The buffer range bound to a `B*` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding {
    pub resource_map_slot: usize,
    pub offset: vk::DeviceSize,

    /// [SIZE_FULL_RANGE] binds everything after `offset`.
    pub size: vk::DeviceSize,
}

impl Default for BufferBinding {
    fn default() -> Self {
        Self {
            resource_map_slot: DEFAULT_BUFFER_SLOT,
            offset: 0,
            size: SIZE_FULL_RANGE,
        }
    }
}

impl BufferBinding {
    /// The descriptor range for this binding.
    pub fn range(&self) -> vk::DeviceSize {
        if self.size == SIZE_FULL_RANGE {
            vk::WHOLE_SIZE
        } else {
            self.size
        }
    }
}

/// The image view and sampler bound to a `T*` slot.
#[derive(Debug, Clone)]
pub struct ImageBinding {
    pub resource_map_slot: usize,
    pub view: ImageViewParams,

    /// The layout the image is in when shaders sample it. Barriers move the
    /// image into this layout and descriptors are written with it.
    pub layout: vk::ImageLayout,

    /// `None` samples with the renderer's default sampler.
    pub sampler: Option<Rc<raii::Sampler>>,
}

impl Default for ImageBinding {
    fn default() -> Self {
        Self {
            resource_map_slot: DEFAULT_IMAGE_SLOT,
            view: ImageViewParams::default(),
            layout: vk::ImageLayout::READ_ONLY_OPTIMAL,
            sampler: None,
        }
    }
}

/// What a material binds to one slot.
#[derive(Debug, Clone)]
pub enum Binding {
    Buffer(BufferBinding),
    Image(ImageBinding),
}

impl Binding {
    /// The binding every slot starts with: the default buffer for `B*`
    /// slots and the default image for `T*` slots.
    pub fn default_for(slot: BindingSlot) -> Self {
        if slot.is_buffer() {
            Self::Buffer(BufferBinding::default())
        } else {
            Self::Image(ImageBinding::default())
        }
    }

    pub fn resource_map_slot(&self) -> usize {
        match self {
            Self::Buffer(buffer) => buffer.resource_map_slot,
            Self::Image(image) => image.resource_map_slot,
        }
    }

    /// True when this kind of binding can live in `slot`.
    pub fn fits(&self, slot: BindingSlot) -> bool {
        matches!(
            (self, slot.is_buffer()),
            (Self::Buffer(_), true) | (Self::Image(_), false)
        )
    }
}
