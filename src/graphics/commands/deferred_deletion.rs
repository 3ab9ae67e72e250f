use crate::graphics::resources::ResourceRef;

/// Strong references to everything a command buffer touched.
///
/// Holding the bundle keeps the resources, and whatever they keep alive,
/// from being destroyed. Dropping it releases them.
#[derive(Debug, Default)]
pub struct DeferredDeletion {
    resources: Vec<ResourceRef>,
}

impl DeferredDeletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: impl Into<ResourceRef>) {
        self.resources.push(resource.into());
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resources(&self) -> &[ResourceRef] {
        &self.resources
    }
}

impl Extend<ResourceRef> for DeferredDeletion {
    fn extend<T: IntoIterator<Item = ResourceRef>>(&mut self, iter: T) {
        self.resources.extend(iter);
    }
}

impl Drop for DeferredDeletion {
    fn drop(&mut self) {
        if !self.resources.is_empty() {
            log::trace!("Releasing {} retained resources", self.resources.len());
        }
    }
}
