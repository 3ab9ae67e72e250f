use {
    crate::graphics::vulkan_api::{GpuDevice, TimelinePoint, VulkanError},
    std::{collections::VecDeque, sync::Arc},
};

/// Keeps values alive until the GPU reaches a point on a timeline.
///
/// Values are only released by [Self::poll] (or [Self::drain]), never
/// while latching. The tracker is meant to be used from the thread which
/// records and submits frames.
pub struct LifetimeTracker<T> {
    pending: VecDeque<(TimelinePoint, T)>,
    device: Arc<dyn GpuDevice>,
}

impl<T> LifetimeTracker<T> {
    pub fn new(device: Arc<dyn GpuDevice>) -> Self {
        Self {
            pending: VecDeque::new(),
            device,
        }
    }

    /// Keep `value` alive until `wait_point` is reached.
    pub fn latch(&mut self, wait_point: TimelinePoint, value: T) {
        self.pending.push_back((wait_point, value));
    }

    /// Drop every value whose wait point the GPU has already reached.
    ///
    /// # Returns
    ///
    /// The number of values released.
    pub fn poll(&mut self) -> Result<usize, VulkanError> {
        let mut reached: Vec<(ash::vk::Semaphore, u64)> = vec![];
        let before = self.pending.len();
        let mut index = 0;
        while index < self.pending.len() {
            let point = self.pending[index].0;
            let current = match reached
                .iter()
                .find(|(semaphore, _)| *semaphore == point.semaphore)
            {
                Some(&(_, value)) => value,
                None => {
                    let value =
                        self.device.semaphore_counter_value(point.semaphore)?;
                    reached.push((point.semaphore, value));
                    value
                }
            };
            if current >= point.value {
                self.pending.remove(index);
            } else {
                index += 1;
            }
        }
        let released = before - self.pending.len();
        if released > 0 {
            log::trace!(
                "Released {} bundles, {} still pending",
                released,
                self.pending.len()
            );
        }
        Ok(released)
    }

    /// Drop everything, reached or not. Only valid once the device is idle.
    pub fn drain(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
