use std::rc::Rc;

/// A small least-recently-used cache of reference counted values.
///
/// Entries live in a vector ordered from least to most recently used, so
/// lookups are a linear scan. Capacities are small (tens of entries) which
/// keeps that cheaper than hashing.
pub struct LruCache<K, V> {
    capacity: usize,
    entries: Vec<(K, Rc<V>)>,
}

impl<K, V> LruCache<K, V>
where
    K: PartialEq + Copy,
{
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "an LRU cache needs room for one entry");
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Get the cached value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<Rc<V>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(index);
        let value = entry.1.clone();
        self.entries.push(entry);
        Some(value)
    }

    /// Get the cached value for `key` or create and insert it. When the
    /// cache is full the least recently used entry is evicted.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        create: impl FnOnce() -> Result<V, E>,
    ) -> Result<Rc<V>, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = Rc::new(create()?);
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push((key, value.clone()));
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every cached value.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
