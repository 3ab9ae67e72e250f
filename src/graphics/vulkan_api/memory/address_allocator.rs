/// The largest alignment an [AddressAllocator] can satisfy.
pub const MAX_ALIGNMENT: u64 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeRange {
    offset: u64,
    size: u64,
}

impl FreeRange {
    fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// A general purpose free-list suballocator for byte offsets inside a
/// fixed-size arena.
///
/// The arena is addressed in blocks: every request is rounded up to a whole
/// number of blocks, so every offset handed out is a multiple of the block
/// size. Free ranges are kept sorted by offset and adjacent ranges are
/// merged when memory is returned.
///
/// The allocator never touches the memory it manages. It only does the
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    total_size: u64,
    block_size: u64,
    free_size: u64,
    free_ranges: Vec<FreeRange>,
}

impl AddressAllocator {
    /// Create an allocator for an arena of `total_size` bytes.
    ///
    /// `total_size` is rounded down to a whole number of blocks.
    /// `block_size` must be a power of two.
    pub fn new(total_size: u64, block_size: u64) -> Self {
        assert!(
            block_size.is_power_of_two(),
            "block size must be a power of two, got {}",
            block_size
        );
        let total_size = total_size - (total_size % block_size);
        let mut allocator = Self {
            total_size,
            block_size,
            free_size: 0,
            free_ranges: Vec::new(),
        };
        allocator.reset();
        allocator
    }

    /// Reserve `size` bytes at an offset which is a multiple of `alignment`.
    ///
    /// # Returns
    ///
    /// The offset of the reserved range, or `None` when no free range is
    /// large enough, `size` is zero, or `alignment` is not a power of two
    /// no larger than [MAX_ALIGNMENT]. Failure leaves the allocator
    /// untouched.
    pub fn alloc(&mut self, size: u64, alignment: u64) -> Option<u64> {
        if size == 0
            || !alignment.is_power_of_two()
            || alignment > MAX_ALIGNMENT
        {
            return None;
        }
        let size = self.round_to_blocks(size)?;

        let (index, aligned_offset) =
            self.free_ranges.iter().enumerate().find_map(|(i, range)| {
                let aligned = align_up(range.offset, alignment)?;
                let end = aligned.checked_add(size)?;
                (end <= range.end()).then_some((i, aligned))
            })?;

        let range = self.free_ranges[index];
        let before = FreeRange {
            offset: range.offset,
            size: aligned_offset - range.offset,
        };
        let after = FreeRange {
            offset: aligned_offset + size,
            size: range.end() - (aligned_offset + size),
        };
        match (before.size > 0, after.size > 0) {
            (false, false) => {
                self.free_ranges.remove(index);
            }
            (true, false) => self.free_ranges[index] = before,
            (false, true) => self.free_ranges[index] = after,
            (true, true) => {
                self.free_ranges[index] = before;
                self.free_ranges.insert(index + 1, after);
            }
        }

        self.free_size -= size;
        Some(aligned_offset)
    }

    /// Return a range previously handed out by [Self::alloc]. `size` must be
    /// the size which was requested.
    pub fn free(&mut self, offset: u64, size: u64) {
        let Some(size) = self.round_to_blocks(size) else {
            panic!("freeing {} bytes which could never have been allocated", size);
        };
        debug_assert!(
            offset + size <= self.total_size,
            "freeing [{}, {}) which is outside of the arena",
            offset,
            offset + size
        );

        let index = self.free_ranges.partition_point(|r| r.offset < offset);
        debug_assert!(
            index == 0 || self.free_ranges[index - 1].end() <= offset,
            "range at {} overlaps a free range (double free?)",
            offset
        );
        debug_assert!(
            index == self.free_ranges.len()
                || offset + size <= self.free_ranges[index].offset,
            "range at {} overlaps a free range (double free?)",
            offset
        );

        let merges_before =
            index > 0 && self.free_ranges[index - 1].end() == offset;
        let merges_after = index < self.free_ranges.len()
            && self.free_ranges[index].offset == offset + size;

        match (merges_before, merges_after) {
            (true, true) => {
                let after = self.free_ranges.remove(index);
                self.free_ranges[index - 1].size += size + after.size;
            }
            (true, false) => self.free_ranges[index - 1].size += size,
            (false, true) => {
                let next = &mut self.free_ranges[index];
                next.offset = offset;
                next.size += size;
            }
            (false, false) => {
                self.free_ranges.insert(index, FreeRange { offset, size })
            }
        }

        self.free_size += size;
    }

    /// Forget every allocation. The whole arena becomes free.
    pub fn reset(&mut self) {
        self.free_ranges.clear();
        if self.total_size > 0 {
            self.free_ranges.push(FreeRange {
                offset: 0,
                size: self.total_size,
            });
        }
        self.free_size = self.total_size;
    }

    /// The number of bytes not currently reserved.
    pub fn free_size(&self) -> u64 {
        self.free_size
    }

    /// The size of the arena in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// True when nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.free_size == self.total_size
    }

    fn round_to_blocks(&self, size: u64) -> Option<u64> {
        align_up(size, self.block_size)
    }
}

/// Round `value` up to the next multiple of the power-of-two `alignment`.
///
/// `None` when the result does not fit in a u64.
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    value
        .checked_add(alignment - 1)
        .map(|bumped| bumped & !(alignment - 1))
}

#[cfg(test)]
mod test {
    use super::*;

    /// Deterministic xorshift so failures are reproducible.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }
    }

    fn overlaps(a: (u64, u64), b: (u64, u64)) -> bool {
        a.0 < b.0 + b.1 && b.0 < a.0 + a.1
    }

    #[test]
    fn new_allocator_is_entirely_free() {
        let allocator = AddressAllocator::new(4096, 64);
        assert_eq!(allocator.total_size(), 4096);
        assert_eq!(allocator.free_size(), 4096);
        assert!(allocator.is_empty());
    }

    #[test]
    fn total_size_is_rounded_down_to_blocks() {
        let allocator = AddressAllocator::new(1000, 64);
        assert_eq!(allocator.total_size(), 960);
    }

    #[test]
    fn sizes_are_rounded_up_to_blocks() {
        let mut allocator = AddressAllocator::new(4096, 64);
        assert_eq!(allocator.alloc(1, 1), Some(0));
        assert_eq!(allocator.alloc(65, 1), Some(64));
        assert_eq!(allocator.free_size(), 4096 - 64 - 128);
    }

    #[test]
    fn offsets_respect_alignment() {
        let mut allocator = AddressAllocator::new(8192, 64);
        assert_eq!(allocator.alloc(64, 64), Some(0));
        let offset = allocator.alloc(100, 512).unwrap();
        assert_eq!(offset % 512, 0);
        assert_eq!(offset, 512);

        // the padding skipped for alignment is still usable
        assert_eq!(allocator.alloc(64, 64), Some(64));
    }

    #[test]
    fn invalid_requests_return_none() {
        let mut allocator = AddressAllocator::new(4096, 64);
        assert_eq!(allocator.alloc(0, 64), None);
        assert_eq!(allocator.alloc(64, 3), None);
        assert_eq!(allocator.alloc(64, MAX_ALIGNMENT * 2), None);
        assert!(allocator.is_empty());
    }

    #[test]
    fn oversized_requests_return_none() {
        let mut allocator = AddressAllocator::new(1024, 64);
        assert_eq!(allocator.alloc(u64::MAX, 64), None);
        assert_eq!(allocator.alloc(u64::MAX - 100, 1), None);
        assert_eq!(allocator.alloc(u64::MAX - 63, 256), None);
        assert!(allocator.is_empty());
        assert_eq!(allocator.alloc(1024, 64), Some(0));
    }

    #[test]
    fn align_up_rounds_and_detects_overflow() {
        assert_eq!(align_up(0, 64), Some(0));
        assert_eq!(align_up(65, 64), Some(128));
        assert_eq!(align_up(128, 64), Some(128));
        assert_eq!(align_up(u64::MAX, 64), None);
        assert_eq!(align_up(u64::MAX, 1), Some(u64::MAX));
    }

    #[test]
    fn exhaustion_returns_none_and_leaves_state_untouched() {
        let mut allocator = AddressAllocator::new(1024, 64);
        assert_eq!(allocator.alloc(1024, 64), Some(0));
        assert_eq!(allocator.alloc(64, 64), None);
        assert_eq!(allocator.free_size(), 0);

        allocator.free(0, 1024);
        assert!(allocator.is_empty());
        assert_eq!(allocator.alloc(2048, 64), None);
        assert!(allocator.is_empty());
    }

    #[test]
    fn freed_neighbours_are_merged() {
        let mut allocator = AddressAllocator::new(256, 64);
        let a = allocator.alloc(64, 64).unwrap();
        let b = allocator.alloc(64, 64).unwrap();
        let c = allocator.alloc(64, 64).unwrap();
        let d = allocator.alloc(64, 64).unwrap();

        allocator.free(b, 64);
        allocator.free(d, 64);
        allocator.free(c, 64);

        // b, c and d were merged into one range
        assert_eq!(allocator.alloc(192, 64), Some(b));
        allocator.free(a, 64);
        assert_eq!(allocator.alloc(64, 64), Some(a));
    }

    #[test]
    fn reset_frees_everything() {
        let mut allocator = AddressAllocator::new(4096, 64);
        allocator.alloc(1000, 64).unwrap();
        allocator.alloc(1000, 256).unwrap();
        allocator.reset();
        assert!(allocator.is_empty());
        assert_eq!(allocator.alloc(4096, 64), Some(0));
    }

    #[test]
    fn random_sequences_never_overlap_and_fully_recover() {
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
        let mut allocator = AddressAllocator::new(1 << 20, 64);
        let mut live: Vec<(u64, u64)> = vec![];

        for _ in 0..2000 {
            if live.is_empty() || rng.next() % 3 != 0 {
                let size = 1 + rng.next() % 8192;
                let alignment = 1 << (rng.next() % 10);
                if let Some(offset) = allocator.alloc(size, alignment) {
                    assert_eq!(offset % alignment, 0);
                    assert!(offset + size <= allocator.total_size());
                    for &existing in &live {
                        assert!(
                            !overlaps((offset, size), existing),
                            "{:?} overlaps {:?}",
                            (offset, size),
                            existing
                        );
                    }
                    live.push((offset, size));
                }
            } else {
                let index = (rng.next() % live.len() as u64) as usize;
                let (offset, size) = live.swap_remove(index);
                allocator.free(offset, size);
            }
        }

        for (offset, size) in live.drain(..) {
            allocator.free(offset, size);
        }
        assert_eq!(allocator.free_size(), allocator.total_size());
        assert_eq!(allocator.alloc(1 << 20, 64), Some(0));
    }
}
