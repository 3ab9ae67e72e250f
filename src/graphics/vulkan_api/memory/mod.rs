//! Device memory suballocation.
//!
//! Each memory type gets a [MemoryHeap]. A heap owns [MemoryPool]s, and each
//! pool hands out byte ranges of one device allocation through an
//! [AddressAllocator].

mod address_allocator;
mod memory_heap;
mod memory_pool;
mod memory_properties;

pub use self::{
    address_allocator::{align_up, AddressAllocator, MAX_ALIGNMENT},
    memory_heap::{Allocation, HeapConfig, MemoryHeap},
    memory_pool::{MemoryBinding, MemoryPool},
    memory_properties::MemoryProperties,
};
