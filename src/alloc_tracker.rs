//! Process-wide allocation counters for hot-path enforcement.
//!
//! The counters only move while tracking is enabled, and the counting
//! allocator is only installed when the `alloc-instrumentation` feature
//! is on; without it the hooks never run and impose zero cost.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(false);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static DEALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static TOTAL_BYTES: AtomicU64 = AtomicU64::new(0);

pub fn reset() {
    ALLOCATIONS.store(0, Ordering::Relaxed);
    DEALLOCATIONS.store(0, Ordering::Relaxed);
    TOTAL_BYTES.store(0, Ordering::Relaxed);
}

pub fn enable() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable() {
    ENABLED.store(false, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn allocation_count() -> u64 {
    ALLOCATIONS.load(Ordering::Relaxed)
}

pub fn deallocation_count() -> u64 {
    DEALLOCATIONS.load(Ordering::Relaxed)
}

pub fn total_allocated_bytes() -> u64 {
    TOTAL_BYTES.load(Ordering::Relaxed)
}

/// Allocator wrapper that counts while tracking is enabled.
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if ENABLED.load(Ordering::Relaxed) {
            ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
            TOTAL_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if ENABLED.load(Ordering::Relaxed) {
            DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        }
        System.dealloc(ptr, layout)
    }
}

#[cfg(feature = "alloc-instrumentation")]
#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Scoped tracking: resets the counters and enables tracking on
/// construction, disables on drop.
pub struct AllocGuard {
    _private: (),
}

impl AllocGuard {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        reset();
        enable();
        Self { _private: () }
    }

    pub fn allocation_count(&self) -> u64 {
        allocation_count()
    }
}

impl Drop for AllocGuard {
    fn drop(&mut self) {
        disable();
    }
}
