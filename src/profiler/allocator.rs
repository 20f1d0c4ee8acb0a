//! Counting global allocator.
//!
//! Install it in the binary to feed the profiler:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOCATOR: job_wrapper::profiler::TrackingAllocator = job_wrapper::profiler::TrackingAllocator;
//! ```
//!
//! Without it every snapshot reads zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static CURRENT: AtomicU64 = AtomicU64::new(0);
static PEAK: AtomicU64 = AtomicU64::new(0);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static DEALLOCATIONS: AtomicU64 = AtomicU64::new(0);

/// System allocator wrapper keeping live byte and call counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

fn record_alloc(size: usize) {
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    let current = CURRENT.fetch_add(size as u64, Ordering::Relaxed) + size as u64;
    PEAK.fetch_max(current, Ordering::Relaxed);
}

fn record_dealloc(size: usize) {
    DEALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    CURRENT.fetch_sub(size as u64, Ordering::Relaxed);
}

/// Point-in-time allocator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemorySnapshot {
    pub current_bytes: u64,
    pub peak_bytes: u64,
    pub allocations: u64,
    pub deallocations: u64,
}

pub fn snapshot() -> MemorySnapshot {
    MemorySnapshot {
        current_bytes: CURRENT.load(Ordering::Relaxed),
        peak_bytes: PEAK.load(Ordering::Relaxed),
        allocations: ALLOCATIONS.load(Ordering::Relaxed),
        deallocations: DEALLOCATIONS.load(Ordering::Relaxed),
    }
}

/// Whether the tracking allocator is installed and has seen traffic.
pub fn is_installed() -> bool {
    ALLOCATIONS.load(Ordering::Relaxed) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_allocations() {
        let before = snapshot();
        record_alloc(1024);
        record_alloc(512);
        record_dealloc(1024);
        let after = snapshot();

        assert!(after.allocations >= before.allocations + 2);
        assert!(after.deallocations > before.deallocations);
        assert!(after.peak_bytes >= 1536);
        assert!(is_installed());
    }
}
