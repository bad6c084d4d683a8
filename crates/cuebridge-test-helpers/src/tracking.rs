//! Allocation counting for the vendor callback path.
//!
//! Install [`TrackingAllocator`] as the global allocator of a test binary,
//! then wrap the code under test in [`track`]. Only allocations made on the
//! calling thread while a guard is alive are counted.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static BYTES: Cell<usize> = const { Cell::new(0) };
    static ENABLED: Cell<bool> = const { Cell::new(false) };
}

fn count(bytes: usize) {
    if ENABLED.with(Cell::get) {
        ALLOCATIONS.with(|c| c.set(c.get().saturating_add(1)));
        BYTES.with(|b| b.set(b.get().saturating_add(bytes)));
    }
}

/// System allocator that counts allocations on tracked threads.
pub struct TrackingAllocator;

// SAFETY: every call is forwarded unchanged to `System`.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: the caller upholds `GlobalAlloc::alloc`'s contract.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            count(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` came from `System` with this layout.
        unsafe { System.dealloc(ptr, layout) };
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: the caller upholds `GlobalAlloc::realloc`'s contract.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() && new_size > layout.size() {
            count(new_size - layout.size());
        }
        new_ptr
    }
}

/// Counts allocations on this thread until dropped.
#[derive(Debug)]
pub struct AllocationGuard {
    start_allocations: usize,
    start_bytes: usize,
    was_enabled: bool,
}

impl AllocationGuard {
    /// Start counting.
    pub fn new() -> Self {
        let was_enabled = ENABLED.with(|e| e.replace(true));
        Self {
            start_allocations: ALLOCATIONS.with(Cell::get),
            start_bytes: BYTES.with(Cell::get),
            was_enabled,
        }
    }

    /// Allocations since the guard was created.
    pub fn allocations(&self) -> usize {
        ALLOCATIONS.with(Cell::get).saturating_sub(self.start_allocations)
    }

    /// Bytes requested since the guard was created.
    pub fn bytes(&self) -> usize {
        BYTES.with(Cell::get).saturating_sub(self.start_bytes)
    }
}

impl Default for AllocationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AllocationGuard {
    fn drop(&mut self) {
        ENABLED.with(|e| e.set(self.was_enabled));
    }
}

/// Start counting allocations on this thread.
pub fn track() -> AllocationGuard {
    AllocationGuard::new()
}

/// Fail the test if the guard saw any allocation.
#[macro_export]
macro_rules! assert_no_alloc {
    ($guard:expr) => {
        $crate::assert_no_alloc!($guard, "tracked section")
    };
    ($guard:expr, $context:expr) => {{
        let guard = &$guard;
        let allocations = guard.allocations();
        assert!(
            allocations == 0,
            "{} allocated {} times ({} bytes) at {}:{}",
            $context,
            allocations,
            guard.bytes(),
            file!(),
            line!()
        );
    }};
}
