//! The process-wide allocator singleton.
//!
//! Wraps a single [`Allocator<StaticHeapSource>`] in a [`SpinLock`] and wires
//! it up as the `#[global_allocator]`. Lazily initialized on first use via
//! [`SyncOnceCell`], matching this workspace's existing
//! init-on-first-allocation convention rather than requiring an explicit
//! boot-time call.

use crate::heap_source::StaticHeapSource;
use crate::Allocator;
use core::alloc::{GlobalAlloc, Layout};
use kernel_sync::{SpinLock, SyncOnceCell};

/// The `#[global_allocator]` backing every `alloc`/`Box`/`Vec` use in the
/// kernel binary.
pub struct GlobalAllocator {
    inner: SpinLock<Allocator<StaticHeapSource>>,
    init: SyncOnceCell<()>,
}

impl GlobalAllocator {
    /// Construct an uninitialized singleton. Call sites never need to call
    /// this directly; use [`ALLOCATOR`].
    pub const fn new() -> Self {
        Self {
            inner: SpinLock::new(Allocator::new(StaticHeapSource::new())),
            init: SyncOnceCell::new(),
        }
    }

    fn ensure_init(&self) {
        self.init.get_or_init(|| {
            self.inner.with_lock(|alloc| {
                if let Err(err) = alloc.init() {
                    log::error!("heap initialization failed: {err}");
                }
            });
        });
    }

    /// Snapshot of current heap utilization, for diagnostics / logging.
    pub fn stats(&self) -> crate::diagnostics::HeapStats {
        self.inner.with_lock(|alloc| alloc.stats())
    }
}

impl Default for GlobalAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: every public operation is taken under `inner`'s spinlock.
unsafe impl GlobalAlloc for GlobalAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.ensure_init();
        self.inner.with_lock(|alloc| alloc.allocate(layout.size()))
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.inner.with_lock(|alloc| alloc.free(ptr));
    }

    unsafe fn realloc(&self, ptr: *mut u8, _layout: Layout, new_size: usize) -> *mut u8 {
        self.ensure_init();
        self.inner
            .with_lock(|alloc| alloc.reallocate(ptr, new_size))
    }
}

#[cfg_attr(not(test), global_allocator)]
pub static ALLOCATOR: GlobalAllocator = GlobalAllocator::new();
