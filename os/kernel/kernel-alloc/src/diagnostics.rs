//! Introspective heap statistics.
//!
//! Purely diagnostic: nothing here feeds back into allocation decisions.
//! A snapshot is computed by walking the physical block chain from the
//! prologue to the epilogue, summing allocated and free bytes as it goes.

use crate::block;

/// A point-in-time snapshot of heap utilization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes currently held by allocated blocks (including their header and
    /// footer overhead).
    pub bytes_in_use: usize,
    /// Bytes currently sitting in free blocks (including their header and
    /// footer overhead).
    pub bytes_free: usize,
    /// Number of times [`crate::Allocator::extend`] has grown the heap.
    pub extend_count: usize,
}

impl HeapStats {
    /// Walk the physical block chain starting at `first_bp` (the block
    /// immediately following the prologue) up to, but not including, the
    /// epilogue at `epilogue_hdr`, tallying allocated vs. free bytes.
    ///
    /// # Safety
    /// `first_bp` through `epilogue_hdr` must be a well-formed chain of
    /// boundary-tagged blocks terminated by a zero-size allocated epilogue
    /// header at `epilogue_hdr`.
    pub(crate) unsafe fn walk(first_bp: *mut u8, epilogue_hdr: *mut u8, extend_count: usize) -> Self {
        let mut stats = Self {
            extend_count,
            ..Self::default()
        };
        let mut bp = first_bp;
        unsafe {
            while block::header(bp) != epilogue_hdr {
                let size = block::size(bp);
                if block::is_alloc(bp) {
                    stats.bytes_in_use += size;
                } else {
                    stats.bytes_free += size;
                }
                bp = block::next_phys(bp);
            }
        }
        stats
    }
}
