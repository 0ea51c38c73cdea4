//! # Boundary-tag heap allocator
//!
//! A general-purpose dynamic memory allocator for a contiguous,
//! monotonically expandable heap region. The core data structure is a
//! doubly-linked explicit free list threaded through boundary-tagged blocks:
//! every block — free or allocated — carries a header and footer word
//! encoding `(size, allocated)`, which is what makes coalescing with either
//! physical neighbor an O(1) operation regardless of free-list position.
//!
//! ```text
//! prologue   [block] [block] ... [block]   epilogue
//! +------+   +------+------+     +------+  +------+
//! | DSIZE|   | hdr  | ...  | ftr |      |  | size0|
//! +------+   +------+------+-----+      +  +------+
//! ```
//!
//! The heap itself is obtained from an external, growable backing store
//! abstracted behind [`heap_source::HeapSource`] — a fixed `.bss` array for
//! the kernel ([`heap_source::StaticHeapSource`]), a `Vec<u8>` for host-side
//! tests. [`Allocator`] is generic over this trait and otherwise holds no
//! dependency on any particular backing store; thread-safety is layered on
//! top separately by [`global::GlobalAllocator`], which guards a single
//! `Allocator<StaticHeapSource>` behind a `kernel_sync::SpinLock`.
//!
//! Component layout:
//! - [`block`]: header/footer read/write, block size and neighbor arithmetic.
//! - [`free_list`]: LIFO insert/remove on the explicit free list.
//! - [`coalesce`]: the four-case boundary-tag merge.
//! - [`placement`]: first-fit placement with splitting.
//! - [`heap_source`]: the abstract heap-growth primitive and its two impls.
//! - [`diagnostics`]: a read-only `HeapStats` snapshot for logging.
//! - [`global`]: the `#[global_allocator]` singleton.

#![cfg_attr(not(test), no_std)]

pub mod block;
pub mod coalesce;
pub mod diagnostics;
pub mod error;
pub mod free_list;
pub mod global;
pub mod heap_source;
pub mod placement;

use block::{DWORD, MIN_BLOCK, WORD};
use core::ptr;
use diagnostics::HeapStats;
use error::AllocError;
use heap_source::HeapSource;

pub use global::{GlobalAllocator, ALLOCATOR};

/// Default growth increment requested when neither a fit nor room at the
/// end of an existing request is found. Matches the reference allocator's
/// `CHUNKSIZE`.
const CHUNKSIZE: usize = 4096;

/// Round `payload_bytes` up to a block size that has room for a header,
/// footer, and at least two free-list link words, and is a multiple of
/// [`DWORD`].
fn adjusted_block_size(payload_bytes: usize) -> usize {
    let with_overhead = payload_bytes + DWORD;
    let rounded = with_overhead.div_ceil(DWORD) * DWORD;
    rounded.max(MIN_BLOCK)
}

/// A boundary-tag allocator over a heap obtained from `S`.
///
/// Single-threaded and non-reentrant by design — callers needing shared
/// access wrap an instance in their own synchronization, as
/// [`global::GlobalAllocator`] does with a spinlock. Nothing in this type
/// depends on `S` being any particular kind of storage; swap in
/// [`heap_source::VecHeapSource`] to unit test the algorithm on the host
/// without touching `no_std`/static-heap concerns at all.
pub struct Allocator<S: HeapSource> {
    source: S,
    free_head: *mut u8,
    prologue_bp: *mut u8,
    epilogue_hdr: *mut u8,
    extend_count: usize,
    initialized: bool,
}

// Safety: Allocator is Send when its heap source is; it holds no thread
// affinity of its own. It is intentionally not Sync — callers needing
// shared access must add their own locking (see `global::GlobalAllocator`).
unsafe impl<S: HeapSource + Send> Send for Allocator<S> {}

impl<S: HeapSource> Allocator<S> {
    /// Construct an allocator over `source`. The heap is not touched until
    /// [`Allocator::init`] runs.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            free_head: ptr::null_mut(),
            prologue_bp: ptr::null_mut(),
            epilogue_hdr: ptr::null_mut(),
            extend_count: 0,
            initialized: false,
        }
    }

    /// Whether [`Allocator::init`] has run successfully.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Lay down the prologue/epilogue sentinels and perform the initial
    /// heap extension. Idempotent: a second call on an already-initialized
    /// allocator is a no-op.
    pub fn init(&mut self) -> Result<(), AllocError> {
        if self.initialized {
            return Ok(());
        }

        let start = self.source.extend(4 * WORD)?;
        unsafe {
            ptr::write(start.cast::<usize>(), 0);
            let prologue_bp = start.add(2 * WORD);
            block::write_block(prologue_bp, DWORD, true);
            let epilogue_hdr = start.add(3 * WORD);
            block::write_epilogue(epilogue_hdr);

            self.prologue_bp = prologue_bp;
            self.epilogue_hdr = epilogue_hdr;
        }
        self.initialized = true;
        log::debug!("heap initialized at {:p}", start);

        self.extend(CHUNKSIZE)?;
        Ok(())
    }

    /// Grow the heap by at least `min_bytes` (rounded up to a [`DWORD`]
    /// multiple and to at least [`CHUNKSIZE`]), coalesce the new span with
    /// whatever free block preceded it, and return the (possibly merged)
    /// free block's payload pointer.
    pub fn extend(&mut self, min_bytes: usize) -> Result<*mut u8, AllocError> {
        let size = min_bytes.div_ceil(DWORD) * DWORD;
        let size = size.max(CHUNKSIZE);

        let bp = self.source.extend(size)?;
        unsafe {
            block::write_block(bp, size, false);
            let new_epilogue = block::header(block::next_phys(bp));
            block::write_epilogue(new_epilogue);
            self.epilogue_hdr = new_epilogue;
            self.extend_count += 1;
            log::trace!("heap extended by {size} bytes, new top {:p}", new_epilogue);
            Ok(coalesce::coalesce(&mut self.free_head, bp))
        }
    }

    /// Allocate `size` bytes, returning a payload pointer or null on
    /// out-of-memory. A `size` of zero returns null, matching `malloc`.
    pub fn allocate(&mut self, size: usize) -> *mut u8 {
        if size == 0 || !self.initialized {
            return ptr::null_mut();
        }

        let asize = adjusted_block_size(size);
        unsafe {
            let mut bp = free_list::find_fit(self.free_head, asize);
            if bp.is_null() {
                let grown = asize.max(CHUNKSIZE);
                bp = match self.extend(grown) {
                    Ok(p) => p,
                    Err(_) => {
                        log::warn!("allocate({size}): heap exhausted");
                        return ptr::null_mut();
                    }
                };
            }
            free_list::remove_free(&mut self.free_head, bp);
            placement::place(&mut self.free_head, bp, asize);
            bp
        }
    }

    /// Free a block previously returned by [`Allocator::allocate`] or
    /// [`Allocator::reallocate`]. A null `bp` is a no-op.
    pub fn free(&mut self, bp: *mut u8) {
        if bp.is_null() {
            return;
        }
        unsafe {
            let size = block::size(bp);
            block::write_block(bp, size, false);
            coalesce::coalesce(&mut self.free_head, bp);
        }
    }

    /// Resize the block at `bp` to `new_size` bytes.
    ///
    /// - `bp` null behaves like `allocate(new_size)`.
    /// - `new_size` zero behaves like `free(bp)` and returns null.
    /// - Shrinking in place is not attempted: a request with `new_size`
    ///   smaller than or equal to the current capacity returns `bp`
    ///   unchanged.
    /// - Growing first tries to absorb a free, physically-adjacent next
    ///   block; only if that isn't big enough does this fall back to
    ///   `allocate` + copy + `free`.
    pub fn reallocate(&mut self, bp: *mut u8, new_size: usize) -> *mut u8 {
        if bp.is_null() {
            return self.allocate(new_size);
        }
        if new_size == 0 {
            self.free(bp);
            return ptr::null_mut();
        }

        let asize = adjusted_block_size(new_size);
        unsafe {
            let old_size = block::size(bp);
            if old_size >= asize {
                return bp;
            }

            let next = block::next_phys(bp);
            if !block::is_alloc(next) {
                let combined = old_size + block::size(next);
                if combined >= asize {
                    free_list::remove_free(&mut self.free_head, next);
                    block::write_block(bp, combined, true);
                    placement::place(&mut self.free_head, bp, asize);
                    return bp;
                }
            }

            let new_bp = self.allocate(new_size);
            if new_bp.is_null() {
                return ptr::null_mut();
            }
            let copy_len = core::cmp::min(old_size - DWORD, new_size);
            ptr::copy_nonoverlapping(bp, new_bp, copy_len);
            self.free(bp);
            new_bp
        }
    }

    /// A read-only snapshot of current heap utilization.
    pub fn stats(&self) -> HeapStats {
        if !self.initialized {
            return HeapStats::default();
        }
        unsafe {
            let first = block::next_phys(self.prologue_bp);
            HeapStats::walk(first, self.epilogue_hdr, self.extend_count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap_source::VecHeapSource;

    fn new_allocator() -> Allocator<VecHeapSource> {
        let mut alloc = Allocator::new(VecHeapSource::new());
        alloc.init().expect("init");
        alloc
    }

    #[test]
    fn init_then_single_alloc_roundtrips() {
        let mut alloc = new_allocator();
        let p = alloc.allocate(64);
        assert!(!p.is_null());
        assert!(unsafe { block::is_alloc(p) });
        assert!(unsafe { block::size(p) } >= 64 + DWORD);
        alloc.free(p);
    }

    #[test]
    fn zero_size_allocate_returns_null() {
        let mut alloc = new_allocator();
        assert!(alloc.allocate(0).is_null());
    }

    #[test]
    fn allocations_do_not_overlap() {
        let mut alloc = new_allocator();
        let a = alloc.allocate(32);
        let b = alloc.allocate(32);
        assert!(!a.is_null() && !b.is_null());
        unsafe {
            let a_end = a.add(block::size(a) - WORD);
            assert!(a_end <= block::header(b));
        }
    }

    #[test]
    fn split_then_free_then_coalesce_is_reusable() {
        let mut alloc = new_allocator();
        let big = alloc.allocate(512);
        assert!(!big.is_null());
        let big_size = unsafe { block::size(big) };
        alloc.free(big);

        let reused = alloc.allocate(512);
        assert_eq!(reused, big, "freed block should be reused by first fit");
        assert_eq!(unsafe { block::size(reused) }, big_size);
    }

    #[test]
    fn lifo_free_list_prefers_most_recently_freed() {
        let mut alloc = new_allocator();
        let a = alloc.allocate(128);
        let b = alloc.allocate(128);
        alloc.free(a);
        let c = alloc.allocate(128);
        alloc.free(c);
        let d = alloc.allocate(128);
        assert_eq!(d, c, "most recently freed block should be found first");
        alloc.free(b);
        alloc.free(d);
    }

    #[test]
    fn heap_grows_when_no_fit_is_available() {
        let mut alloc = new_allocator();
        let before = alloc.stats().extend_count;
        let huge = alloc.allocate(CHUNKSIZE * 4);
        assert!(!huge.is_null());
        assert!(alloc.stats().extend_count > before);
        alloc.free(huge);
    }

    #[test]
    fn realloc_grows_in_place_into_free_next_block() {
        let mut alloc = new_allocator();
        let a = alloc.allocate(64);
        let b = alloc.allocate(64);
        alloc.free(b);

        let grown = alloc.reallocate(a, 64 + DWORD + WORD);
        assert_eq!(grown, a, "growth should absorb the adjacent free block in place");
    }

    #[test]
    fn realloc_falls_back_to_copy_when_no_room() {
        let mut alloc = new_allocator();
        let a = alloc.allocate(32);
        unsafe {
            for i in 0..32u8 {
                ptr::write(a.add(i as usize), i);
            }
        }
        // keep the next block allocated so in-place growth cannot happen
        let _pin = alloc.allocate(32);

        let grown = alloc.reallocate(a, 4096);
        assert!(!grown.is_null());
        assert_ne!(grown, a, "no adjacent room should force a copying realloc");
        unsafe {
            for i in 0..32u8 {
                assert_eq!(ptr::read(grown.add(i as usize)), i);
            }
        }
    }

    #[test]
    fn realloc_null_ptr_behaves_like_allocate() {
        let mut alloc = new_allocator();
        let p = alloc.reallocate(ptr::null_mut(), 16);
        assert!(!p.is_null());
        alloc.free(p);
    }

    #[test]
    fn realloc_zero_size_behaves_like_free() {
        let mut alloc = new_allocator();
        let p = alloc.allocate(16);
        assert!(alloc.reallocate(p, 0).is_null());
    }

    #[test]
    fn stats_account_for_every_byte_between_prologue_and_epilogue() {
        let mut alloc = new_allocator();
        let a = alloc.allocate(100);
        let b = alloc.allocate(200);
        alloc.free(a);

        let stats = alloc.stats();
        let span = unsafe {
            (alloc.epilogue_hdr as usize) - (block::next_phys(alloc.prologue_bp) as usize)
        };
        assert_eq!(stats.bytes_in_use + stats.bytes_free, span);
        alloc.free(b);
    }
}
