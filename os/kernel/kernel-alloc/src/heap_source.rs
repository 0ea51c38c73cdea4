//! The heap-growth primitive.
//!
//! The core allocator never touches memory it wasn't handed by a
//! [`HeapSource`]. This is the seam that lets the same placement,
//! coalescing, and free-list code run against a fixed `.bss` array inside
//! the kernel and against a growable `Vec<u8>` in host-side tests.

use crate::error::AllocError;

/// An abstract, monotonically-growable region of memory.
///
/// Implementations provide `extend` as the moral equivalent of `sbrk`: grow
/// the region by `n_bytes` and hand back the start address of the newly
/// added span. The region is allowed to relocate between calls to `extend`
/// (see [`VecHeapSource`]), but never while the caller holds pointers into
/// memory that has already been granted and not yet re-extended past.
pub trait HeapSource {
    /// Grow the managed region by `n_bytes`, returning the start of the new
    /// span, or [`AllocError::OutOfMemory`] if the region cannot grow further.
    fn extend(&mut self, n_bytes: usize) -> Result<*mut u8, AllocError>;

    /// Lowest address currently backing the region.
    fn heap_lo(&self) -> *const u8;

    /// One past the highest address currently backing the region.
    fn heap_hi(&self) -> *const u8;
}

/// Total size of the statically reserved heap.
const HEAP_SIZE: usize = 64 * 1024 * 1024; // 64 MiB

#[repr(align(16))]
struct HeapMem([u8; HEAP_SIZE]);

/// A [`HeapSource`] backed by a fixed-size, statically allocated byte array.
///
/// Used by the kernel binary: the backing storage lives in a dedicated
/// `.bss` section and is never reallocated, so `extend` can only ever hand
/// out more of the same fixed array until it is exhausted.
pub struct StaticHeapSource {
    used: usize,
}

#[unsafe(link_section = ".bss.heap")]
static mut HEAP: HeapMem = HeapMem([0; HEAP_SIZE]);

impl StaticHeapSource {
    /// Create a source with nothing yet handed out.
    pub const fn new() -> Self {
        Self { used: 0 }
    }

    fn base(&self) -> *mut u8 {
        unsafe { (&raw mut HEAP.0).cast::<u8>() }
    }
}

impl Default for StaticHeapSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapSource for StaticHeapSource {
    fn extend(&mut self, n_bytes: usize) -> Result<*mut u8, AllocError> {
        if self.used.saturating_add(n_bytes) > HEAP_SIZE {
            return Err(AllocError::OutOfMemory);
        }
        let start = unsafe { self.base().add(self.used) };
        self.used += n_bytes;
        Ok(start)
    }

    fn heap_lo(&self) -> *const u8 {
        self.base().cast_const()
    }

    fn heap_hi(&self) -> *const u8 {
        unsafe { self.base().add(self.used).cast_const() }
    }
}

// Safety: the region is only ever accessed through a single, lock-guarded
// `Allocator` instance; `StaticHeapSource` carries no interior mutability
// outside of that.
unsafe impl Send for StaticHeapSource {}

/// Capacity reserved up front by [`VecHeapSource`].
///
/// Reserved once and never exceeded in practice by the test suite, so the
/// backing `Vec` never reallocates: addresses handed out by `extend` stay
/// valid for the lifetime of the source, same as [`StaticHeapSource`].
#[cfg(test)]
const VEC_HEAP_CAPACITY: usize = 4 * 1024 * 1024;

/// A test-only [`HeapSource`] backed by a `Vec<u8>` with a fixed reserved
/// capacity.
///
/// The capacity is reserved in [`VecHeapSource::new`] and never grown past,
/// so unlike a naively `push`-based `Vec` user, the backing storage never
/// moves — tests may freely hold pointers derived from `extend` across
/// subsequent calls, exactly as the kernel's fixed `.bss` array allows.
#[cfg(test)]
pub struct VecHeapSource {
    buf: std::vec::Vec<u8>,
}

#[cfg(test)]
impl VecHeapSource {
    /// Create an empty source with [`VEC_HEAP_CAPACITY`] bytes reserved.
    pub fn new() -> Self {
        Self {
            buf: std::vec::Vec::with_capacity(VEC_HEAP_CAPACITY),
        }
    }
}

#[cfg(test)]
impl Default for VecHeapSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl HeapSource for VecHeapSource {
    fn extend(&mut self, n_bytes: usize) -> Result<*mut u8, AllocError> {
        let old_len = self.buf.len();
        if old_len + n_bytes > self.buf.capacity() {
            return Err(AllocError::OutOfMemory);
        }
        self.buf.resize(old_len + n_bytes, 0);
        Ok(unsafe { self.buf.as_mut_ptr().add(old_len) })
    }

    fn heap_lo(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    fn heap_hi(&self) -> *const u8 {
        unsafe { self.buf.as_ptr().add(self.buf.len()) }
    }
}
