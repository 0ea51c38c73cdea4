//! Allocator error type.

/// Failure modes for the fallible entry points ([`crate::Allocator::init`],
/// [`crate::Allocator::extend`]).
///
/// `allocate`/`reallocate` keep the spec's nil/null return convention instead
/// of surfacing this type, since they back `GlobalAlloc::alloc`, whose
/// contract requires a raw-pointer return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The backing [`crate::heap_source::HeapSource`] could not grow the
    /// managed region by the requested amount.
    #[error("heap source could not grow the managed region")]
    OutOfMemory,
}
