//! Boundary-tag block layout.
//!
//! Every block on the heap carries a header word and a footer word, both
//! encoding `(size, allocated)`. Between them sits the payload: the bytes
//! handed to callers when the block is allocated, or the free-list link
//! words when it is free (see [`crate::free_list`]).
//!
//! ```text
//! +--------+----------------------------------+--------+
//! | header |             payload              | footer |
//! +--------+----------------------------------+--------+
//! ^                                                     ^
//! header(bp) = bp - WORD                  footer(bp) = bp + size(bp) - DWORD
//! ```
//!
//! All functions here are pure address arithmetic: they read and write
//! words at caller-supplied addresses and trust that the heap is already
//! consistent. None of them may be called on a dangling or misaligned `bp`.

use core::mem::size_of;
use core::ptr;

/// A machine word: the allocator's unit of alignment.
pub const WORD: usize = size_of::<usize>();

/// Two words — the allocator's alignment quantum. Every block size is a
/// positive multiple of `DWORD`.
pub const DWORD: usize = 2 * WORD;

/// Smallest possible block: header + two free-list link words + footer.
pub const MIN_BLOCK: usize = 2 * DWORD;

/// Low bit of a header/footer word marks the block as allocated.
const ALLOC_BIT: usize = 1;

#[inline]
const fn pack(size: usize, alloc: bool) -> usize {
    size | (alloc as usize)
}

#[inline]
const fn unpack_size(word: usize) -> usize {
    word & !ALLOC_BIT
}

#[inline]
const fn unpack_alloc(word: usize) -> bool {
    word & ALLOC_BIT != 0
}

/// Read a word at `p`.
///
/// # Safety
/// `p` must be valid for reads of `WORD` bytes and word-aligned.
#[inline]
unsafe fn get_word(p: *const u8) -> usize {
    unsafe { ptr::read(p.cast::<usize>()) }
}

/// Write a word at `p`.
///
/// # Safety
/// `p` must be valid for writes of `WORD` bytes and word-aligned.
#[inline]
unsafe fn put_word(p: *mut u8, value: usize) {
    unsafe { ptr::write(p.cast::<usize>(), value) }
}

/// Address of `bp`'s header word.
#[inline]
pub unsafe fn header(bp: *mut u8) -> *mut u8 {
    unsafe { bp.sub(WORD) }
}

/// Address of `bp`'s footer word, given its current `size`.
///
/// Needed (rather than deriving size from the header first) during writes
/// where the header is being rewritten to a new size in the same call.
#[inline]
pub unsafe fn footer_for_size(bp: *mut u8, size: usize) -> *mut u8 {
    unsafe { bp.add(size - DWORD) }
}

/// Address of `bp`'s footer word, using the size already stored in the header.
#[inline]
pub unsafe fn footer(bp: *mut u8) -> *mut u8 {
    unsafe { footer_for_size(bp, size(bp)) }
}

/// Total block size in bytes, including header and footer.
#[inline]
pub unsafe fn size(bp: *mut u8) -> usize {
    unsafe { unpack_size(get_word(header(bp))) }
}

/// Whether `bp` is currently marked allocated.
#[inline]
pub unsafe fn is_alloc(bp: *mut u8) -> bool {
    unsafe { unpack_alloc(get_word(header(bp))) }
}

/// Write both header and footer of `bp` as `(size, alloc)`.
///
/// # Safety
/// `bp` must have room for `size` bytes of block (header through footer)
/// and `size` must be a multiple of [`DWORD`] of at least [`MIN_BLOCK`]
/// (or [`DWORD`] for the prologue, which the caller writes directly).
#[inline]
pub unsafe fn write_block(bp: *mut u8, size: usize, alloc: bool) {
    unsafe {
        put_word(header(bp), pack(size, alloc));
        put_word(footer_for_size(bp, size), pack(size, alloc));
    }
}

/// Write a zero-size allocated epilogue header at `addr`.
///
/// The epilogue has no footer and no payload; it exists only to terminate
/// forward walks and to give coalescing a "prev alloc" boundary on the right.
#[inline]
pub unsafe fn write_epilogue(addr: *mut u8) {
    unsafe { put_word(addr, pack(0, true)) }
}

/// Payload pointer of the next physical block.
#[inline]
pub unsafe fn next_phys(bp: *mut u8) -> *mut u8 {
    unsafe { bp.add(size(bp)) }
}

/// Payload pointer of the previous physical block.
///
/// Reads the footer word immediately preceding `bp`'s header.
#[inline]
pub unsafe fn prev_phys(bp: *mut u8) -> *mut u8 {
    unsafe {
        let prev_size = unpack_size(get_word(bp.sub(DWORD)));
        bp.sub(prev_size)
    }
}
