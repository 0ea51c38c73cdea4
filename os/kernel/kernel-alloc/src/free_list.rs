//! Explicit doubly-linked free list.
//!
//! Free blocks link to each other through their own payload words: the
//! first word holds `next`, the second holds `prev`. The list head always
//! points at the most recently freed block (LIFO insertion) — `O(1)` to
//! insert, and it keeps recently-touched blocks hot for the next request.
//!
//! Physical address order of list elements is arbitrary; only [`crate::block`]
//! cares about address order, for coalescing.

use core::ptr;

/// Read the `next` link out of a free block's payload.
///
/// # Safety
/// `bp` must be a free block with at least [`crate::block::MIN_BLOCK`] bytes.
#[inline]
unsafe fn get_next(bp: *mut u8) -> *mut u8 {
    unsafe { ptr::read(bp.cast::<*mut u8>()) }
}

/// Read the `prev` link out of a free block's payload.
///
/// # Safety
/// See [`get_next`].
#[inline]
unsafe fn get_prev(bp: *mut u8) -> *mut u8 {
    unsafe { ptr::read(bp.cast::<*mut u8>().add(1)) }
}

/// Write the `next` link into a free block's payload.
///
/// # Safety
/// See [`get_next`].
#[inline]
unsafe fn set_next(bp: *mut u8, next: *mut u8) {
    unsafe { ptr::write(bp.cast::<*mut u8>(), next) }
}

/// Write the `prev` link into a free block's payload.
///
/// # Safety
/// See [`get_next`].
#[inline]
unsafe fn set_prev(bp: *mut u8, prev: *mut u8) {
    unsafe { ptr::write(bp.cast::<*mut u8>().add(1), prev) }
}

/// Insert `bp` at the head of the free list.
///
/// # Safety
/// - `bp` must refer to a free block of at least [`crate::block::MIN_BLOCK`]
///   bytes that is not already on the list.
/// - `*head` must be the current, valid list head (or null).
pub unsafe fn add_free(head: &mut *mut u8, bp: *mut u8) {
    unsafe {
        if head.is_null() {
            set_next(bp, ptr::null_mut());
            set_prev(bp, ptr::null_mut());
        } else {
            set_prev(bp, ptr::null_mut());
            set_next(bp, *head);
            set_prev(*head, bp);
        }
        *head = bp;
    }
}

/// Remove `bp` from the free list, reconnecting its neighbors.
///
/// # Safety
/// `bp` must currently be a member of the list rooted at `*head`.
pub unsafe fn remove_free(head: &mut *mut u8, bp: *mut u8) {
    unsafe {
        let prev = get_prev(bp);
        let next = get_next(bp);
        match (prev.is_null(), next.is_null()) {
            (false, false) => {
                set_next(prev, next);
                set_prev(next, prev);
            }
            (false, true) => {
                set_next(prev, ptr::null_mut());
            }
            (true, false) => {
                set_prev(next, ptr::null_mut());
                *head = next;
            }
            (true, true) => {
                *head = ptr::null_mut();
            }
        }
    }
}

/// First-fit search: the first free block with `size(bp) >= asize`, or null.
///
/// Walks the list head-first while the current node is non-null — a node
/// at the tail of the list is still a candidate, unlike a search that stops
/// as soon as `next` is null (an off-by-one present in some first-fit
/// implementations that silently drops the last free block from
/// consideration).
///
/// # Safety
/// `*head` must be the current, valid list head (or null).
pub unsafe fn find_fit(head: *mut u8, asize: usize) -> *mut u8 {
    let mut node = head;
    while !node.is_null() {
        if unsafe { crate::block::size(node) } >= asize {
            return node;
        }
        node = unsafe { get_next(node) };
    }
    ptr::null_mut()
}
