//! # Spin Lock

use crate::RawSpin;
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

/// A tiny, RAII-style spinlock for short critical sections.
///
/// This lock is suitable for **uniprocessor** or early boot stages where:
/// - Preemption is either disabled or non-existent.
/// - Critical sections are very short (no I/O, no blocking).
///
/// Unlike [`crate::Mutex`], `SpinLock` is not generic over the raw lock —
/// it is always backed by [`RawSpin`] and exists as a small, dependency-free
/// convenience type with a closure-based [`with_lock`](Self::with_lock) helper
/// in addition to the usual guard-based API.
///
/// # Caveats
/// - Does **not** disable interrupts.
/// - Busy-waits with `spin_loop`, so keep critical sections small.
pub struct SpinLock<T> {
    raw: RawSpin,
    inner: UnsafeCell<T>,
}

// Safety: SpinLock provides mutual exclusion; it can be shared across threads as long as T is Send.
unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Create a new spinlock wrapping `inner`.
    pub const fn new(inner: T) -> Self {
        Self {
            raw: RawSpin::new(),
            inner: UnsafeCell::new(inner),
        }
    }

    /// Returns a mutable reference to the inner value.
    ///
    /// Because you hold `&mut self`, no other references can exist, so
    /// locking is unnecessary.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Acquires the lock and returns a guard that unlocks on drop.
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.raw.lock();
        SpinLockGuard { l: self }
    }

    /// Attempts to acquire the lock without blocking.
    ///
    /// Returns `Some(guard)` on success, or `None` if the lock was already held.
    #[inline]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self.raw.try_lock() {
            Some(SpinLockGuard { l: self })
        } else {
            None
        }
    }

    /// Execute `f` with exclusive access to the inner value.
    ///
    /// Convenience wrapper around [`lock`](Self::lock) for call sites that
    /// don't need to hold the guard across multiple statements.
    #[inline]
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }
}

/// A guard that releases a [`SpinLock`] when dropped.
///
/// Created by [`SpinLock::lock`] and [`SpinLock::try_lock`]. Implements
/// [`Deref`] and [`DerefMut`] to access the protected value.
pub struct SpinLockGuard<'a, T> {
    l: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the guard holds the lock exclusively.
        unsafe { &*self.l.inner.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard holds the lock exclusively.
        unsafe { &mut *self.l.inner.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // Safety: we are the holder of the lock.
        unsafe { self.l.raw.unlock() }
    }
}
