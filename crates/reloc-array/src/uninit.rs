//! Algorithms over uninitialized storage.
//!
//! Every constructor here fills a run of uninitialized slots front to back
//! behind a [`PartialInit`] guard. If an element fails (error return) or
//! panics, the guard destroys the slots already constructed, in construction
//! order, and leaves the rest uninitialized. On success the guard is
//! disarmed and the caller owns the new elements.

#![allow(unsafe_code)]

use std::mem;
use std::ptr;

/// Destroys a constructed prefix unless disarmed.
pub(crate) struct PartialInit<T> {
    start: *mut T,
    len: usize,
}

impl<T> PartialInit<T> {
    /// # Safety
    ///
    /// `start` must be valid for writes of as many `T` as will be pushed.
    pub(crate) unsafe fn new(start: *mut T) -> Self {
        Self { start, len: 0 }
    }

    /// Construct the next slot.
    ///
    /// # Safety
    ///
    /// The slot at `start + len` must be uninitialized and in bounds.
    pub(crate) unsafe fn push(&mut self, value: T) {
        // SAFETY: per caller contract.
        unsafe { self.start.add(self.len).write(value) };
        self.len += 1;
    }

    /// Hand the constructed prefix to the caller.
    pub(crate) fn disarm(self) -> usize {
        let len = self.len;
        mem::forget(self);
        len
    }
}

impl<T> Drop for PartialInit<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `len` slots from `start` were constructed.
        unsafe { destroy_range(self.start, self.len) };
    }
}

/// Construct `n` elements at `dst` from `make(index)`.
///
/// # Safety
///
/// `dst` must be valid for writes of `n` elements, all uninitialized.
pub unsafe fn construct_with<T, E, F>(dst: *mut T, n: usize, mut make: F) -> Result<(), E>
where
    F: FnMut(usize) -> Result<T, E>,
{
    // SAFETY: per caller contract.
    let mut guard = unsafe { PartialInit::new(dst) };
    for i in 0..n {
        let value = make(i)?;
        // SAFETY: i < n and slot i is uninitialized.
        unsafe { guard.push(value) };
    }
    guard.disarm();
    Ok(())
}

/// Construct `n` clones of `value` at `dst`.
///
/// # Safety
///
/// As for [`construct_with`].
pub unsafe fn construct_fill<T: Clone>(dst: *mut T, n: usize, value: &T) {
    // SAFETY: per caller contract.
    let result: Result<(), std::convert::Infallible> =
        unsafe { construct_with(dst, n, |_| Ok(value.clone())) };
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// Clone every element of `src` into the slots at `dst`.
///
/// # Safety
///
/// `dst` must be valid for writes of `src.len()` elements, all
/// uninitialized, and must not overlap `src`.
pub unsafe fn construct_clone<T: Clone>(dst: *mut T, src: &[T]) {
    // SAFETY: per caller contract.
    let mut guard = unsafe { PartialInit::new(dst) };
    for item in src {
        // SAFETY: at most src.len() slots are written.
        unsafe { guard.push(item.clone()) };
    }
    guard.disarm();
}

/// Bulk byte copy of `src` into the slots at `dst`.
///
/// # Safety
///
/// As for [`construct_clone`].
pub unsafe fn construct_copy<T: Copy>(dst: *mut T, src: &[T]) {
    // SAFETY: non-overlapping per caller contract; T: Copy has no destructor.
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len()) };
}

/// Drop `n` live elements starting at `start`, front to back.
///
/// # Safety
///
/// `start` must point to `n` live elements, which are dead afterwards.
pub unsafe fn destroy_range<T>(start: *mut T, n: usize) {
    if !mem::needs_drop::<T>() {
        return;
    }
    // SAFETY: per caller contract.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, n)) };
}
