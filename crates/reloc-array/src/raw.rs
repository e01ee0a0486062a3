//! Storage block ownership and the relocation engine.
//!
//! [`RawBuf`] owns one uninitialized block (pointer, capacity, allocator)
//! but not the elements in it; the container tracks how many slots are live.
//! [`RawBuf::relocate`] is the single place where live elements move to a new
//! block:
//!
//! ```text
//! old: [ a b c | d e ]              len = 5, gap at 3
//!        |  |  |  |  |
//!        v  v  v  v  v
//! new: [ a b c _ _ d e _ _ ]        gap.len = 2, new_cap = 9
//! ```
//!
//! Trivially relocatable types move with two bulk byte copies and the old
//! slots are abandoned. Other types move element by element; the old block
//! is only destroyed and released once every element has a copy in the new
//! block, so a failure leaves the container exactly as it was.

#![allow(unsafe_code)]

use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use reloc_alloc::{allocate_array, deallocate_array, RawAlloc};
use reloc_core::{ArrayError, ElementError, Relocate};

use crate::config::GrowthConfig;
use crate::pos::AllocToken;
use crate::uninit::{destroy_range, PartialInit};

/// An uninitialized run of slots left open during relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Gap {
    /// Index in the new block where the gap starts.
    pub at: usize,
    /// Number of slots left uninitialized.
    pub len: usize,
}

impl Gap {
    /// No gap: elements keep their indices.
    pub fn none(len: usize) -> Self {
        Self { at: len, len: 0 }
    }
}

/// Largest element count a block of `T` can hold.
pub(crate) const fn max_capacity<T>() -> usize {
    match mem::size_of::<T>() {
        0 => usize::MAX,
        size => isize::MAX as usize / size,
    }
}

/// A freshly allocated block, released on drop unless kept.
struct NewBlock<'a, T, A: RawAlloc> {
    alloc: &'a A,
    ptr: NonNull<T>,
    cap: usize,
}

impl<'a, T, A: RawAlloc> NewBlock<'a, T, A> {
    fn allocate(alloc: &'a A, cap: usize) -> Result<Self, ArrayError> {
        let ptr = allocate_array::<T, A>(alloc, cap)?;
        Ok(Self { alloc, ptr, cap })
    }

    fn keep(self) -> NonNull<T> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl<T, A: RawAlloc> Drop for NewBlock<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: allocated by allocate_array with this capacity.
        unsafe { deallocate_array(self.alloc, self.ptr, self.cap) };
    }
}

/// Owner of one storage block.
pub(crate) struct RawBuf<T, A: RawAlloc> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    #[cfg(debug_assertions)]
    token: AllocToken,
    _owns: PhantomData<T>,
}

// SAFETY: RawBuf uniquely owns its block, like Box<[T]>.
unsafe impl<T: Send, A: RawAlloc + Send> Send for RawBuf<T, A> {}
// SAFETY: shared access only hands out shared references to elements.
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for RawBuf<T, A> {}

impl<T, A: RawAlloc> RawBuf<T, A> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: if Self::IS_ZST { usize::MAX } else { 0 },
            alloc,
            #[cfg(debug_assertions)]
            token: AllocToken::fresh(),
            _owns: PhantomData,
        }
    }

    pub fn with_capacity_in(cap: usize, alloc: A) -> Result<Self, ArrayError> {
        let mut buf = Self::new_in(alloc);
        if cap > buf.cap {
            if cap > max_capacity::<T>() {
                return Err(ArrayError::CapacityOverflow { requested: cap });
            }
            buf.ptr = allocate_array::<T, A>(&buf.alloc, cap)?;
            buf.cap = cap;
            buf.renew_token();
        }
        Ok(buf)
    }

    #[inline]
    pub fn ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Identity of the current block.
    #[inline]
    pub fn token(&self) -> AllocToken {
        #[cfg(debug_assertions)]
        {
            self.token
        }
        #[cfg(not(debug_assertions))]
        {
            AllocToken::NONE
        }
    }

    fn renew_token(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.token = AllocToken::fresh();
        }
    }

    /// Make room for `len + additional` elements, growing by `growth`.
    pub fn grow_for(
        &mut self,
        len: usize,
        additional: usize,
        growth: &GrowthConfig,
    ) -> Result<(), ArrayError>
    where
        T: Relocate,
    {
        let required = self.required(len, additional)?;
        if required <= self.cap {
            return Ok(());
        }
        let new_cap = growth
            .grown_capacity(self.cap, required)
            .min(max_capacity::<T>());
        // SAFETY: len live elements, no gap.
        unsafe { self.relocate(len, new_cap, Gap::none(len)) }
    }

    /// Make the capacity exactly `new_cap` if it is currently smaller.
    pub fn reserve_exact(&mut self, len: usize, new_cap: usize) -> Result<(), ArrayError>
    where
        T: Relocate,
    {
        if new_cap <= self.cap {
            return Ok(());
        }
        if new_cap > max_capacity::<T>() {
            return Err(ArrayError::CapacityOverflow { requested: new_cap });
        }
        // SAFETY: len live elements, no gap.
        unsafe { self.relocate(len, new_cap, Gap::none(len)) }
    }

    /// Capacity that fits `len + additional`, or the overflow error.
    pub fn required(&self, len: usize, additional: usize) -> Result<usize, ArrayError> {
        match len.checked_add(additional) {
            Some(n) if n <= max_capacity::<T>() => Ok(n),
            _ => Err(ArrayError::CapacityOverflow {
                requested: len.saturating_add(additional),
            }),
        }
    }

    /// Reduce the capacity to `len`; an empty buffer gives its block back.
    pub fn shrink_to(&mut self, len: usize) -> Result<(), ArrayError>
    where
        T: Relocate,
    {
        if Self::IS_ZST || len == self.cap {
            return Ok(());
        }
        if len == 0 {
            self.release();
            return Ok(());
        }
        // SAFETY: len live elements, no gap.
        unsafe { self.relocate(len, len, Gap::none(len)) }
    }

    /// Move the `len` live elements into a new block of `new_cap` slots,
    /// leaving `gap` uninitialized.
    ///
    /// On success the old block is released and a new token is issued. On
    /// failure nothing has changed.
    ///
    /// # Safety
    ///
    /// Slots `[0, len)` must be live, `gap.at <= len` and
    /// `len + gap.len <= new_cap`.
    pub unsafe fn relocate(
        &mut self,
        len: usize,
        new_cap: usize,
        gap: Gap,
    ) -> Result<(), ArrayError>
    where
        T: Relocate,
    {
        debug_assert!(gap.at <= len);
        debug_assert!(len + gap.len <= new_cap);
        if Self::IS_ZST {
            return Ok(());
        }

        let old_cap = self.cap;
        let block = NewBlock::<T, A>::allocate(&self.alloc, new_cap)?;
        let old = self.ptr.as_ptr();
        let new = block.ptr.as_ptr();

        if T::TRIVIAL {
            // SAFETY: distinct blocks; both runs are in bounds of either block.
            unsafe {
                std::ptr::copy_nonoverlapping(old, new, gap.at);
                std::ptr::copy_nonoverlapping(
                    old.add(gap.at),
                    new.add(gap.at + gap.len),
                    len - gap.at,
                );
            }
        } else {
            // SAFETY: old holds len live elements, new is uninitialized.
            if let Err(e) = unsafe { move_construct_around(old, new, len, gap) } {
                tracing::debug!(
                    len,
                    old_cap,
                    new_cap,
                    error = %e,
                    "relocation rolled back"
                );
                return Err(e.into());
            }
            // SAFETY: every old element now has a copy in the new block.
            unsafe { destroy_range(old, len) };
        }

        let new = block.keep();
        self.release();
        self.ptr = new;
        self.cap = new_cap;
        self.renew_token();
        tracing::trace!(
            len,
            old_cap,
            new_cap,
            gap = gap.len,
            trivial = T::TRIVIAL,
            "relocated"
        );
        Ok(())
    }

    /// Give the block back to the allocator. Live elements must already be
    /// gone or moved out.
    pub fn release(&mut self) {
        if Self::IS_ZST || self.cap == 0 {
            return;
        }
        // SAFETY: ptr/cap describe the block we allocated.
        unsafe { deallocate_array(&self.alloc, self.ptr, self.cap) };
        self.ptr = NonNull::dangling();
        self.cap = 0;
        self.renew_token();
    }
}

/// Element-wise half of [`RawBuf::relocate`]: build copies of `old[..len]` in
/// `new`, skipping `gap`. On error the copies built so far are destroyed.
///
/// # Safety
///
/// As for [`RawBuf::relocate`], with `new` freshly allocated.
unsafe fn move_construct_around<T: Relocate>(
    old: *mut T,
    new: *mut T,
    len: usize,
    gap: Gap,
) -> Result<(), ElementError> {
    // SAFETY: new has room for len + gap.len elements.
    let mut head = unsafe { PartialInit::new(new) };
    for i in 0..gap.at {
        // SAFETY: i < gap.at <= len, old[i] is live.
        unsafe { head.push(T::move_construct(&mut *old.add(i))?) };
    }
    // SAFETY: gap.at + gap.len + (len - gap.at) <= new_cap.
    let mut tail = unsafe { PartialInit::new(new.add(gap.at + gap.len)) };
    for i in gap.at..len {
        // SAFETY: i < len, old[i] is live.
        unsafe { tail.push(T::move_construct(&mut *old.add(i))?) };
    }
    tail.disarm();
    head.disarm();
    Ok(())
}

impl<T, A: RawAlloc> Drop for RawBuf<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}
