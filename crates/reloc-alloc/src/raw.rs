//! The raw allocator concept and typed array helpers.
//!
//! A [`RawAlloc`] hands out uninitialized, aligned blocks and takes them
//! back. It never constructs or destroys objects. Containers talk to it
//! through [`allocate_array`] and [`deallocate_array`], which size blocks in
//! object units and keep zero-sized requests away from the allocator.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::mem;
use std::ptr::NonNull;

use reloc_core::AllocError;

/// A source of raw, uninitialized memory blocks.
///
/// Two instances compare equal when a block obtained from one may be
/// released through the other. Stateless allocators are always equal.
///
/// # Safety
///
/// Implementations must return blocks that are valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not aliased by any
/// other live block, until passed back to `deallocate` on an equal instance.
pub unsafe trait RawAlloc: PartialEq {
    /// Acquire a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this instance (or an
    /// equal one) with the same `layout`, and not released since.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Layout of a block holding `count` objects of type `T`.
pub fn array_layout<T>(count: usize) -> Result<Layout, AllocError> {
    Layout::array::<T>(count).map_err(|_| AllocError::LayoutOverflow {
        count,
        elem_size: mem::size_of::<T>(),
    })
}

/// Allocate uninitialized room for `count` objects of type `T`.
///
/// Zero-sized requests (`count == 0` or a zero-sized `T`) return a dangling,
/// well-aligned pointer without touching the allocator.
pub fn allocate_array<T, A: RawAlloc + ?Sized>(
    alloc: &A,
    count: usize,
) -> Result<NonNull<T>, AllocError> {
    let layout = array_layout::<T>(count)?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    alloc.allocate(layout).map(NonNull::cast)
}

/// Release a block obtained from [`allocate_array`].
///
/// # Safety
///
/// `ptr` and `count` must match a previous `allocate_array::<T>` call on
/// `alloc` (or an equal allocator), and the block must not have been
/// released since. Live objects in the block are not dropped.
pub unsafe fn deallocate_array<T, A: RawAlloc + ?Sized>(alloc: &A, ptr: NonNull<T>, count: usize) {
    let Ok(layout) = array_layout::<T>(count) else {
        // allocate_array would have rejected this count.
        return;
    };
    if layout.size() == 0 {
        return;
    }
    // SAFETY: same layout as the matching allocate_array call, per caller contract.
    unsafe { alloc.deallocate(ptr.cast(), layout) }
}
