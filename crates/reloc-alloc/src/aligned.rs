//! The default allocator: plain heap blocks, with an over-aligned fallback.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;

use reloc_core::{AllocError, Relocate};

use crate::raw::RawAlloc;

/// Largest alignment the plain heap primitive is relied on to honor.
#[cfg(target_pointer_width = "64")]
pub const DEFAULT_NEW_ALIGNMENT: usize = 16;
/// Largest alignment the plain heap primitive is relied on to honor.
#[cfg(not(target_pointer_width = "64"))]
pub const DEFAULT_NEW_ALIGNMENT: usize = 8;

/// Stateless heap allocator.
///
/// Requests aligned to at most [`DEFAULT_NEW_ALIGNMENT`] go straight to the
/// global allocator. Stricter alignments over-allocate by `align` bytes,
/// align the returned pointer inside the block, and stash the original block
/// address in the word just below it.
///
/// All instances are interchangeable and compare equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AlignedAlloc;

impl AlignedAlloc {
    /// Create the allocator.
    pub const fn new() -> Self {
        Self
    }

    fn is_over_aligned(layout: Layout) -> bool {
        layout.align() > DEFAULT_NEW_ALIGNMENT
    }

    /// Layout of the padded block behind an over-aligned request.
    fn padded(layout: Layout) -> Result<Layout, AllocError> {
        let oom = AllocError::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        };
        let size = layout.size().checked_add(layout.align()).ok_or(oom)?;
        Layout::from_size_align(size, DEFAULT_NEW_ALIGNMENT).map_err(|_| oom)
    }
}

unsafe impl RawAlloc for AlignedAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0, "zero-sized blocks never reach the allocator");
        let oom = AllocError::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        };

        if !Self::is_over_aligned(layout) {
            // SAFETY: layout has non-zero size.
            let p = unsafe { alloc::alloc(layout) };
            return NonNull::new(p).ok_or_else(|| {
                tracing::debug!(size = layout.size(), align = layout.align(), "allocation failed");
                oom
            });
        }

        let padded = Self::padded(layout)?;
        // SAFETY: padded size is at least layout.align() > 0.
        let raw = unsafe { alloc::alloc(padded) };
        let Some(raw) = NonNull::new(raw) else {
            tracing::debug!(
                size = layout.size(),
                align = layout.align(),
                padded = padded.size(),
                "over-aligned allocation failed"
            );
            return Err(oom);
        };

        // raw is DEFAULT_NEW_ALIGNMENT-aligned, so the offset is a non-zero
        // multiple of it and leaves room for one usize below the result.
        let offset = layout.align() - (raw.as_ptr() as usize & (layout.align() - 1));
        // SAFETY: offset <= layout.align(), and the block holds
        // layout.size() + layout.align() bytes.
        let aligned = unsafe { raw.as_ptr().add(offset) };
        // SAFETY: offset >= DEFAULT_NEW_ALIGNMENT >= size_of::<usize>(), so
        // the slot lies inside the block and is usize-aligned.
        unsafe {
            aligned
                .sub(mem::size_of::<usize>())
                .cast::<*mut u8>()
                .write(raw.as_ptr());
        }
        // SAFETY: derived from a non-null pointer by an in-bounds offset.
        Ok(unsafe { NonNull::new_unchecked(aligned) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if !Self::is_over_aligned(layout) {
            // SAFETY: ptr came from alloc::alloc with this layout, per caller contract.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
            return;
        }
        let Ok(padded) = Self::padded(layout) else {
            // allocate refused this layout, so no such block exists.
            return;
        };
        // SAFETY: allocate stored the original block address just below ptr.
        let raw = unsafe {
            ptr.as_ptr()
                .sub(mem::size_of::<usize>())
                .cast::<*mut u8>()
                .read()
        };
        // SAFETY: raw came from alloc::alloc with the padded layout.
        unsafe { alloc::dealloc(raw, padded) };
    }
}

impl Relocate for AlignedAlloc {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, reloc_core::ElementError> {
        Ok(*src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{allocate_array, deallocate_array};

    #[repr(align(64))]
    struct CacheLine([u8; 64]);

    #[repr(align(4096))]
    struct Page(#[allow(dead_code)] u8);

    #[test]
    fn default_aligned_block_is_usable() {
        let a = AlignedAlloc::new();
        let p = allocate_array::<u64, _>(&a, 32).unwrap();
        assert_eq!(p.as_ptr() as usize % mem::align_of::<u64>(), 0);
        unsafe {
            for i in 0..32 {
                p.as_ptr().add(i).write(i as u64);
            }
            assert_eq!(p.as_ptr().add(31).read(), 31);
            deallocate_array(&a, p, 32);
        }
    }

    #[test]
    fn over_aligned_block_honors_alignment() {
        let a = AlignedAlloc;
        let mut blocks = Vec::new();
        for n in 1..8 {
            let p = allocate_array::<CacheLine, _>(&a, n).unwrap();
            assert_eq!(p.as_ptr() as usize % 64, 0);
            unsafe {
                for i in 0..n {
                    p.as_ptr().add(i).write(CacheLine([i as u8; 64]));
                }
                assert_eq!((*p.as_ptr().add(n - 1)).0[63], (n - 1) as u8);
            }
            blocks.push((p, n));
        }
        for (p, n) in blocks {
            unsafe { deallocate_array(&a, p, n) };
        }
    }

    #[test]
    fn page_aligned_block_honors_alignment() {
        let a = AlignedAlloc;
        let p = allocate_array::<Page, _>(&a, 3).unwrap();
        assert_eq!(p.as_ptr() as usize % 4096, 0);
        unsafe { deallocate_array(&a, p, 3) };
    }

    #[test]
    fn instances_are_interchangeable() {
        let a = AlignedAlloc::new();
        let b = AlignedAlloc::default();
        assert_eq!(a, b);
        let p = allocate_array::<CacheLine, _>(&a, 2).unwrap();
        unsafe { deallocate_array(&b, p, 2) };
    }

    #[test]
    fn allocator_is_trivially_relocatable() {
        assert!(reloc_core::is_trivially_relocatable::<AlignedAlloc>());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_power_of_two_alignment(shift in 0u32..13, size in 1usize..2048) {
                let align = 1usize << shift;
                let layout = Layout::from_size_align(size, align).unwrap();
                let a = AlignedAlloc;
                let p = a.allocate(layout).unwrap();
                prop_assert_eq!(p.as_ptr() as usize % align, 0);
                unsafe {
                    p.as_ptr().write_bytes(0xA5, size);
                    prop_assert_eq!(*p.as_ptr().add(size - 1), 0xA5);
                    a.deallocate(p, layout);
                }
            }
        }
    }
}
