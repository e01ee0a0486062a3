//! A stateful allocator that counts requests and can refuse them.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use reloc_alloc::{AlignedAlloc, RawAlloc};
use reloc_core::{AllocError, ElementError, Relocate};

/// Snapshot of a [`CountingAlloc`]'s counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    pub allocations: usize,
    pub deallocations: usize,
    /// Bytes currently handed out.
    pub live_bytes: usize,
    /// Requests refused on purpose.
    pub refused: usize,
}

#[derive(Default)]
struct Counters {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    live_bytes: Cell<usize>,
    refused: Cell<usize>,
    /// Remaining successful allocations before refusing.
    budget: Cell<Option<usize>>,
}

/// Allocator backed by [`AlignedAlloc`] that records every request.
///
/// Clones share counters and compare equal; independently created
/// instances do not.
#[derive(Clone, Default)]
pub struct CountingAlloc {
    counters: Rc<Counters>,
}

impl CountingAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` more allocations, then refuse every request.
    pub fn fail_after(&self, n: usize) {
        self.counters.budget.set(Some(n));
    }

    /// Stop refusing.
    pub fn unlimited(&self) {
        self.counters.budget.set(None);
    }

    pub fn stats(&self) -> AllocStats {
        let c = &self.counters;
        AllocStats {
            allocations: c.allocations.get(),
            deallocations: c.deallocations.get(),
            live_bytes: c.live_bytes.get(),
            refused: c.refused.get(),
        }
    }

    /// Blocks currently outstanding.
    pub fn outstanding(&self) -> usize {
        self.counters.allocations.get() - self.counters.deallocations.get()
    }
}

impl PartialEq for CountingAlloc {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.counters, &other.counters)
    }
}

impl fmt::Debug for CountingAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CountingAlloc").field(&self.stats()).finish()
    }
}

unsafe impl RawAlloc for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let c = &self.counters;
        if let Some(left) = c.budget.get() {
            if left == 0 {
                c.refused.set(c.refused.get() + 1);
                return Err(AllocError::OutOfMemory {
                    size: layout.size(),
                    align: layout.align(),
                });
            }
            c.budget.set(Some(left - 1));
        }
        let p = AlignedAlloc.allocate(layout)?;
        c.allocations.set(c.allocations.get() + 1);
        c.live_bytes.set(c.live_bytes.get() + layout.size());
        Ok(p)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let c = &self.counters;
        c.deallocations.set(c.deallocations.get() + 1);
        c.live_bytes.set(c.live_bytes.get() - layout.size());
        // SAFETY: every block was obtained from AlignedAlloc with this layout.
        unsafe { AlignedAlloc.deallocate(ptr, layout) }
    }
}

impl Relocate for CountingAlloc {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(src.clone())
    }
}
