//! The dynamic array.
//!
//! [`DynArray`] stores `len` live elements at the front of a block of
//! `capacity` slots. The block is allocated on the first operation that
//! needs room and released on drop. Capacity only grows, except through
//! [`DynArray::shrink_to_fit`].
//!
//! Operations that may allocate or run a relocation hook return
//! `Result<_, ArrayError>`. Unless documented otherwise they give the strong
//! guarantee: on error the array is exactly as it was before the call.
//!
//! | Operation | On error |
//! |-----------|----------|
//! | `push`, `push_with`, `append_*`, `resize*`, `reserve` | unchanged |
//! | `insert*` that reallocates, or of trivial types | unchanged |
//! | `insert*` of non-trivial types within capacity | same length, contents unspecified |
//! | `erase_unstable` | unchanged |
//! | `assign*` | valid, contents unspecified |
//! | `erase*`, `retain`, `dedup*` on non-trivial types | valid, contents unspecified |

#![allow(unsafe_code)]

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr;
use std::slice;

use reloc_alloc::{AlignedAlloc, RawAlloc};
use reloc_core::{ArrayError, ElementError, Relocate};
use smallvec::SmallVec;

use crate::config::GrowthConfig;
use crate::into_iter::IntoIter;
use crate::pos::Pos;
use crate::raw::{max_capacity, Gap, RawBuf};
use crate::uninit::{self, destroy_range, PartialInit};

/// Number of inserted elements buffered inline before the gap is opened.
const INSERT_INLINE: usize = 8;

/// A growable contiguous array that relocates elements according to their
/// [`Relocate`] declaration.
///
/// ```
/// use reloc_array::DynArray;
///
/// let mut a: DynArray<u32> = DynArray::new();
/// a.append_iter([10, 20, 30, 40, 50])?;
/// a.erase(a.pos(2))?;
/// assert_eq!(a, [10, 20, 40, 50]);
///
/// let last = a.erase_unstable(0)?;
/// assert_eq!(last, 10);
/// assert_eq!(a, [50, 20, 40]);
/// # Ok::<(), reloc_core::ArrayError>(())
/// ```
pub struct DynArray<T, A: RawAlloc = AlignedAlloc> {
    buf: RawBuf<T, A>,
    len: usize,
    growth: GrowthConfig,
}

impl<T> DynArray<T> {
    /// Empty array using the default allocator. Does not allocate.
    pub fn new() -> Self {
        Self::new_in(AlignedAlloc)
    }

    /// Empty array with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self, ArrayError> {
        Self::with_capacity_in(capacity, AlignedAlloc)
    }

    /// `n` clones of `value`.
    pub fn from_elem(n: usize, value: T) -> Result<Self, ArrayError>
    where
        T: Clone + Relocate,
    {
        let mut a = Self::with_capacity(n)?;
        a.resize(n, value)?;
        Ok(a)
    }

    /// `n` default-constructed elements.
    pub fn with_len(n: usize) -> Result<Self, ArrayError>
    where
        T: Default + Relocate,
    {
        let mut a = Self::with_capacity(n)?;
        a.resize_default(n)?;
        Ok(a)
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: RawAlloc> DynArray<T, A> {
    /// Empty array using `alloc`. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self::with_config_in(GrowthConfig::default(), alloc)
    }

    /// Empty array using `alloc` and the given growth policy.
    pub fn with_config_in(growth: GrowthConfig, alloc: A) -> Self {
        Self {
            buf: RawBuf::new_in(alloc),
            len: 0,
            growth,
        }
    }

    /// Empty array using `alloc` with room for exactly `capacity` elements.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, ArrayError> {
        Ok(Self {
            buf: RawBuf::with_capacity_in(capacity, alloc)?,
            len: 0,
            growth: GrowthConfig::default(),
        })
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the current block.
    ///
    /// Zero-sized element types report `usize::MAX`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Slots available before the next growth.
    #[inline]
    pub fn spare_capacity(&self) -> usize {
        self.buf.capacity() - self.len
    }

    /// The growth policy.
    pub fn growth_config(&self) -> &GrowthConfig {
        &self.growth
    }

    /// The allocator instance.
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Pointer to the first slot. Dangling when nothing is allocated.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.ptr()
    }

    /// Mutable pointer to the first slot.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.ptr()
    }

    /// The live elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [0, len) are live and the pointer is aligned and non-null.
        unsafe { slice::from_raw_parts(self.buf.ptr(), self.len) }
    }

    /// The live elements, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for as_slice, and we hold &mut self.
        unsafe { slice::from_raw_parts_mut(self.buf.ptr(), self.len) }
    }

    /// Checked access.
    pub fn at(&self, index: usize) -> Result<&T, ArrayError> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(ArrayError::OutOfRange { index, len })
    }

    /// Checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(ArrayError::OutOfRange { index, len })
    }

    /// First element.
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// First element, mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    /// Last element.
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Last element, mutably.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Position of the first element.
    pub fn begin(&self) -> Pos {
        Pos::new(0, self.buf.token())
    }

    /// Position one past the last element.
    pub fn end(&self) -> Pos {
        Pos::new(self.len, self.buf.token())
    }

    /// Position of `index`. Not checked until used.
    pub fn pos(&self, index: usize) -> Pos {
        Pos::new(index, self.buf.token())
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot len was live and is now outside the live range.
        Some(unsafe { ptr::read(self.buf.ptr().add(self.len)) })
    }

    /// Destroy elements from `len` on. No effect if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        // Shrink first: a panicking destructor leaks the rest instead of
        // dropping them twice.
        self.len = len;
        // SAFETY: [len, len + tail) were live.
        unsafe { destroy_range(self.buf.ptr().add(len), tail) };
    }

    /// Destroy all elements. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Keep the elements for which `keep` returns `true`, in order.
    ///
    /// Returns the number removed. Errors only come from relocation hooks of
    /// non-trivial types, which leave every element live but the order of
    /// survivors unspecified.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<usize, ArrayError>
    where
        T: Relocate,
        F: FnMut(&T) -> bool,
    {
        self.compact_by(|_, cur| keep(cur))
    }

    /// Remove consecutive elements for which `same(current, previous_kept)`
    /// returns `true`. Returns the number removed.
    pub fn dedup_by<F>(&mut self, mut same: F) -> Result<usize, ArrayError>
    where
        T: Relocate,
        F: FnMut(&mut T, &mut T) -> bool,
    {
        self.compact_by(|prev, cur| match prev {
            Some(prev) => !same(cur, prev),
            None => true,
        })
    }

    /// Remove consecutive equal elements. Returns the number removed.
    pub fn dedup(&mut self) -> Result<usize, ArrayError>
    where
        T: Relocate + PartialEq,
    {
        self.dedup_by(|a, b| a == b)
    }

    /// Single forward pass shared by `retain` and `dedup_by`. `keep` sees the
    /// last kept element and the candidate.
    fn compact_by<F>(&mut self, mut keep: F) -> Result<usize, ArrayError>
    where
        T: Relocate,
        F: FnMut(Option<&mut T>, &mut T) -> bool,
    {
        let len = self.len;
        let mut write = 0;
        for read in 0..len {
            let (kept, rest) = self.as_mut_slice().split_at_mut(read);
            let cur = &mut rest[0];
            let prev = if write > 0 {
                Some(&mut kept[write - 1])
            } else {
                None
            };
            if !keep(prev, cur) {
                continue;
            }
            if write != read {
                if T::TRIVIAL {
                    mem::swap(&mut kept[write], cur);
                } else {
                    kept[write] = T::move_construct(cur)?;
                }
            }
            write += 1;
        }
        self.truncate(write);
        Ok(len - write)
    }

    /// Deep copy into fresh storage from a clone of the allocator.
    pub fn try_clone(&self) -> Result<Self, ArrayError>
    where
        T: Clone,
        A: Clone,
    {
        let mut out = Self {
            buf: RawBuf::with_capacity_in(self.len, self.allocator().clone())?,
            len: 0,
            growth: self.growth,
        };
        // SAFETY: out has room for self.len elements, none live.
        unsafe { uninit::construct_clone(out.buf.ptr(), self.as_slice()) };
        out.len = self.len;
        Ok(out)
    }

    /// Move the contents out, leaving an empty array with the same allocator
    /// and growth policy.
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let empty = Self::with_config_in(self.growth, self.allocator().clone());
        mem::replace(self, empty)
    }

    /// Take the storage out without running `Drop`.
    pub(crate) fn into_raw_parts(self) -> (RawBuf<T, A>, usize) {
        let me = ManuallyDrop::new(self);
        // SAFETY: me is never used or dropped again.
        let buf = unsafe { ptr::read(&me.buf) };
        (buf, me.len)
    }
}

impl<T: Relocate, A: RawAlloc> DynArray<T, A> {
    /// Append `value`.
    ///
    /// Amortized O(1). If growing fails the value is dropped and the array
    /// is unchanged.
    pub fn push(&mut self, value: T) -> Result<(), ArrayError> {
        if self.len == self.buf.capacity() {
            self.buf.grow_for(self.len, 1, &self.growth)?;
        }
        // SAFETY: len < capacity, slot len is uninitialized.
        unsafe { self.buf.ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Construct a new last element in place.
    ///
    /// Room is made before `make` runs; if `make` fails the capacity may
    /// have grown but the length is unchanged.
    pub fn push_with<F>(&mut self, make: F) -> Result<&mut T, ArrayError>
    where
        F: FnOnce() -> Result<T, ElementError>,
    {
        if self.len == self.buf.capacity() {
            self.buf.grow_for(self.len, 1, &self.growth)?;
        }
        let value = make()?;
        // SAFETY: len < capacity, slot len is uninitialized.
        let slot = unsafe { self.buf.ptr().add(self.len) };
        unsafe { slot.write(value) };
        self.len += 1;
        // SAFETY: slot was just initialized and is owned by self.
        Ok(unsafe { &mut *slot })
    }

    /// Append every item of `iter`.
    ///
    /// Pre-sizes once from the iterator's lower size bound. On error the
    /// items appended so far are destroyed.
    pub fn append_iter<I>(&mut self, iter: I) -> Result<(), ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        self.append_fallible(iter.into_iter().map(Ok::<T, ArrayError>))
    }

    /// Append every item of a fallible sequence, stopping at the first
    /// error.
    ///
    /// On error the items appended so far are destroyed and the error is
    /// returned unchanged.
    pub fn append_fallible<I, E>(&mut self, iter: I) -> Result<(), ArrayError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        E: Into<ArrayError>,
    {
        let iter = iter.into_iter();
        let start = self.len;
        let (lower, _) = iter.size_hint();
        self.buf.grow_for(self.len, lower, &self.growth)?;
        for item in iter {
            let pushed = item.map_err(Into::into).and_then(|v| self.push(v));
            if let Err(e) = pushed {
                self.truncate(start);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Append clones of `items`.
    pub fn append_slice(&mut self, items: &[T]) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        self.buf.grow_for(self.len, items.len(), &self.growth)?;
        // SAFETY: room for items.len() uninitialized slots after len; a
        // panicking clone is rolled back by the construction guard.
        unsafe { uninit::construct_clone(self.buf.ptr().add(self.len), items) };
        self.len += items.len();
        Ok(())
    }

    /// Append `items` with one bulk byte copy.
    pub fn append_copied(&mut self, items: &[T]) -> Result<(), ArrayError>
    where
        T: Copy,
    {
        self.buf.grow_for(self.len, items.len(), &self.growth)?;
        // SAFETY: room for items.len() uninitialized slots after len.
        unsafe { uninit::construct_copy(self.buf.ptr().add(self.len), items) };
        self.len += items.len();
        Ok(())
    }

    /// Replace the contents with `iter`.
    ///
    /// With an exact size hint larger than the capacity, the old elements
    /// are destroyed and exactly enough room is allocated. With an exact
    /// hint that fits, existing elements are overwritten in place. A
    /// sequence of unknown length clears the array and appends.
    ///
    /// Weak guarantee: on error the array holds some valid mix of old and
    /// new elements.
    pub fn assign<I>(&mut self, iter: I) -> Result<(), ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        self.assign_fallible(iter.into_iter().map(Ok::<T, ArrayError>))
    }

    /// [`assign`](Self::assign) from a fallible sequence.
    pub fn assign_fallible<I, E>(&mut self, iter: I) -> Result<(), ArrayError>
    where
        I: IntoIterator<Item = Result<T, E>>,
        E: Into<ArrayError>,
    {
        let iter = iter.into_iter();
        match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                if lower > self.buf.capacity() {
                    self.clear();
                    self.buf.reserve_exact(0, lower)?;
                }
            }
            _ => self.clear(),
        }
        let mut written = 0;
        for item in iter {
            let value = match item {
                Ok(value) => value,
                Err(e) => return Err(e.into()),
            };
            if written < self.len {
                self.as_mut_slice()[written] = value;
            } else {
                self.push(value)?;
            }
            written += 1;
        }
        self.truncate(written);
        Ok(())
    }

    /// Insert `value` before `pos`, shifting later elements right.
    ///
    /// Returns the position of the new element. With spare capacity the tail
    /// shifts in place and positions stay valid: trivially relocatable types
    /// with one byte move, other types element by element through their
    /// relocation hook. Otherwise every element moves into a larger block
    /// around the new slot, which invalidates every position.
    ///
    /// On error the array is unchanged, except when a relocation hook fails
    /// while an in-place shift is moving elements that stay within the
    /// length: then the length is unchanged and the contents are unspecified.
    ///
    /// # Panics
    ///
    /// If `pos` is stale or past the end (staleness only in debug builds).
    #[track_caller]
    pub fn insert(&mut self, pos: Pos, value: T) -> Result<Pos, ArrayError> {
        let at = pos.check_bound(self.buf.token(), self.len);
        self.open_gap(at, 1)?;
        // SAFETY: open_gap left slot `at` uninitialized.
        unsafe { self.buf.ptr().add(at).write(value) };
        self.len += 1;
        Ok(self.pos(at))
    }

    /// Insert every item of `iter` before `pos`, in order.
    ///
    /// The items are collected first, so the gap is opened once and an
    /// iterator that panics leaves the array untouched.
    ///
    /// # Panics
    ///
    /// As for [`insert`](Self::insert).
    #[track_caller]
    pub fn insert_iter<I>(&mut self, pos: Pos, iter: I) -> Result<Pos, ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        let at = pos.check_bound(self.buf.token(), self.len);
        let items: SmallVec<[T; INSERT_INLINE]> = iter.into_iter().collect();
        let n = items.len();
        if n == 0 {
            return Ok(self.pos(at));
        }
        self.open_gap(at, n)?;
        // SAFETY: at <= len < capacity.
        let dst = unsafe { self.buf.ptr().add(at) };
        for (i, item) in items.into_iter().enumerate() {
            // SAFETY: open_gap left n uninitialized slots at `at`.
            unsafe { dst.add(i).write(item) };
        }
        self.len += n;
        Ok(self.pos(at))
    }

    /// Leave `n` uninitialized slots at `at`, with `[at, len)` moved to
    /// `[at + n, len + n)`. `self.len` is not updated.
    fn open_gap(&mut self, at: usize, n: usize) -> Result<(), ArrayError> {
        let required = self.buf.required(self.len, n)?;
        let cap = self.buf.capacity();
        if required <= cap {
            if !T::TRIVIAL && mem::size_of::<T>() != 0 {
                return self.shift_tail(at, n);
            }
            let p = self.buf.ptr();
            // SAFETY: required <= cap, so the shifted tail stays in bounds.
            unsafe { ptr::copy(p.add(at), p.add(at + n), self.len - at) };
            return Ok(());
        }
        let new_cap = self
            .growth
            .grown_capacity(cap, required)
            .min(max_capacity::<T>());
        // SAFETY: [0, len) live, at <= len, len + n <= new_cap.
        unsafe { self.buf.relocate(self.len, new_cap, Gap { at, len: n }) }
    }

    /// [`open_gap`](Self::open_gap) within the current block for types that
    /// move through their relocation hook. Requires `len + n <= capacity`.
    ///
    /// The last `min(n, tail)` elements are move-constructed into spare
    /// slots first; a failure there leaves the array untouched. The rest are
    /// move-assigned from the back; a failure there keeps the length and
    /// every element live, with the contents unspecified.
    fn shift_tail(&mut self, at: usize, n: usize) -> Result<(), ArrayError> {
        let len = self.len;
        let tail = len - at;
        let spill = tail.min(n);
        let p = self.buf.ptr();

        // SAFETY: slots [len, len + n) are spare.
        let mut spilled = unsafe { PartialInit::new(p.add(len - spill + n)) };
        for i in len - spill..len {
            // SAFETY: slot i is live and its destination i + n is spare.
            unsafe { spilled.push(T::move_construct(&mut *p.add(i))?) };
        }
        spilled.disarm();

        if spill < tail {
            // SAFETY: spill == n here, so [0, len + n) are all live.
            let s = unsafe { slice::from_raw_parts_mut(p, len + n) };
            for i in (at..len - n).rev() {
                let (front, back) = s.split_at_mut(i + n);
                match T::move_construct(&mut front[i]) {
                    Ok(moved) => back[0] = moved,
                    Err(e) => {
                        // SAFETY: the spilled elements sit past the length.
                        unsafe { destroy_range(p.add(len), n) };
                        return Err(e.into());
                    }
                }
            }
        }

        // A panicking destructor leaks the shifted tail instead of double
        // dropping it.
        self.len = at;
        // SAFETY: [at, at + spill) hold superseded moved-from elements.
        unsafe { destroy_range(p.add(at), spill) };
        self.len = len;
        Ok(())
    }

    /// Remove the element at `pos`, shifting later elements left.
    ///
    /// Returns the position that now holds the element after the removed
    /// one.
    ///
    /// # Panics
    ///
    /// If `pos` is stale or does not refer to a live element.
    #[track_caller]
    pub fn erase(&mut self, pos: Pos) -> Result<Pos, ArrayError> {
        let at = pos.check_deref(self.buf.token(), self.len);
        self.erase_indices(at, at + 1)
    }

    /// Remove `[first, last)`.
    ///
    /// Trivially relocatable types are destroyed and the tail is shifted with
    /// one byte move; this cannot fail. Other types shift element by element
    /// through their relocation hook; a failing hook leaves every element
    /// live but the contents unspecified.
    ///
    /// # Panics
    ///
    /// If either position is stale or past the end, or `first > last`.
    #[track_caller]
    pub fn erase_range(&mut self, first: Pos, last: Pos) -> Result<Pos, ArrayError> {
        let token = self.buf.token();
        let from = first.check_bound(token, self.len);
        let to = last.check_bound(token, self.len);
        assert!(from <= to, "erase range start {from} is after end {to}");
        self.erase_indices(from, to)
    }

    fn erase_indices(&mut self, first: usize, last: usize) -> Result<Pos, ArrayError> {
        let n = last - first;
        if n == 0 {
            return Ok(self.pos(first));
        }
        if T::TRIVIAL {
            let tail = self.len - last;
            let p = self.buf.ptr();
            // A panicking destructor leaks instead of double dropping.
            self.len = first;
            let guard = CloseGap {
                ptr: p,
                first,
                last,
                tail,
                len: &mut self.len,
            };
            // SAFETY: [first, last) are live and outside the recorded length.
            unsafe { destroy_range(p.add(first), n) };
            drop(guard);
        } else {
            let len = self.len;
            let s = self.as_mut_slice();
            for i in first..len - n {
                let (front, back) = s.split_at_mut(i + n);
                front[i] = T::move_construct(&mut back[0])?;
            }
            self.truncate(len - n);
        }
        Ok(self.pos(first))
    }

    /// Remove the element at `index` in O(1) by moving the last element
    /// into its slot. Order is not preserved.
    ///
    /// On error nothing has changed.
    ///
    /// # Panics
    ///
    /// If `index >= len`.
    #[track_caller]
    pub fn erase_unstable(&mut self, index: usize) -> Result<T, ArrayError> {
        let len = self.len;
        assert!(index < len, "erase_unstable index {index} out of range for length {len}");
        let last = len - 1;
        if index != last {
            let (front, back) = self.as_mut_slice().split_at_mut(last);
            if T::TRIVIAL {
                mem::swap(&mut front[index], &mut back[0]);
            } else {
                let moved = T::move_construct(&mut back[0])?;
                let removed = mem::replace(&mut front[index], moved);
                self.truncate(last);
                return Ok(removed);
            }
        }
        match self.pop() {
            Some(removed) => Ok(removed),
            None => unreachable!("index < len"),
        }
    }

    /// Ensure the capacity is at least `min_capacity`, allocating exactly
    /// that much if it has to grow. Never shrinks.
    pub fn reserve(&mut self, min_capacity: usize) -> Result<(), ArrayError> {
        self.buf.reserve_exact(self.len, min_capacity)
    }

    /// Reallocate to exactly `len` slots unless already tight. An empty
    /// array releases its block.
    pub fn shrink_to_fit(&mut self) -> Result<(), ArrayError> {
        self.buf.shrink_to(self.len)
    }

    /// Grow with clones of `value` or shrink to `n` elements.
    pub fn resize(&mut self, n: usize, value: T) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        if n <= self.len {
            self.truncate(n);
            return Ok(());
        }
        let extra = n - self.len;
        self.buf.grow_for(self.len, extra, &self.growth)?;
        // SAFETY: room for `extra` uninitialized slots after len.
        unsafe { uninit::construct_fill(self.buf.ptr().add(self.len), extra, &value) };
        self.len = n;
        Ok(())
    }

    /// Grow with `T::default()` or shrink to `n` elements.
    pub fn resize_default(&mut self, n: usize) -> Result<(), ArrayError>
    where
        T: Default,
    {
        self.resize_with(n, T::default)
    }

    /// Grow with values from `make` or shrink to `n` elements.
    pub fn resize_with<F>(&mut self, n: usize, mut make: F) -> Result<(), ArrayError>
    where
        F: FnMut() -> T,
    {
        if n <= self.len {
            self.truncate(n);
            return Ok(());
        }
        let extra = n - self.len;
        self.buf.grow_for(self.len, extra, &self.growth)?;
        // SAFETY: room for `extra` uninitialized slots after len.
        let built: Result<(), std::convert::Infallible> = unsafe {
            uninit::construct_with(self.buf.ptr().add(self.len), extra, |_| Ok(make()))
        };
        match built {
            Ok(()) => self.len = n,
            Err(never) => match never {},
        }
        Ok(())
    }
}

/// Shifts the tail over the erased range when dropped, even during unwinding.
struct CloseGap<'a, T> {
    ptr: *mut T,
    first: usize,
    last: usize,
    tail: usize,
    len: &'a mut usize,
}

impl<T> Drop for CloseGap<'_, T> {
    fn drop(&mut self) {
        // SAFETY: [last, last + tail) are live; [first, last) are dead.
        unsafe {
            ptr::copy(
                self.ptr.add(self.last),
                self.ptr.add(self.first),
                self.tail,
            )
        };
        *self.len = self.first + self.tail;
    }
}

impl<T, A: RawAlloc> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        // SAFETY: [0, len) are live; RawBuf releases the block afterwards.
        unsafe { destroy_range(self.buf.ptr(), self.len) };
    }
}

impl<T, A: RawAlloc> Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAlloc> DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: RawAlloc> Index<usize> for DynArray<T, A> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T, A: RawAlloc> IndexMut<usize> for DynArray<T, A> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T, A: RawAlloc> Index<Pos> for DynArray<T, A> {
    type Output = T;

    #[track_caller]
    fn index(&self, pos: Pos) -> &T {
        let i = pos.check_deref(self.buf.token(), self.len);
        &self.as_slice()[i]
    }
}

impl<T, A: RawAlloc> IndexMut<Pos> for DynArray<T, A> {
    #[track_caller]
    fn index_mut(&mut self, pos: Pos) -> &mut T {
        let i = pos.check_deref(self.buf.token(), self.len);
        &mut self.as_mut_slice()[i]
    }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq, A: RawAlloc, B: RawAlloc> PartialEq<DynArray<T, B>> for DynArray<T, A> {
    fn eq(&self, other: &DynArray<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: RawAlloc> Eq for DynArray<T, A> {}

impl<T: PartialEq<U>, U, A: RawAlloc> PartialEq<[U]> for DynArray<T, A> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U, A: RawAlloc> PartialEq<&[U]> for DynArray<T, A> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq<U>, U, A: RawAlloc, const N: usize> PartialEq<[U; N]> for DynArray<T, A> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq<U>, U, A: RawAlloc> PartialEq<Vec<U>> for DynArray<T, A> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Hash, A: RawAlloc> Hash for DynArray<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, A: RawAlloc> IntoIterator for DynArray<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        let (buf, len) = self.into_raw_parts();
        IntoIter::new(buf, len)
    }
}

/// An array relocates as its allocator does: the elements stay in their
/// block, only the handle moves.
impl<T, A: RawAlloc + Relocate + Clone> Relocate for DynArray<T, A> {
    const TRIVIAL: bool = A::TRIVIAL;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(src.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reloc_test_utils::{CountingAlloc, SafeProbe, Tracked, Tracker, TrivialProbe};

    fn tracked(t: &Tracker, values: &[i64]) -> DynArray<Tracked> {
        let mut a = DynArray::new();
        a.append_iter(values.iter().map(|&v| t.track(v))).unwrap();
        a
    }

    fn values<A: RawAlloc>(a: &DynArray<Tracked, A>) -> Vec<i64> {
        a.iter().map(Tracked::value).collect()
    }

    #[test]
    fn new_array_does_not_allocate() {
        let alloc = CountingAlloc::new();
        let a: DynArray<u32, _> = DynArray::new_in(alloc.clone());
        assert_eq!(a.capacity(), 0);
        assert!(a.is_empty());
        assert_eq!(alloc.stats().allocations, 0);
    }

    #[test]
    fn push_grows_geometrically() {
        let growth = GrowthConfig::new(2, 2, 1).unwrap();
        let mut a = DynArray::with_config_in(growth, AlignedAlloc);
        let mut caps = vec![a.capacity()];
        for v in 1..=5u32 {
            a.push(v).unwrap();
            if caps.last() != Some(&a.capacity()) {
                caps.push(a.capacity());
            }
        }
        assert_eq!(a, [1, 2, 3, 4, 5]);
        assert_eq!(caps, vec![0, 2, 4, 8]);
    }

    #[test]
    fn push_failure_leaves_array_unchanged() {
        let alloc = CountingAlloc::new();
        let mut a = DynArray::with_capacity_in(2, alloc.clone()).unwrap();
        a.push(1u8).unwrap();
        a.push(2).unwrap();
        alloc.fail_after(0);
        assert!(matches!(a.push(3), Err(ArrayError::Alloc(_))));
        assert_eq!(a, [1, 2]);
        assert_eq!(a.capacity(), 2);
    }

    #[test]
    fn push_with_failure_keeps_length() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4]);
        let err = a.push_with(|| Err(ElementError::new("no"))).unwrap_err();
        assert_eq!(err, ArrayError::Element(ElementError::new("no")));
        assert_eq!(a.len(), 4);
        assert!(a.capacity() > 4);
        *a.push_with(|| t.make(5)).unwrap() = t.track(6);
        assert_eq!(values(&a), vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn pop_and_truncate() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4]);
        assert_eq!(a.pop().map(|x| x.value()), Some(4));
        a.truncate(1);
        assert_eq!(values(&a), vec![1]);
        assert_eq!(t.live(), 1);
        a.clear();
        assert_eq!(t.live(), 0);
        assert!(a.pop().is_none());
    }

    #[test]
    fn checked_access_reports_range() {
        let mut a = DynArray::new();
        a.append_copied(&[5u16, 6]).unwrap();
        assert_eq!(a.at(1), Ok(&6));
        assert_eq!(a.at(2), Err(ArrayError::OutOfRange { index: 2, len: 2 }));
        *a.at_mut(0).unwrap() = 9;
        assert_eq!(a.front(), Some(&9));
        assert_eq!(a.back(), Some(&6));
    }

    #[test]
    #[should_panic]
    fn unchecked_index_past_end_panics() {
        let a = DynArray::<u8>::from_elem(2, 0).unwrap();
        let _ = a[2];
    }

    #[test]
    fn append_fallible_rolls_back() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2]);
        t.fail_at(2);
        let err = a.append_fallible((10..15).map(|v| t.make(v))).unwrap_err();
        assert!(matches!(err, ArrayError::Element(_)));
        assert_eq!(values(&a), vec![1, 2]);
        assert_eq!(t.live(), 2);
    }

    #[test]
    fn append_slice_clones() {
        let mut a = DynArray::new();
        let src = vec!["x".to_string(), "y".to_string()];
        a.append_slice(&src).unwrap();
        a.append_slice(&src).unwrap();
        assert_eq!(a, ["x", "y", "x", "y"]);
    }

    #[test]
    fn assign_exact_larger_than_capacity() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2]);
        a.shrink_to_fit().unwrap();
        a.assign((0..6).map(|v| t.track(v))).unwrap();
        assert_eq!(values(&a), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(a.capacity(), 6);
        assert_eq!(t.live(), 6);
    }

    #[test]
    fn assign_exact_overwrites_in_place() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4, 5]);
        let before = a.as_ptr();
        a.assign((7..9).map(|v| t.track(v))).unwrap();
        assert_eq!(values(&a), vec![7, 8]);
        assert_eq!(a.as_ptr(), before);
        assert_eq!(t.live(), 2);
    }

    #[test]
    fn assign_unknown_length_clears_then_appends() {
        let mut a = DynArray::new();
        a.append_iter(["1", "2", "3", "4", "5"].map(String::from))
            .unwrap();
        let src = ["a", "b", "c"];
        a.assign(src.iter().filter(|_| true).map(|s| s.to_string()))
            .unwrap();
        assert_eq!(a, ["a", "b", "c"]);
    }

    #[test]
    fn assign_failure_leaves_valid_array() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3]);
        t.fail_at(1);
        let r = a.assign_fallible((10..13).map(|v| t.make(v)));
        assert!(r.is_err());
        assert_eq!(t.live(), a.len());
        drop(a);
        assert_eq!(t.live(), 0);
    }

    #[test]
    fn insert_shifts_tail_trivial() {
        let mut a = DynArray::with_capacity(8).unwrap();
        a.append_iter((1..=4).map(TrivialProbe::from)).unwrap();
        let before = a.as_ptr();
        let at = a.insert(a.pos(1), TrivialProbe::from(9)).unwrap();
        assert_eq!(at.index(), 1);
        assert_eq!(a, [1, 9, 2, 3, 4].map(TrivialProbe::from));
        // Shifted in place.
        assert_eq!(a.as_ptr(), before);
    }

    #[test]
    fn insert_with_spare_capacity_shifts_non_trivial_in_place() {
        let t = Tracker::new();
        let alloc = CountingAlloc::new();
        let mut a = DynArray::with_capacity_in(16, alloc.clone()).unwrap();
        a.append_iter([1, 2, 3].map(|v| t.track(v))).unwrap();
        let first = a.begin();
        let allocations = alloc.stats().allocations;

        for v in 10..14 {
            a.insert(a.end(), t.track(v)).unwrap();
        }
        let p = a.insert(a.pos(1), t.track(0)).unwrap();
        a.insert_iter(a.pos(2), [t.track(-1), t.track(-2)]).unwrap();

        assert_eq!(alloc.stats().allocations, allocations);
        assert_eq!(a[first].value(), 1);
        assert_eq!(a[p].value(), 0);
        assert_eq!(values(&a), vec![1, 0, -1, -2, 2, 3, 10, 11, 12, 13]);
        assert_eq!(t.live(), 10);
    }

    #[test]
    fn insert_past_the_end_with_spare_capacity_moves_nothing() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3]);
        a.reserve(8).unwrap();
        let relocated = t.relocated();
        a.insert(a.end(), t.track(4)).unwrap();
        assert_eq!(t.relocated(), relocated);
        assert_eq!(values(&a), vec![1, 2, 3, 4]);
    }

    #[test]
    fn insert_in_place_spill_failure_leaves_array_unchanged() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4, 5]);
        a.reserve(10).unwrap();
        let first = a.begin();
        t.fail_at(1);
        let r = a.insert_iter(a.pos(1), [t.track(-1), t.track(-2)]);
        assert!(matches!(r, Err(ArrayError::Element(_))));
        assert_eq!(values(&a), vec![1, 2, 3, 4, 5]);
        assert_eq!(a[first].value(), 1);
        assert_eq!(t.live(), 5);
    }

    #[test]
    fn insert_in_place_shift_failure_keeps_length() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4, 5]);
        a.reserve(10).unwrap();
        // Steps 0 and 1 spill 4 and 5 into spare slots; step 2 shifts 3.
        t.fail_at(2);
        let r = a.insert_iter(a.pos(1), [t.track(-1), t.track(-2)]);
        assert!(r.is_err());
        assert_eq!(a.len(), 5);
        assert_eq!(t.live(), 5);
        drop(a);
        assert_eq!(t.live(), 0);
        assert_eq!(t.constructed(), t.dropped());
    }

    #[test]
    fn insert_failure_leaves_array_unchanged() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4]);
        assert_eq!(a.capacity(), 4);
        t.fail_at(1);
        let r = a.insert(a.pos(1), t.track(9));
        assert!(r.is_err());
        assert_eq!(values(&a), vec![1, 2, 3, 4]);
        assert_eq!(a.capacity(), 4);
        assert_eq!(t.live(), 4);
    }

    #[test]
    fn insert_iter_keeps_order() {
        let mut a = DynArray::new();
        a.append_copied(&[1u32, 5]).unwrap();
        a.insert_iter(a.pos(1), 2..5).unwrap();
        assert_eq!(a, [1, 2, 3, 4, 5]);
        a.insert_iter(a.end(), std::iter::empty()).unwrap();
        assert_eq!(a.len(), 5);
        let many: Vec<u32> = (100..120).collect();
        a.insert_iter(a.begin(), many.iter().copied()).unwrap();
        assert_eq!(a.len(), 25);
        assert_eq!(a[19], 119);
        assert_eq!(a[20], 1);
    }

    #[test]
    fn erase_shifts_left() {
        let mut a = DynArray::new();
        a.append_copied(&[10u32, 20, 30, 40, 50]).unwrap();
        let p = a.erase(a.pos(2)).unwrap();
        assert_eq!(a, [10, 20, 40, 50]);
        assert_eq!(a[p], 40);
    }

    #[test]
    fn erase_range_non_trivial() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4, 5, 6]);
        a.erase_range(a.pos(1), a.pos(4)).unwrap();
        assert_eq!(values(&a), vec![1, 5, 6]);
        assert_eq!(t.live(), 3);
        a.erase_range(a.pos(1), a.end()).unwrap();
        assert_eq!(values(&a), vec![1]);
        a.erase_range(a.begin(), a.begin()).unwrap();
        assert_eq!(t.live(), 1);
    }

    #[test]
    fn erase_range_trivial_drops_erased() {
        let mut a = DynArray::new();
        a.append_iter(["a", "b", "c", "d"].map(String::from)).unwrap();
        a.erase_range(a.pos(0), a.pos(2)).unwrap();
        assert_eq!(a, ["c", "d"]);
    }

    #[test]
    fn erase_failure_keeps_every_element_live() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3, 4]);
        t.fail_at(1);
        assert!(a.erase(a.pos(0)).is_err());
        assert_eq!(a.len(), 4);
        assert_eq!(t.live(), 4);
    }

    #[test]
    fn erase_unstable_moves_last() {
        let mut a = DynArray::new();
        a.append_copied(&[10u32, 20, 40, 50]).unwrap();
        assert_eq!(a.erase_unstable(0).unwrap(), 10);
        assert_eq!(a, [50, 20, 40]);
        assert_eq!(a.erase_unstable(2).unwrap(), 40);
        assert_eq!(a, [50, 20]);
    }

    #[test]
    fn erase_unstable_non_trivial_is_strong() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 2, 3]);
        t.fail_at(0);
        assert!(a.erase_unstable(0).is_err());
        assert_eq!(values(&a), vec![1, 2, 3]);
        assert_eq!(a.erase_unstable(0).unwrap().value(), 1);
        assert_eq!(values(&a), vec![3, 2]);
        assert_eq!(t.live(), 2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn erase_unstable_past_end_panics() {
        let mut a = DynArray::<u8>::new();
        let _ = a.erase_unstable(0);
    }

    #[test]
    fn reserve_is_exact_and_never_shrinks() {
        let mut a = DynArray::<u64>::new();
        a.reserve(13).unwrap();
        assert_eq!(a.capacity(), 13);
        a.reserve(3).unwrap();
        assert_eq!(a.capacity(), 13);
    }

    #[test]
    fn shrink_to_fit_tightens() {
        let alloc = CountingAlloc::new();
        let mut a = DynArray::with_capacity_in(16, alloc.clone()).unwrap();
        a.append_copied(&[1u8, 2, 3]).unwrap();
        a.shrink_to_fit().unwrap();
        assert_eq!(a.capacity(), 3);
        assert_eq!(a, [1, 2, 3]);
        let allocations = alloc.stats().allocations;
        a.shrink_to_fit().unwrap();
        assert_eq!(alloc.stats().allocations, allocations);
        a.clear();
        a.shrink_to_fit().unwrap();
        assert_eq!(a.capacity(), 0);
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut a = DynArray::new();
        a.resize(3, 7u8).unwrap();
        assert_eq!(a, [7, 7, 7]);
        a.resize_default(5).unwrap();
        assert_eq!(a, [7, 7, 7, 0, 0]);
        let mut n = 0;
        a.resize_with(7, || {
            n += 1;
            n
        })
        .unwrap();
        assert_eq!(a, [7, 7, 7, 0, 0, 1, 2]);
        a.resize(2, 0).unwrap();
        assert_eq!(a, [7, 7]);
    }

    #[test]
    fn retain_and_dedup() {
        let t = Tracker::new();
        let mut a = tracked(&t, &[1, 1, 2, 3, 3, 3, 4, 1]);
        assert_eq!(a.dedup().unwrap(), 3);
        assert_eq!(values(&a), vec![1, 2, 3, 4, 1]);
        assert_eq!(a.retain(|x| x.value() % 2 == 1).unwrap(), 2);
        assert_eq!(values(&a), vec![1, 3, 1]);
        assert_eq!(t.live(), 3);

        let mut b = DynArray::new();
        b.append_copied(&[5u8, 5, 6, 7, 7]).unwrap();
        assert_eq!(b.dedup().unwrap(), 2);
        assert_eq!(b, [5, 6, 7]);
        b.retain(|&x| x != 6).unwrap();
        assert_eq!(b, [5, 7]);
    }

    #[test]
    fn try_clone_is_deep() {
        let t = Tracker::new();
        let a = tracked(&t, &[1, 2]);
        let b = a.try_clone().unwrap();
        assert_eq!(a, b);
        assert_eq!(t.live(), 4);
        assert_ne!(a.as_ptr(), b.as_ptr());
    }

    #[test]
    fn take_leaves_empty_source() {
        let mut a = DynArray::new();
        a.append_copied(&[1u8, 2]).unwrap();
        let b = a.take();
        assert!(a.is_empty());
        assert_eq!(a.capacity(), 0);
        assert_eq!(b, [1, 2]);
    }

    #[test]
    fn nested_arrays_relocate_as_handles() {
        assert!(reloc_core::is_trivially_relocatable::<DynArray<SafeProbe>>());
        let mut outer: DynArray<DynArray<SafeProbe>> = DynArray::new();
        for i in 0..10 {
            let mut inner = DynArray::new();
            inner.push(SafeProbe::from(i)).unwrap();
            outer.push(inner).unwrap();
        }
        outer.erase(outer.pos(0)).unwrap();
        assert_eq!(outer[0][0], SafeProbe::from(1));
    }

    #[test]
    fn zero_sized_elements() {
        let mut a = DynArray::<()>::new();
        for _ in 0..1000 {
            a.push(()).unwrap();
        }
        a.insert(a.pos(10), ()).unwrap();
        a.erase_range(a.pos(0), a.pos(500)).unwrap();
        assert_eq!(a.len(), 501);
        assert_eq!(a.capacity(), usize::MAX);
        assert_eq!(a.into_iter().count(), 501);
    }

    #[test]
    fn hash_and_eq_follow_contents() {
        use std::collections::hash_map::DefaultHasher;

        let mut a = DynArray::new();
        a.append_copied(&[1u32, 2, 3]).unwrap();
        let mut b = DynArray::with_capacity_in(50, CountingAlloc::new()).unwrap();
        b.append_copied(&[1u32, 2, 3]).unwrap();
        assert!(a == b);

        let hash = |x: &DynArray<u32>| {
            let mut h = DefaultHasher::new();
            x.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&a.try_clone().unwrap()));
        assert_eq!(format!("{a:?}"), "[1, 2, 3]");
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "stale position")]
    fn position_is_stale_after_growth() {
        let mut a = DynArray::with_capacity(1).unwrap();
        a.push(1u32).unwrap();
        let p = a.begin();
        a.push(2).unwrap();
        let _ = a[p];
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Push(u64),
            Insert(usize, u64),
            Erase(usize),
            EraseRange(usize, usize),
            EraseUnstable(usize),
            Pop,
            Truncate(usize),
            ShrinkToFit,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => any::<u64>().prop_map(Op::Push),
                2 => (any::<usize>(), any::<u64>()).prop_map(|(i, v)| Op::Insert(i, v)),
                1 => any::<usize>().prop_map(Op::Erase),
                1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
                1 => any::<usize>().prop_map(Op::EraseUnstable),
                1 => Just(Op::Pop),
                1 => any::<usize>().prop_map(Op::Truncate),
                1 => Just(Op::ShrinkToFit),
            ]
        }

        /// Apply `op` to an array and to a `Vec` model side by side.
        fn apply<const B: bool>(
            a: &mut DynArray<reloc_test_utils::Probe<B>>,
            m: &mut Vec<u64>,
            op: &Op,
        ) {
            use reloc_test_utils::Probe;
            match *op {
                Op::Push(v) => {
                    a.push(Probe(v)).unwrap();
                    m.push(v);
                }
                Op::Insert(i, v) => {
                    let i = i % (m.len() + 1);
                    a.insert(a.pos(i), Probe(v)).unwrap();
                    m.insert(i, v);
                }
                Op::Erase(i) if !m.is_empty() => {
                    let i = i % m.len();
                    a.erase(a.pos(i)).unwrap();
                    m.remove(i);
                }
                Op::EraseRange(x, y) => {
                    let x = x % (m.len() + 1);
                    let y = y % (m.len() + 1);
                    let (lo, hi) = (x.min(y), x.max(y));
                    a.erase_range(a.pos(lo), a.pos(hi)).unwrap();
                    m.drain(lo..hi);
                }
                Op::EraseUnstable(i) if !m.is_empty() => {
                    let i = i % m.len();
                    assert_eq!(a.erase_unstable(i).unwrap(), Probe(m.swap_remove(i)));
                }
                Op::Pop => assert_eq!(a.pop(), m.pop().map(Probe)),
                Op::Truncate(n) => {
                    let n = n % (m.len() + 2);
                    a.truncate(n);
                    m.truncate(n);
                }
                Op::ShrinkToFit => {
                    a.shrink_to_fit().unwrap();
                    assert_eq!(a.capacity(), m.len());
                }
                Op::Erase(_) | Op::EraseUnstable(_) => {}
            }
        }

        proptest! {
            #[test]
            fn matches_vec_model(ops in prop::collection::vec(op(), 0..64)) {
                let mut fast: DynArray<TrivialProbe> = DynArray::new();
                let mut safe: DynArray<SafeProbe> = DynArray::new();
                let mut model = Vec::new();
                let mut model2 = Vec::new();
                for op in &ops {
                    apply(&mut fast, &mut model, op);
                    apply(&mut safe, &mut model2, op);
                    let f: Vec<u64> = fast.iter().map(|p| p.0).collect();
                    let s: Vec<u64> = safe.iter().map(|p| p.0).collect();
                    prop_assert_eq!(&f, &model);
                    prop_assert_eq!(&s, &model);
                    prop_assert!(fast.capacity() >= fast.len());
                }
            }

            #[test]
            fn erase_unstable_preserves_multiset(
                values in prop::collection::vec(any::<u16>(), 1..40),
                idx in any::<usize>(),
            ) {
                let mut a = DynArray::new();
                a.append_copied(&values).unwrap();
                let removed = a.erase_unstable(idx % values.len()).unwrap();
                let mut after: Vec<u16> = a.iter().copied().collect();
                after.push(removed);
                after.sort_unstable();
                let mut expected = values.clone();
                expected.sort_unstable();
                prop_assert_eq!(after, expected);
            }
        }
    }
}
