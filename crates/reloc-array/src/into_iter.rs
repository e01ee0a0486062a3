//! Owning iteration.

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::ptr;
use std::slice;

use reloc_alloc::{AlignedAlloc, RawAlloc};

use crate::raw::RawBuf;
use crate::uninit::destroy_range;

/// Iterator that moves elements out of a [`DynArray`](crate::DynArray).
///
/// Elements not yet yielded are dropped with the iterator, then the block
/// is released.
pub struct IntoIter<T, A: RawAlloc = AlignedAlloc> {
    buf: RawBuf<T, A>,
    /// Live slots are `[start, end)`.
    start: usize,
    end: usize,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
    pub(crate) fn new(buf: RawBuf<T, A>, len: usize) -> Self {
        Self {
            buf,
            start: 0,
            end: len,
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [start, end) are live.
        unsafe { slice::from_raw_parts(self.buf.ptr().add(self.start), self.end - self.start) }
    }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let i = self.start;
        self.start += 1;
        // SAFETY: slot i was live and is now outside [start, end).
        Some(unsafe { ptr::read(self.buf.ptr().add(i)) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.start;
        (n, Some(n))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: slot end was live and is now outside [start, end).
        Some(unsafe { ptr::read(self.buf.ptr().add(self.end)) })
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: RawAlloc> FusedIterator for IntoIter<T, A> {}

impl<T, A: RawAlloc> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        let remaining = self.end - self.start;
        let first = self.start;
        self.start = self.end;
        // SAFETY: [first, first + remaining) were live.
        unsafe { destroy_range(self.buf.ptr().add(first), remaining) };
    }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
