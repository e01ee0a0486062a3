//! Free algorithms over the public container surface.

use reloc_alloc::RawAlloc;
use reloc_core::{ArrayError, Relocate};

use crate::DynArray;

/// Remove every element matching `pred`, keeping the order of the rest.
/// Returns the number removed.
pub fn erase_if<T, A, F>(array: &mut DynArray<T, A>, mut pred: F) -> Result<usize, ArrayError>
where
    T: Relocate,
    A: RawAlloc,
    F: FnMut(&T) -> bool,
{
    array.retain(|x| !pred(x))
}

/// Collapse runs of equal adjacent elements to their first element.
/// Returns the number removed.
pub fn erase_adjacent_dup<T, A>(array: &mut DynArray<T, A>) -> Result<usize, ArrayError>
where
    T: Relocate + PartialEq,
    A: RawAlloc,
{
    array.dedup()
}

/// Clone as much of `src` as fits into `dst`, from the front. Returns the
/// number of elements copied.
pub fn copy_fit<T: Clone>(src: &[T], dst: &mut [T]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].clone_from_slice(&src[..n]);
    n
}
