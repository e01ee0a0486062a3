//! Checked positions into a [`DynArray`](crate::DynArray).
//!
//! A [`Pos`] is the container's iterator: an element index that, in debug
//! builds, also carries the [`AllocToken`] of the storage block it was taken
//! from. Every container starts with a token of its own, and every
//! reallocation or release issues a new one, so a position taken before a
//! reallocation no longer matches and any use of it panics with a
//! "stale position" message. Once stale, a position never becomes valid
//! again. Positions from two different containers never match, even when
//! neither has allocated or the elements are zero-sized.
//!
//! Release builds store only the index. Stale positions are then not
//! detected, but every dereference is still bounds checked.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Identity of one storage block, or of a container that has none.
///
/// Tokens are unique for the life of the process. [`AllocToken::NONE`] is
/// never issued; release builds, which do not track blocks, report it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllocToken(u64);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl AllocToken {
    /// The token reported when blocks are not tracked.
    pub const NONE: AllocToken = AllocToken(0);

    /// Issue a token no other block has had.
    pub fn fresh() -> Self {
        AllocToken(NEXT_TOKEN.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw token value, 0 for [`AllocToken::NONE`].
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A position in a [`DynArray`](crate::DynArray), valid until the next
/// reallocation.
///
/// Obtained from [`DynArray::begin`](crate::DynArray::begin),
/// [`DynArray::end`](crate::DynArray::end), [`DynArray::pos`](crate::DynArray::pos)
/// or returned by `insert`/`erase`. Supports offsetting by `usize` and
/// distance (`a - b`). Comparing positions from different blocks panics in
/// debug builds.
#[derive(Clone, Copy)]
pub struct Pos {
    index: usize,
    #[cfg(debug_assertions)]
    token: AllocToken,
}

impl Pos {
    pub(crate) fn new(
        index: usize,
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] token: AllocToken,
    ) -> Self {
        Self {
            index,
            #[cfg(debug_assertions)]
            token,
        }
    }

    /// Element index this position refers to.
    pub fn index(self) -> usize {
        self.index
    }

    /// Block identity recorded when the position was taken
    /// ([`AllocToken::NONE`] in release builds).
    pub fn token(self) -> AllocToken {
        #[cfg(debug_assertions)]
        {
            self.token
        }
        #[cfg(not(debug_assertions))]
        {
            AllocToken::NONE
        }
    }

    /// Panic unless `self` was taken from the block identified by `current`.
    #[track_caller]
    pub(crate) fn check_token(
        self,
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] current: AllocToken,
    ) {
        #[cfg(debug_assertions)]
        {
            if self.token != current {
                panic!(
                    "stale position: index {} belongs to block {}, container now uses block {}",
                    self.index,
                    self.token.get(),
                    current.get()
                );
            }
        }
    }

    /// Token check plus `index < len` (dereferenceable).
    #[track_caller]
    pub(crate) fn check_deref(self, current: AllocToken, len: usize) -> usize {
        self.check_token(current);
        if self.index >= len {
            panic!("position {} out of bounds for length {}", self.index, len);
        }
        self.index
    }

    /// Token check plus `index <= len` (usable as an insertion point or range end).
    #[track_caller]
    pub(crate) fn check_bound(self, current: AllocToken, len: usize) -> usize {
        self.check_token(current);
        if self.index > len {
            panic!("position {} out of bounds for length {}", self.index, len);
        }
        self.index
    }

    #[track_caller]
    fn check_compatible(
        self,
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] other: Pos,
    ) {
        #[cfg(debug_assertions)]
        {
            if self.token != other.token {
                panic!(
                    "incompatible positions: blocks {} and {}",
                    self.token.get(),
                    other.token.get()
                );
            }
        }
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Pos");
        d.field("index", &self.index);
        #[cfg(debug_assertions)]
        d.field("token", &self.token.get());
        d.finish()
    }
}

impl PartialEq for Pos {
    #[track_caller]
    fn eq(&self, other: &Self) -> bool {
        self.check_compatible(*other);
        self.index == other.index
    }
}

impl Eq for Pos {}

impl PartialOrd for Pos {
    #[track_caller]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pos {
    #[track_caller]
    fn cmp(&self, other: &Self) -> Ordering {
        self.check_compatible(*other);
        self.index.cmp(&other.index)
    }
}

impl Add<usize> for Pos {
    type Output = Pos;

    fn add(mut self, n: usize) -> Pos {
        self.index += n;
        self
    }
}

impl AddAssign<usize> for Pos {
    fn add_assign(&mut self, n: usize) {
        self.index += n;
    }
}

impl Sub<usize> for Pos {
    type Output = Pos;

    fn sub(mut self, n: usize) -> Pos {
        self.index -= n;
        self
    }
}

impl SubAssign<usize> for Pos {
    fn sub_assign(&mut self, n: usize) {
        self.index -= n;
    }
}

/// Signed distance between two positions of the same block.
impl Sub for Pos {
    type Output = isize;

    #[track_caller]
    fn sub(self, other: Pos) -> isize {
        self.check_compatible(other);
        self.index as isize - other.index as isize
    }
}
