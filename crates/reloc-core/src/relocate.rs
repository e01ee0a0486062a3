//! The relocatability fact attached to element types.
//!
//! A type is *trivially relocatable* when copying the bytes of a live value to
//! a new address, and treating the old address as dead without running its
//! destructor, is indistinguishable from moving the value with its relocation
//! hook and dropping the source. [`DynArray`] uses the fact to pick between a
//! single bulk byte copy and an element-wise walk through
//! [`Relocate::move_construct`].
//!
//! Rust already guarantees that bitwise moves are memory-safe, so the trait is
//! not `unsafe`. `TRIVIAL` is a behavioral promise: when it is `true` the
//! container is allowed to skip the per-element hook.
//!
//! # Declaring a type
//!
//! ```
//! use reloc_core::{relocate_by_copy, relocate_by_take, relocate_by_clone};
//!
//! #[derive(Clone, Copy)]
//! struct Point { x: i32, y: i32 }
//! relocate_by_copy!(Point);
//!
//! #[derive(Default)]
//! struct Name(String);
//! relocate_by_take!(Name);
//!
//! // Not provably relocatable: every move goes through `Clone`.
//! #[derive(Clone)]
//! struct Registered(u64);
//! relocate_by_clone!(Registered);
//!
//! assert!(reloc_core::is_trivially_relocatable::<(Point, Name)>());
//! assert!(!reloc_core::is_trivially_relocatable::<(Point, Registered)>());
//! ```
//!
//! A declaration must be made once per type and be the same everywhere the
//! type is used. Nothing checks this at run time.
//!
//! [`DynArray`]: ../reloc_array/struct.DynArray.html

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::ElementError;

/// Relocation behavior of an element type.
pub trait Relocate: Sized {
    /// `true` when a raw byte copy is a complete move for this type.
    const TRIVIAL: bool;

    /// Build the value that will live in a new slot, leaving `src` live.
    ///
    /// The container writes the returned value to its destination slot and
    /// drops `src` only after every element of the batch has moved. On error
    /// nothing observable has happened: `src` is unchanged and the batch is
    /// rolled back.
    fn move_construct(src: &mut Self) -> Result<Self, ElementError>;
}

/// Whether `T` may be relocated with a raw byte copy.
pub const fn is_trivially_relocatable<T: Relocate>() -> bool {
    T::TRIVIAL
}

/// Declare `Copy` types trivially relocatable.
#[macro_export]
macro_rules! relocate_by_copy {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Relocate for $ty {
                const TRIVIAL: bool = true;

                #[inline]
                fn move_construct(
                    src: &mut Self,
                ) -> ::core::result::Result<Self, $crate::ElementError> {
                    ::core::result::Result::Ok(*src)
                }
            }
        )*
    };
}

/// Declare `Default` types trivially relocatable.
///
/// The element-wise hook (only reached when the type is nested in a
/// non-trivial composite) steals the value and leaves the default behind.
#[macro_export]
macro_rules! relocate_by_take {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Relocate for $ty {
                const TRIVIAL: bool = true;

                #[inline]
                fn move_construct(
                    src: &mut Self,
                ) -> ::core::result::Result<Self, $crate::ElementError> {
                    ::core::result::Result::Ok(::core::mem::take(src))
                }
            }
        )*
    };
}

/// Declare `Clone` types conservatively: never byte-copied, every relocation
/// clones the source and drops it afterwards.
#[macro_export]
macro_rules! relocate_by_clone {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Relocate for $ty {
                const TRIVIAL: bool = false;

                #[inline]
                fn move_construct(
                    src: &mut Self,
                ) -> ::core::result::Result<Self, $crate::ElementError> {
                    ::core::result::Result::Ok(::core::clone::Clone::clone(src))
                }
            }
        )*
    };
}

relocate_by_copy!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, (),
    std::cmp::Ordering,
    std::time::Duration,
    std::num::NonZeroU8,
    std::num::NonZeroU16,
    std::num::NonZeroU32,
    std::num::NonZeroU64,
    std::num::NonZeroUsize,
);

relocate_by_take!(String);

impl<T: ?Sized> Relocate for &T {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(*src)
    }
}

impl<T: ?Sized> Relocate for *const T {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(*src)
    }
}

impl<T: ?Sized> Relocate for *mut T {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(*src)
    }
}

impl<T: ?Sized> Relocate for NonNull<T> {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(*src)
    }
}

impl<T: ?Sized> Relocate for PhantomData<T> {
    const TRIVIAL: bool = true;

    fn move_construct(_src: &mut Self) -> Result<Self, ElementError> {
        Ok(PhantomData)
    }
}

// Heap-owning handles: the pointee never moves, only the handle does.

impl<T> Relocate for Vec<T> {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(std::mem::take(src))
    }
}

impl<T: Relocate> Relocate for Box<T> {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(Box::new(T::move_construct(&mut **src)?))
    }
}

impl<T: ?Sized> Relocate for Rc<T> {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(Rc::clone(src))
    }
}

impl<T: ?Sized> Relocate for Arc<T> {
    const TRIVIAL: bool = true;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(Arc::clone(src))
    }
}

// Composites are trivially relocatable iff every component is.

impl<T: Relocate> Relocate for Option<T> {
    const TRIVIAL: bool = T::TRIVIAL;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        match src {
            Some(value) => Ok(Some(T::move_construct(value)?)),
            None => Ok(None),
        }
    }
}

impl<T: Relocate, const N: usize> Relocate for [T; N] {
    const TRIVIAL: bool = T::TRIVIAL;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        // Early return drops the components moved so far.
        let mut moved = Vec::with_capacity(N);
        for item in src.iter_mut() {
            moved.push(T::move_construct(item)?);
        }
        match <[T; N]>::try_from(moved) {
            Ok(array) => Ok(array),
            Err(_) => unreachable!("exactly N components were moved"),
        }
    }
}

macro_rules! tuple_impls {
    ($(($($name:ident $idx:tt),+))+) => {
        $(
            impl<$($name: Relocate),+> Relocate for ($($name,)+) {
                const TRIVIAL: bool = true $(&& <$name as Relocate>::TRIVIAL)+;

                fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
                    // Left to right; a failure drops the components already built.
                    Ok(($(<$name as Relocate>::move_construct(&mut src.$idx)?,)+))
                }
            }
        )+
    };
}

tuple_impls! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
    (A 0, B 1, C 2, D 3, E 4)
    (A 0, B 1, C 2, D 3, E 4, F 5)
}
