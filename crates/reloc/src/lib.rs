//! Reloc: an allocator-aware dynamic array with trivially-relocatable fast
//! paths.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! reloc sub-crates. For most users, adding `reloc` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use reloc::prelude::*;
//!
//! #[derive(Clone, Copy, Debug, PartialEq)]
//! struct Sample { t: u32, v: f32 }
//! reloc::types::relocate_by_copy!(Sample);
//!
//! let mut samples: DynArray<Sample> = DynArray::new();
//! samples.append_iter((0..5).map(|t| Sample { t, v: t as f32 * 0.5 }))?;
//! samples.insert(samples.pos(2), Sample { t: 99, v: 0.0 })?;
//! samples.erase_range(samples.pos(3), samples.end())?;
//! assert_eq!(samples.len(), 3);
//! assert_eq!(samples[2].t, 99);
//!
//! match samples.at(10) {
//!     Err(ArrayError::OutOfRange { index: 10, len: 3 }) => {}
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok::<(), ArrayError>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `reloc-core` | `Relocate` trait, declaration macros, error types |
//! | [`alloc`] | `reloc-alloc` | `RawAlloc` trait, `AlignedAlloc`, typed block helpers |
//! | [`array`] | `reloc-array` | `DynArray`, positions, growth policy, algorithms |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Relocatability trait, declaration macros and error types (`reloc-core`).
///
/// Declare element types with [`types::relocate_by_copy!`],
/// [`types::relocate_by_take!`] or [`types::relocate_by_clone!`], or
/// implement [`types::Relocate`] by hand.
pub use reloc_core as types;

/// Raw allocators (`reloc-alloc`).
///
/// [`alloc::RawAlloc`] is the allocator concept; [`alloc::AlignedAlloc`] is
/// the default implementation.
pub use reloc_alloc as alloc;

/// The container and its satellites (`reloc-array`).
///
/// Includes [`array::DynArray`], [`array::Pos`], [`array::GrowthConfig`] and
/// the free algorithms in [`array::algo`].
pub use reloc_array as array;

/// Common imports for typical reloc usage.
///
/// ```rust
/// use reloc::prelude::*;
/// ```
pub mod prelude {
    // Container
    pub use reloc_array::{DynArray, GrowthConfig, Pos};

    // Relocation
    pub use reloc_core::{is_trivially_relocatable, Relocate};

    // Allocation
    pub use reloc_alloc::{AlignedAlloc, RawAlloc};

    // Errors
    pub use reloc_core::{AllocError, ArrayError, ElementError};
}
