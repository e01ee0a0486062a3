//! A growable contiguous array that moves elements by relocation.
//!
//! [`DynArray`] is a `Vec`-like container with three differences:
//!
//! - It is generic over a [`RawAlloc`](reloc_alloc::RawAlloc) and reports
//!   allocation failure as an error instead of aborting.
//! - Element types declare through [`Relocate`](reloc_core::Relocate)
//!   whether a byte copy is a complete move. Growth, insertion and erasure
//!   take one bulk byte move for such types and fall back to an element-wise
//!   hook with rollback for the rest.
//! - Positions ([`Pos`]) carry the identity of the storage block in debug
//!   builds, so using one after a reallocation panics instead of reading
//!   freed memory.
//!
//! # Module layout
//!
//! ```text
//! DynArray (array)
//! ├── RawBuf (raw): block ownership and the relocation engine
//! │   └── uninit: construct / fill / copy / destroy over raw slots
//! ├── GrowthConfig (config): geometric growth policy
//! ├── Pos (pos): checked position with allocation token
//! └── IntoIter (into_iter): owning iteration
//! ```
//!
//! Free algorithms over the public surface live in [`algo`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod algo;
pub mod array;
pub mod config;
pub mod into_iter;
pub mod pos;
mod raw;
pub mod uninit;

pub use array::DynArray;
pub use config::GrowthConfig;
pub use into_iter::IntoIter;
pub use pos::{AllocToken, Pos};
