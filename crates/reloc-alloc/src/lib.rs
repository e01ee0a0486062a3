//! Raw memory for the reloc dynamic array.
//!
//! An allocator here only hands out and takes back uninitialized blocks;
//! constructing and destroying objects is the container's job. This crate is
//! one of two that contain `unsafe` code (along with `reloc-array`).
//!
//! - [`RawAlloc`]: the allocator concept a container is generic over.
//! - [`AlignedAlloc`]: the default, stateless implementation.
//! - [`allocate_array`] / [`deallocate_array`]: typed helpers that size
//!   blocks in object units.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod aligned;
pub mod raw;

pub use aligned::{AlignedAlloc, DEFAULT_NEW_ALIGNMENT};
pub use raw::{allocate_array, array_layout, deallocate_array, RawAlloc};
