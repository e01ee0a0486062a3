//! Core traits and error types for the reloc dynamic array.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! relocatability fact ([`Relocate`]) that element types carry, and the
//! error types shared by the allocator and container crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod relocate;

pub use error::{AllocError, ArrayError, ElementError};
pub use relocate::{is_trivially_relocatable, Relocate};
