//! Benchmark workloads for the reloc dynamic array.
//!
//! Provides cache-line sized payloads whose relocation path is fixed at
//! compile time, and pre-filled arrays built from them:
//!
//! - [`Payload`]: 64-byte element, byte-copied when `TRIVIAL` is `true`
//! - [`filled`]: an array of `n` payloads with ids `0..n`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use reloc_array::DynArray;
use reloc_core::{ElementError, Relocate};

/// 64-byte element with a chosen relocation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payload<const TRIVIAL: bool> {
    /// Identity, preserved across moves.
    pub id: u64,
    /// Filler derived from `id`.
    pub body: [u64; 7],
}

impl<const TRIVIAL: bool> Payload<TRIVIAL> {
    /// Payload with id `id`.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            body: [id.wrapping_mul(0x9E37_79B9_7F4A_7C15); 7],
        }
    }
}

impl<const TRIVIAL: bool> Relocate for Payload<TRIVIAL> {
    const TRIVIAL: bool = TRIVIAL;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(*src)
    }
}

/// Array of `n` payloads with ids `0..n`, capacity exactly `n`.
pub fn filled<const TRIVIAL: bool>(n: usize) -> DynArray<Payload<TRIVIAL>> {
    let mut a = DynArray::new();
    if let Err(e) = a.reserve(n) {
        panic!("benchmark setup failed to reserve {n} payloads: {e}");
    }
    if let Err(e) = a.append_iter((0..n as u64).map(Payload::new)) {
        panic!("benchmark setup failed to fill {n} payloads: {e}");
    }
    a
}
