//! Plain element fixtures with a chosen relocation path.
//!
//! - [`TrivialProbe`]: relocated by bulk byte copy.
//! - [`SafeProbe`]: relocated element by element through its hook.
//!
//! Both carry the same payload, so running one workload over each compares
//! the two relocation paths directly.

use reloc_core::{ElementError, Relocate};

/// A `u64` payload whose relocatability is fixed by `TRIVIAL`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Probe<const TRIVIAL: bool>(pub u64);

/// Probe taking the byte-copy path.
pub type TrivialProbe = Probe<true>;

/// Probe taking the element-wise path.
pub type SafeProbe = Probe<false>;

impl<const TRIVIAL: bool> Relocate for Probe<TRIVIAL> {
    const TRIVIAL: bool = TRIVIAL;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        Ok(Probe(src.0))
    }
}

impl<const TRIVIAL: bool> From<u64> for Probe<TRIVIAL> {
    fn from(v: u64) -> Self {
        Probe(v)
    }
}

/// `n` probes with payloads `0..n`.
pub fn probes<const TRIVIAL: bool>(n: u64) -> impl Iterator<Item = Probe<TRIVIAL>> {
    (0..n).map(Probe)
}
