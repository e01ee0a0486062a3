//! Test utilities and instrumented types for reloc development.
//!
//! Provides an element type that records every construction, relocation and
//! drop ([`Tracked`], registered with a [`Tracker`]), plain probes with a
//! chosen relocatability ([`Probe`]), and a stateful allocator that counts
//! and can refuse requests ([`CountingAlloc`]).

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod alloc;
pub mod fixtures;

pub use alloc::{AllocStats, CountingAlloc};
pub use fixtures::{probes, Probe, SafeProbe, TrivialProbe};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use reloc_core::{ElementError, Relocate};

#[derive(Default)]
struct TrackerState {
    next_id: u64,
    /// Live instances by id, in construction order.
    live: IndexMap<u64, i64>,
    constructed: usize,
    relocated: usize,
    dropped: usize,
    /// Fallible steps (make or relocate) taken since the last `fail_at`.
    steps: usize,
    fail_at: Option<usize>,
}

impl TrackerState {
    fn register(&mut self, value: i64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, value);
        self.constructed += 1;
        id
    }

    fn step(&mut self, what: &str) -> Result<(), ElementError> {
        let n = self.steps;
        self.steps += 1;
        if self.fail_at == Some(n) {
            self.fail_at = None;
            return Err(ElementError::new(format!("{what} #{n} refused")));
        }
        Ok(())
    }
}

/// Registry of live [`Tracked`] instances.
///
/// Cloning a tracker shares the registry. Dropping an instance that is not
/// live (a double drop) panics.
#[derive(Clone, Default)]
pub struct Tracker {
    state: Rc<RefCell<TrackerState>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an instance through the fallible path.
    pub fn make(&self, value: i64) -> Result<Tracked, ElementError> {
        let mut st = self.state.borrow_mut();
        st.step("construction")?;
        let id = st.register(value);
        Ok(Tracked {
            id,
            value,
            tracker: self.clone(),
        })
    }

    /// Construct an instance that never fails and does not count as a step.
    pub fn track(&self, value: i64) -> Tracked {
        let id = self.state.borrow_mut().register(value);
        Tracked {
            id,
            value,
            tracker: self.clone(),
        }
    }

    /// Fail the `n`-th fallible step from now (0-based), once.
    pub fn fail_at(&self, n: usize) {
        let mut st = self.state.borrow_mut();
        st.steps = 0;
        st.fail_at = Some(n);
    }

    /// Cancel a pending failure.
    pub fn disarm(&self) {
        self.state.borrow_mut().fail_at = None;
    }

    /// Whether a failure is still pending.
    pub fn armed(&self) -> bool {
        self.state.borrow().fail_at.is_some()
    }

    /// Number of live instances.
    pub fn live(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Values of the live instances, in construction order.
    pub fn live_values(&self) -> Vec<i64> {
        self.state.borrow().live.values().copied().collect()
    }

    pub fn constructed(&self) -> usize {
        self.state.borrow().constructed
    }

    pub fn relocated(&self) -> usize {
        self.state.borrow().relocated
    }

    pub fn dropped(&self) -> usize {
        self.state.borrow().dropped
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("Tracker")
            .field("live", &st.live.len())
            .field("constructed", &st.constructed)
            .field("relocated", &st.relocated)
            .field("dropped", &st.dropped)
            .finish()
    }
}

/// An element that reports its lifecycle to a [`Tracker`].
///
/// Not trivially relocatable: every relocation goes through
/// [`Relocate::move_construct`], which registers a fresh instance and may be
/// made to fail with [`Tracker::fail_at`].
pub struct Tracked {
    id: u64,
    value: i64,
    tracker: Tracker,
}

impl Tracked {
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn set(&mut self, value: i64) {
        self.value = value;
        if let Some(v) = self.tracker.state.borrow_mut().live.get_mut(&self.id) {
            *v = value;
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.tracker.track(self.value)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut st = self.tracker.state.borrow_mut();
        if st.live.shift_remove(&self.id).is_none() {
            drop(st);
            panic!("double drop of tracked instance {} ({})", self.id, self.value);
        }
        st.dropped += 1;
    }
}

impl Relocate for Tracked {
    const TRIVIAL: bool = false;

    fn move_construct(src: &mut Self) -> Result<Self, ElementError> {
        let mut st = src.tracker.state.borrow_mut();
        st.step("relocation")?;
        st.relocated += 1;
        let id = st.register(src.value);
        Ok(Tracked {
            id,
            value: src.value,
            tracker: src.tracker.clone(),
        })
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<i64> for Tracked {
    fn eq(&self, other: &i64) -> bool {
        self.value == *other
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.value)
    }
}
