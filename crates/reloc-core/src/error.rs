//! Error types shared by the allocator and the dynamic array.
//!
//! Failures fall into three families:
//!
//! - [`AllocError`]: the raw allocator could not satisfy a request.
//! - [`ElementError`]: a user element refused to be constructed or relocated.
//! - [`ArrayError`]: anything a container operation reports to its caller,
//!   wrapping the two above unchanged.
//!
//! Precondition violations (stale positions, unchecked out-of-bounds access)
//! are programmer errors and panic instead of producing one of these values.

use std::error::Error;
use std::fmt;

/// Failures reported by a raw allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying allocator returned no memory.
    OutOfMemory {
        /// Requested block size in bytes.
        size: usize,
        /// Requested block alignment in bytes.
        align: usize,
    },
    /// `count * elem_size` does not fit in a valid layout.
    LayoutOverflow {
        /// Number of objects requested.
        count: usize,
        /// Size of a single object in bytes.
        elem_size: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { size, align } => {
                write!(f, "out of memory: {size} bytes aligned to {align}")
            }
            Self::LayoutOverflow { count, elem_size } => {
                write!(f, "layout overflow: {count} objects of {elem_size} bytes")
            }
        }
    }
}

impl Error for AllocError {}

/// A user element failed to construct or relocate.
///
/// Returned by fallible element producers and by
/// [`Relocate::move_construct`](crate::Relocate::move_construct). Container
/// operations pass it through unchanged inside [`ArrayError::Element`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl ElementError {
    /// Create an element error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element construction failed: {}", self.reason)
    }
}

impl Error for ElementError {}

/// Errors returned by dynamic array operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// Storage could not be allocated.
    Alloc(AllocError),
    /// The requested length exceeds what the element type can address.
    CapacityOverflow {
        /// Number of elements the operation needed room for.
        requested: usize,
    },
    /// Checked access with an index past the end.
    OutOfRange {
        /// The offending index.
        index: usize,
        /// Number of live elements at the time of the access.
        len: usize,
    },
    /// An element constructor or relocation hook failed.
    Element(ElementError),
    /// A growth configuration was rejected at construction.
    InvalidConfig {
        /// Description of the rejected parameter.
        reason: String,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "allocation failed: {e}"),
            Self::CapacityOverflow { requested } => {
                write!(f, "capacity overflow: {requested} elements requested")
            }
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::Element(e) => write!(f, "{e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid growth config: {reason}"),
        }
    }
}

impl Error for ArrayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            Self::Element(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocError> for ArrayError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<ElementError> for ArrayError {
    fn from(e: ElementError) -> Self {
        Self::Element(e)
    }
}
