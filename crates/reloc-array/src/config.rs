//! Growth policy parameters.

use reloc_core::ArrayError;

/// Geometric growth policy for a [`DynArray`](crate::DynArray).
///
/// When an append needs more room than the current capacity, the new
/// capacity is the largest of the required size, the current capacity scaled
/// by `numerator / denominator`, and `min_capacity`. Exact requests
/// ([`DynArray::reserve`](crate::DynArray::reserve)) bypass the policy.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthConfig {
    min_capacity: usize,
    numerator: usize,
    denominator: usize,
}

impl GrowthConfig {
    /// Default smallest non-zero capacity.
    pub const DEFAULT_MIN_CAPACITY: usize = 4;

    /// Default growth factor numerator.
    pub const DEFAULT_NUMERATOR: usize = 2;

    /// Default growth factor denominator.
    pub const DEFAULT_DENOMINATOR: usize = 1;

    /// Create a growth policy.
    ///
    /// `min_capacity` must be at least 1 and the factor
    /// `numerator / denominator` must be strictly greater than 1.
    pub fn new(
        min_capacity: usize,
        numerator: usize,
        denominator: usize,
    ) -> Result<Self, ArrayError> {
        if min_capacity == 0 {
            return Err(ArrayError::InvalidConfig {
                reason: "min_capacity must be at least 1".into(),
            });
        }
        if denominator == 0 {
            return Err(ArrayError::InvalidConfig {
                reason: "denominator must be non-zero".into(),
            });
        }
        if numerator <= denominator {
            return Err(ArrayError::InvalidConfig {
                reason: format!("growth factor {numerator}/{denominator} must exceed 1"),
            });
        }
        Ok(Self {
            min_capacity,
            numerator,
            denominator,
        })
    }

    /// Smallest capacity the first growth allocates.
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    /// Growth factor as `(numerator, denominator)`.
    pub fn factor(&self) -> (usize, usize) {
        (self.numerator, self.denominator)
    }

    /// Capacity to grow to from `current` so that `required` elements fit.
    ///
    /// Never returns less than `required`. The scaled term saturates instead
    /// of overflowing.
    pub fn grown_capacity(&self, current: usize, required: usize) -> usize {
        let scaled = current
            .checked_mul(self.numerator)
            .map(|n| n / self.denominator)
            .unwrap_or(usize::MAX / self.denominator.max(1));
        required.max(scaled).max(self.min_capacity)
    }
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_capacity: Self::DEFAULT_MIN_CAPACITY,
            numerator: Self::DEFAULT_NUMERATOR,
            denominator: Self::DEFAULT_DENOMINATOR,
        }
    }
}
