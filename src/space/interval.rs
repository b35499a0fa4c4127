//! Inclusive interval of encoded addresses.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An inclusive run `[first, last]` of encoded addresses.
///
/// Inclusive bounds let the whole IPv6 space be represented in `u128`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub first: u128,
    pub last: u128,
}

impl Interval {
    /// Create an interval; the bounds are swapped if given in reverse.
    pub fn new(first: u128, last: u128) -> Interval {
        if first <= last {
            Interval { first, last }
        } else {
            Interval {
                first: last,
                last: first,
            }
        }
    }

    pub fn single(value: u128) -> Interval {
        Interval {
            first: value,
            last: value,
        }
    }

    /// Number of values covered, exact.
    pub fn len(&self) -> BigUint {
        BigUint::from(self.last - self.first) + BigUint::from(1u8)
    }

    pub fn contains(&self, value: u128) -> bool {
        self.first <= value && value <= self.last
    }

    pub fn contains_interval(&self, other: &Interval) -> bool {
        self.first <= other.first && other.last <= self.last
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// True if the two can be merged into one interval without a gap.
    pub fn touches(&self, other: &Interval) -> bool {
        self.overlaps(other)
            || self.last.checked_add(1) == Some(other.first)
            || other.last.checked_add(1) == Some(self.first)
    }

    /// Compare the interval to a value, for binary search.
    pub fn compare(&self, value: &u128) -> Ordering {
        if self.contains(*value) {
            Ordering::Equal
        } else if self.last < *value {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}
