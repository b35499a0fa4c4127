//! Normalized address sets.
//!
//! An [`AddressSpace`] is a sorted list of non-overlapping, non-adjacent
//! inclusive intervals over one address family. All arithmetic is integer.

use super::Interval;
use crate::error::{IpamError, Result};
use crate::models::{addr_to_bits, bits_to_addr, host_mask, lo_mask, Cidr, Family};
use itertools::Itertools;
use num_bigint::BigUint;
use std::fmt;
use std::net::IpAddr;

/// Shape of a block requested from free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// A CIDR block of this prefix length, aligned to its own size.
    Aligned(u8),
    /// Any run of this many consecutive addresses.
    Contiguous(u128),
}

/// A set of addresses of a single family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpace {
    family: Family,
    intervals: Vec<Interval>,
}

impl AddressSpace {
    /// The empty set.
    pub fn empty(family: Family) -> AddressSpace {
        AddressSpace {
            family,
            intervals: Vec::new(),
        }
    }

    /// All addresses of a CIDR block.
    pub fn from_cidr(cidr: &Cidr) -> AddressSpace {
        AddressSpace {
            family: cidr.family(),
            intervals: vec![Interval::new(cidr.lo(), cidr.hi())],
        }
    }

    /// A single address.
    pub fn from_addr(addr: IpAddr) -> AddressSpace {
        let bits = addr_to_bits(addr);
        AddressSpace {
            family: Family::of(addr),
            intervals: vec![Interval::single(bits)],
        }
    }

    /// Build from arbitrary intervals, merging overlaps and neighbours.
    pub fn from_intervals<I>(family: Family, intervals: I) -> Result<AddressSpace>
    where
        I: IntoIterator<Item = Interval>,
    {
        let max = family.max_bits();
        let mut sorted: Vec<Interval> = Vec::new();
        for interval in intervals {
            if interval.last > max {
                return Err(IpamError::Input(format!(
                    "interval {:#x}-{:#x} exceeds {family} address width",
                    interval.first, interval.last
                )));
            }
            sorted.push(interval);
        }
        sorted.sort();

        let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            match merged.last_mut() {
                Some(prev) if prev.touches(&interval) => {
                    prev.last = prev.last.max(interval.last);
                }
                _ => merged.push(interval),
            }
        }
        Ok(AddressSpace {
            family,
            intervals: merged,
        })
    }

    /// Union of the spaces of the given CIDR blocks.
    pub fn from_cidrs<'a, I>(family: Family, cidrs: I) -> Result<AddressSpace>
    where
        I: IntoIterator<Item = &'a Cidr>,
    {
        let mut intervals = Vec::new();
        for cidr in cidrs {
            if cidr.family() != family {
                return Err(family_mismatch(family, cidr.family()));
            }
            intervals.push(Interval::new(cidr.lo(), cidr.hi()));
        }
        AddressSpace::from_intervals(family, intervals)
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Lowest encoded address in the set.
    pub fn first(&self) -> Option<u128> {
        self.intervals.first().map(|i| i.first)
    }

    /// Lowest address in the set.
    pub fn first_addr(&self) -> Option<IpAddr> {
        self.first().map(|bits| bits_to_addr(bits, self.family))
    }

    pub fn contains(&self, bits: u128) -> bool {
        self.intervals
            .binary_search_by(|interval| interval.compare(&bits))
            .is_ok()
    }

    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        Family::of(addr) == self.family && self.contains(addr_to_bits(addr))
    }

    /// True if every address of `other` is in this set.
    pub fn contains_space(&self, other: &AddressSpace) -> bool {
        other.family == self.family
            && other.intervals.iter().all(|o| {
                match self
                    .intervals
                    .binary_search_by(|interval| interval.compare(&o.first))
                {
                    Ok(i) => self.intervals[i].contains_interval(o),
                    Err(_) => false,
                }
            })
    }

    /// True if the two sets share at least one address.
    pub fn overlaps(&self, other: &AddressSpace) -> bool {
        other.family == self.family
            && self.intervals.iter().any(|a| {
                other.intervals.iter().any(|b| a.overlaps(b))
            })
    }

    /// Addresses in either set.
    pub fn union(&self, other: &AddressSpace) -> Result<AddressSpace> {
        self.check_family(other)?;
        AddressSpace::from_intervals(
            self.family,
            self.intervals.iter().chain(other.intervals.iter()).copied(),
        )
    }

    /// Addresses of `self` not in `occupied`.
    pub fn difference(&self, occupied: &AddressSpace) -> Result<AddressSpace> {
        self.check_family(occupied)?;
        let others = &occupied.intervals;
        let mut result = Vec::new();
        let mut j = 0;
        for a in &self.intervals {
            while j < others.len() && others[j].last < a.first {
                j += 1;
            }
            let mut cursor = Some(a.first);
            let mut k = j;
            while let Some(start) = cursor {
                if k >= others.len() || others[k].first > a.last {
                    break;
                }
                let b = others[k];
                if b.first > start {
                    result.push(Interval::new(start, b.first - 1));
                }
                cursor = if b.last >= a.last {
                    None
                } else {
                    Some(b.last + 1)
                };
                k += 1;
            }
            if let Some(start) = cursor {
                result.push(Interval::new(start, a.last));
            }
        }
        Ok(AddressSpace {
            family: self.family,
            intervals: result,
        })
    }

    /// Addresses in both sets.
    pub fn intersection(&self, other: &AddressSpace) -> Result<AddressSpace> {
        self.check_family(other)?;
        let (a, b) = (&self.intervals, &other.intervals);
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let first = a[i].first.max(b[j].first);
            let last = a[i].last.min(b[j].last);
            if first <= last {
                result.push(Interval::new(first, last));
            }
            if a[i].last < b[j].last {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(AddressSpace {
            family: self.family,
            intervals: result,
        })
    }

    /// Exact number of addresses in the set.
    pub fn cardinality(&self) -> BigUint {
        self.intervals.iter().map(|i| i.len()).sum()
    }

    /// Lowest start address of a free block of the requested shape.
    ///
    /// `Fit::Aligned` requires the start to sit on a boundary of the block
    /// size; `Fit::Contiguous` only needs enough consecutive addresses.
    pub fn first_fit(&self, fit: Fit) -> Option<u128> {
        match fit {
            Fit::Aligned(len) => {
                let host = host_mask(len, self.family).ok()?;
                self.intervals.iter().find_map(|interval| {
                    let aligned = if interval.first & host == 0 {
                        interval.first
                    } else {
                        (interval.first | host).checked_add(1)?
                    };
                    (aligned <= interval.last && aligned | host <= interval.last)
                        .then_some(aligned)
                })
            }
            Fit::Contiguous(0) => None,
            Fit::Contiguous(size) => self
                .intervals
                .iter()
                .find(|interval| interval.last - interval.first >= size - 1)
                .map(|interval| interval.first),
        }
    }

    /// Decompose the set into the largest aligned CIDR blocks, in address order.
    pub fn iter_cidrs(&self) -> Vec<Cidr> {
        let max_len = self.family.max_length();
        let mut cidrs = Vec::new();
        for interval in &self.intervals {
            let mut cursor = interval.first;
            loop {
                let mut mask = lo_mask(cursor, self.family);
                // lo_mask never exceeds the family width, so host_mask succeeds
                while mask < max_len && (cursor | host_mask(mask, self.family).unwrap_or(0)) > interval.last {
                    mask += 1;
                }
                let end = cursor | host_mask(mask, self.family).unwrap_or(0);
                cidrs.push(Cidr {
                    addr: bits_to_addr(cursor, self.family),
                    mask,
                });
                if end >= interval.last {
                    break;
                }
                cursor = end + 1;
            }
        }
        cidrs
    }

    /// Every address in the set, lowest first. Lazy; IPv6 sets can be huge.
    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        let family = self.family;
        self.intervals
            .iter()
            .flat_map(|interval| interval.first..=interval.last)
            .map(move |bits| bits_to_addr(bits, family))
    }

    fn check_family(&self, other: &AddressSpace) -> Result<()> {
        if self.family != other.family {
            return Err(family_mismatch(self.family, other.family));
        }
        Ok(())
    }
}

fn family_mismatch(expected: Family, got: Family) -> IpamError {
    IpamError::Input(format!("cannot combine {expected} and {got} address sets"))
}

impl fmt::Display for AddressSpace {
    // Format the set as [first-last, first-last, ...]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranges = self
            .intervals
            .iter()
            .map(|i| {
                format!(
                    "{}-{}",
                    bits_to_addr(i.first, self.family),
                    bits_to_addr(i.last, self.family)
                )
            })
            .join(", ");
        write!(f, "[{ranges}]")
    }
}
