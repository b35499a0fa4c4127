//! Utilization of prefixes and aggregates, as exact percentages.

use super::allocation::{
    assigned_space, get_aggregate_child_prefixes, get_child_prefixes, occupied_space,
    usable_host_space,
};
use crate::error::Result;
use crate::models::{Aggregate, ChildCandidate, Prefix};
use crate::space::AddressSpace;
use crate::store::Store;
use num_bigint::BigUint;
use num_rational::Ratio;
use num_traits::{ToPrimitive, Zero};
use std::fmt;

/// Share of a container's space in use, as an exact percentage in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Utilization {
    percent: Ratio<BigUint>,
}

impl Utilization {
    /// `used / total * 100`, clamped to 100. An empty total counts as unused.
    pub fn from_counts(used: BigUint, total: BigUint) -> Utilization {
        if total.is_zero() {
            return Utilization::from_percent(0);
        }
        let percent = Ratio::new(used * BigUint::from(100u8), total);
        let full = Ratio::from_integer(BigUint::from(100u8));
        Utilization {
            percent: percent.min(full),
        }
    }

    /// A whole-number percentage, clamped to 100.
    pub fn from_percent(percent: u32) -> Utilization {
        Utilization {
            percent: Ratio::from_integer(BigUint::from(percent.min(100))),
        }
    }

    /// The exact percentage.
    pub fn percent(&self) -> &Ratio<BigUint> {
        &self.percent
    }

    /// Lossy conversion for display.
    pub fn to_f64(&self) -> f64 {
        let numer = self.percent.numer().to_f64().unwrap_or(f64::MAX);
        let denom = self.percent.denom().to_f64().unwrap_or(f64::MAX);
        numer / denom
    }

    pub fn is_full(&self) -> bool {
        self.percent >= Ratio::from_integer(BigUint::from(100u8))
    }
}

impl fmt::Display for Utilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.to_f64())
    }
}

/// Utilization of a prefix.
///
/// Container prefixes count the union of their child prefixes against the
/// whole block. Other prefixes count child addresses and child ranges
/// against the usable host space. `mark_utilized` reports 100.
///
/// # Arguments
/// * `store` - The records holding the prefix's children
/// * `prefix` - The prefix to measure
///
/// # Returns
/// An exact percentage in `[0, 100]`
pub fn get_utilization(store: &Store, prefix: &Prefix) -> Result<Utilization> {
    if prefix.mark_utilized {
        return Ok(Utilization::from_percent(100));
    }
    if prefix.is_container() {
        let children = get_child_prefixes(store, prefix);
        let covered = occupied_space(
            prefix.family(),
            children.iter().map(|p| ChildCandidate::Prefix(p)),
        )?;
        return Ok(Utilization::from_counts(
            covered.cardinality(),
            prefix.prefix.size(),
        ));
    }
    let usable = usable_host_space(prefix);
    let assigned = assigned_space(store, prefix)?.intersection(&usable)?;
    Ok(Utilization::from_counts(
        assigned.cardinality(),
        usable.cardinality(),
    ))
}

/// Utilization of an aggregate by the prefixes inside it, from any VRF.
pub fn get_aggregate_utilization(store: &Store, aggregate: &Aggregate) -> Result<Utilization> {
    let children = get_aggregate_child_prefixes(store, aggregate);
    let covered = occupied_space(
        aggregate.family(),
        children.iter().map(|p| ChildCandidate::Prefix(p)),
    )?
    .intersection(&AddressSpace::from_cidr(&aggregate.prefix))?;
    Ok(Utilization::from_counts(
        covered.cardinality(),
        aggregate.prefix.size(),
    ))
}
