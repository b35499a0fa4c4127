//! Child queries, free space and first-fit allocation.
//!
//! A child belongs to exactly the container's routing context: a prefix in
//! a VRF only nets children in that VRF, and a global prefix only nets
//! global children.

use crate::error::{IpamError, Result};
use crate::models::{
    bits_to_addr, Aggregate, AddressStatus, ChildCandidate, Cidr, Family, IpAddress, IpRange,
    Prefix,
};
use crate::space::{AddressSpace, Fit, Interval};
use crate::store::Store;
use itertools::Itertools;
use num_bigint::BigUint;

/// Union of the spaces occupied by the given records.
pub fn occupied_space<'a, I>(family: Family, candidates: I) -> Result<AddressSpace>
where
    I: IntoIterator<Item = ChildCandidate<'a>>,
{
    let mut intervals = Vec::new();
    for candidate in candidates {
        if candidate.family() != Some(family) {
            return Err(IpamError::Input(format!(
                "{candidate} cannot occupy {family} address space"
            )));
        }
        intervals.push(candidate.range());
    }
    AddressSpace::from_intervals(family, intervals)
}

/// Prefixes of the same VRF strictly inside the container, by network then length.
///
/// A prefix identical to the container is a duplicate, not a child.
pub fn get_child_prefixes<'a>(store: &'a Store, container: &Prefix) -> Vec<&'a Prefix> {
    store
        .prefixes()
        .iter()
        .filter(|p| p.vrf == container.vrf && container.prefix.strictly_contains(&p.prefix))
        .sorted_by_key(|p| (p.prefix.lo(), p.prefix.mask, p.id))
        .collect()
}

/// Ranges of the same VRF lying entirely inside the container, by start address.
///
/// Overlapping ranges are all returned.
pub fn get_child_ranges<'a>(store: &'a Store, container: &Prefix) -> Vec<&'a IpRange> {
    store
        .ip_ranges()
        .iter()
        .filter(|r| r.vrf == container.vrf && r.is_inside(&container.prefix))
        .sorted_by_key(|r| (r.first(), r.last(), r.id))
        .collect()
}

/// Addresses of the same VRF whose host address lies inside the container.
pub fn get_child_ips<'a>(store: &'a Store, container: &Prefix) -> Vec<&'a IpAddress> {
    store
        .ip_addresses()
        .iter()
        .filter(|ip| ip.vrf == container.vrf && container.prefix.contains_addr(ip.host()))
        .sorted_by_key(|ip| (ip.bits(), ip.id))
        .collect()
}

/// Container space not covered by any child prefix.
///
/// Child prefixes with container status still occupy their full range.
pub fn get_available_prefixes(store: &Store, container: &Prefix) -> Result<AddressSpace> {
    let children = get_child_prefixes(store, container);
    let occupied = occupied_space(
        container.family(),
        children.iter().map(|p| ChildCandidate::Prefix(p)),
    )?;
    AddressSpace::from_cidr(&container.prefix).difference(&occupied)
}

/// First free block inside the container.
///
/// Without a length this is the first block of the free space's CIDR
/// decomposition. With a length it is the lowest aligned free block of
/// exactly that length.
///
/// # Arguments
/// * `store` - The records holding the container's children
/// * `container` - The prefix to allocate from
/// * `prefix_length` - Wanted length, or `None` for the first free block
///
/// # Returns
/// The free block, or `Exhaustion` when nothing fits
pub fn get_first_available_prefix(
    store: &Store,
    container: &Prefix,
    prefix_length: Option<u8>,
) -> Result<Cidr> {
    let available = get_available_prefixes(store, container)?;
    first_block(&available, &container.prefix, prefix_length)
}

pub(crate) fn first_block(available: &AddressSpace, container: &Cidr, prefix_length: Option<u8>) -> Result<Cidr> {
    match prefix_length {
        None => available.iter_cidrs().into_iter().next().ok_or_else(|| {
            IpamError::Exhaustion(format!("no free space left in {container}"))
        }),
        Some(len) => {
            check_prefix_length(container, len)?;
            let start = available.first_fit(Fit::Aligned(len)).ok_or_else(|| {
                IpamError::Exhaustion(format!("no free /{len} left in {container}"))
            })?;
            Cidr::from_bits(start, len, container.family())
        }
    }
}

fn check_prefix_length(container: &Cidr, len: u8) -> Result<()> {
    let max = container.family().max_length();
    if len > max {
        return Err(IpamError::Input(format!(
            "/{len} is not a valid {} prefix length",
            container.family()
        )));
    }
    if len < container.mask {
        return Err(IpamError::Input(format!(
            "/{len} is larger than the container {container}"
        )));
    }
    Ok(())
}

/// True for prefixes whose every address can be assigned to a host.
///
/// That is pools, IPv4 /31 and /32, IPv6 /127 and /128.
pub fn is_fully_usable(prefix: &Prefix) -> bool {
    let len = prefix.prefix.mask;
    prefix.is_pool
        || match prefix.family() {
            Family::V4 => len >= 31,
            Family::V6 => len >= 127,
        }
}

/// Addresses of the prefix that may be assigned to hosts.
///
/// IPv4 drops the network and broadcast addresses; IPv6 drops the
/// subnet-router anycast (network) address.
pub fn usable_host_space(prefix: &Prefix) -> AddressSpace {
    let (lo, hi) = (prefix.prefix.lo(), prefix.prefix.hi());
    let family = prefix.family();
    if is_fully_usable(prefix) {
        return AddressSpace::from_cidr(&prefix.prefix);
    }
    let interval = match family {
        Family::V4 => Interval::new(lo + 1, hi - 1),
        Family::V6 => Interval::new(lo + 1, hi),
    };
    // the interval lies inside the prefix, so the family width holds
    AddressSpace::from_intervals(family, [interval]).unwrap_or_else(|_| AddressSpace::empty(family))
}

/// Usable host space not taken by a child address or child range.
///
/// Ranges are unioned first, so overlapping ranges collapse.
pub fn get_available_ips(store: &Store, container: &Prefix) -> Result<AddressSpace> {
    let occupied = assigned_space(store, container)?;
    usable_host_space(container).difference(&occupied)
}

/// Union of child address hosts and child ranges.
pub(crate) fn assigned_space(store: &Store, container: &Prefix) -> Result<AddressSpace> {
    let ips = get_child_ips(store, container);
    let ranges = get_child_ranges(store, container);
    occupied_space(
        container.family(),
        ips.iter()
            .map(|ip| ChildCandidate::Address(ip))
            .chain(ranges.iter().map(|r| ChildCandidate::Range(r))),
    )
}

/// Lowest available address, with the container's mask.
///
/// # Returns
/// The address as a CIDR, or `Exhaustion` when every host is taken
pub fn get_first_available_ip(store: &Store, container: &Prefix) -> Result<Cidr> {
    let available = get_available_ips(store, container)?;
    let addr = available.first_addr().ok_or_else(|| {
        IpamError::Exhaustion(format!("no free address left in {}", container.prefix))
    })?;
    Cidr::from_parts(addr, container.prefix.mask)
}

/// Lowest run of `size` consecutive available addresses, as an unsaved range.
pub fn get_first_available_range(store: &Store, container: &Prefix, size: u128) -> Result<IpRange> {
    if size == 0 {
        return Err(IpamError::Input("range size must be positive".to_string()));
    }
    let usable = usable_host_space(container);
    if usable.cardinality() < BigUint::from(size) {
        return Err(IpamError::Input(format!(
            "{size} addresses do not fit in {}",
            container.prefix
        )));
    }
    let available = get_available_ips(store, container)?;
    let start = available.first_fit(Fit::Contiguous(size)).ok_or_else(|| {
        IpamError::Exhaustion(format!(
            "no run of {size} free addresses left in {}",
            container.prefix
        ))
    })?;
    let family = container.family();
    let mask = container.prefix.mask;
    Ok(IpRange {
        id: 0,
        start_address: Cidr::from_parts(bits_to_addr(start, family), mask)?,
        end_address: Cidr::from_parts(bits_to_addr(start + (size - 1), family), mask)?,
        vrf: container.vrf,
        status: AddressStatus::default(),
    })
}

/// Prefixes of any VRF contained in or equal to the aggregate.
pub fn get_aggregate_child_prefixes<'a>(store: &'a Store, aggregate: &Aggregate) -> Vec<&'a Prefix> {
    store
        .prefixes()
        .iter()
        .filter(|p| aggregate.prefix.contains(&p.prefix))
        .sorted_by_key(|p| (p.prefix.lo(), p.prefix.mask, p.id))
        .collect()
}

/// Aggregate space not covered by any prefix.
pub fn get_aggregate_available_prefixes(store: &Store, aggregate: &Aggregate) -> Result<AddressSpace> {
    let children = get_aggregate_child_prefixes(store, aggregate);
    let occupied = occupied_space(
        aggregate.family(),
        children.iter().map(|p| ChildCandidate::Prefix(p)),
    )?;
    AddressSpace::from_cidr(&aggregate.prefix).difference(&occupied)
}
