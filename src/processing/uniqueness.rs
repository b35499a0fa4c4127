//! Duplicate detection and validate-before-save checks.
//!
//! Enforcement scope: a record in a VRF follows that VRF's
//! `enforce_unique` flag; a global record follows
//! [`Settings::enforce_global_unique`].

use crate::config::Settings;
use crate::error::{IpamError, Result};
use crate::models::{Aggregate, IpAddress, IpRange, Prefix, Vlan, VlanGroup, VrfId};
use crate::space::AddressSpace;
use crate::store::Store;
use itertools::Itertools;
use std::collections::HashSet;

/// Other prefixes of the same VRF with the same network and length.
pub fn get_duplicate_prefixes<'a>(store: &'a Store, prefix: &Prefix) -> Vec<&'a Prefix> {
    store
        .prefixes()
        .iter()
        .filter(|p| p.id != prefix.id && p.vrf == prefix.vrf && p.prefix.same_network(&prefix.prefix))
        .collect()
}

/// Other addresses of the same VRF with the same host address. Masks are ignored.
pub fn get_duplicate_ips<'a>(store: &'a Store, ip: &IpAddress) -> Vec<&'a IpAddress> {
    store
        .ip_addresses()
        .iter()
        .filter(|other| other.id != ip.id && other.vrf == ip.vrf && other.host() == ip.host())
        .collect()
}

/// Whether duplicates are rejected for records in `vrf`.
pub fn enforcement_active(store: &Store, vrf: Option<VrfId>, settings: &Settings) -> Result<bool> {
    match vrf {
        Some(id) => store
            .vrf(id)
            .map(|v| v.enforce_unique)
            .ok_or_else(|| IpamError::Validation(format!("VRF #{id} does not exist"))),
        None => Ok(settings.enforce_global_unique),
    }
}

fn scope_name(store: &Store, vrf: Option<VrfId>) -> String {
    match vrf.and_then(|id| store.vrf(id)) {
        Some(v) => format!("VRF {v}"),
        None => "global table".to_string(),
    }
}

/// Validate a prefix before it is written.
///
/// # Arguments
/// * `store` - The records the prefix will join
/// * `prefix` - The new or updated prefix
/// * `settings` - Global uniqueness policy
///
/// # Returns
/// `Validation` when the prefix is malformed, names an unknown VRF, or
/// duplicates an existing prefix while enforcement is active
pub fn validate_prefix(store: &Store, prefix: &Prefix, settings: &Settings) -> Result<()> {
    prefix.clean()?;
    if !enforcement_active(store, prefix.vrf, settings)? {
        return Ok(());
    }
    let duplicates = get_duplicate_prefixes(store, prefix);
    if let Some(first) = duplicates.first() {
        log::warn!(
            "Rejecting prefix {}: {} duplicate(s) in {}",
            prefix.prefix,
            duplicates.len(),
            scope_name(store, prefix.vrf)
        );
        return Err(IpamError::Validation(format!(
            "duplicate prefix found in {}: {} (#{})",
            scope_name(store, prefix.vrf),
            first.prefix,
            first.id
        )));
    }
    Ok(())
}

/// Validate an address before it is written.
///
/// Duplicates are tolerated only when the new address and every existing
/// duplicate carry a non-unique role.
pub fn validate_ip_address(store: &Store, ip: &IpAddress, settings: &Settings) -> Result<()> {
    ip.clean()?;
    if !enforcement_active(store, ip.vrf, settings)? {
        return Ok(());
    }
    let exempt = |candidate: &IpAddress| {
        candidate
            .role
            .map(|role| settings.nonunique_roles.contains(&role))
            .unwrap_or(false)
    };
    let duplicates = get_duplicate_ips(store, ip);
    if duplicates.is_empty() {
        return Ok(());
    }
    if exempt(ip) && duplicates.iter().all(|d| exempt(*d)) {
        log::debug!(
            "Allowing {} with {} non-unique duplicate(s)",
            ip.address,
            duplicates.len()
        );
        return Ok(());
    }
    log::warn!(
        "Rejecting IP address {}: duplicates {}",
        ip.address,
        duplicates.iter().map(|d| format!("#{}", d.id)).join(",")
    );
    Err(IpamError::Validation(format!(
        "duplicate IP address found in {}: {} (#{})",
        scope_name(store, ip.vrf),
        duplicates[0].address,
        duplicates[0].id
    )))
}

/// Validate a range before it is written. Overlapping ranges are allowed.
pub fn validate_ip_range(store: &Store, range: &IpRange) -> Result<()> {
    range.clean()?;
    if let Some(id) = range.vrf {
        if store.vrf(id).is_none() {
            return Err(IpamError::Validation(format!("VRF #{id} does not exist")));
        }
    }
    Ok(())
}

/// Validate an aggregate; aggregates may not overlap each other.
pub fn validate_aggregate(store: &Store, aggregate: &Aggregate) -> Result<()> {
    aggregate.clean()?;
    let space = AddressSpace::from_cidr(&aggregate.prefix);
    let covering = store
        .aggregates()
        .iter()
        .filter(|a| a.id != aggregate.id)
        .find(|a| AddressSpace::from_cidr(&a.prefix).overlaps(&space));
    if let Some(existing) = covering {
        return Err(IpamError::Validation(format!(
            "aggregates cannot overlap: {} is already covered by {}",
            aggregate.prefix, existing
        )));
    }
    Ok(())
}

/// Validate a VLAN group's bounds against the VLANs it already owns.
pub fn validate_vlan_group(store: &Store, group: &VlanGroup) -> Result<()> {
    group.clean()?;
    let outside = store
        .vlans()
        .iter()
        .filter(|v| v.group == Some(group.id) && group.id != 0)
        .find(|v| !group.contains(v.vid));
    if let Some(vlan) = outside {
        return Err(IpamError::Validation(format!(
            "VLAN group '{}' bounds {}-{} exclude existing VLAN {}",
            group.name, group.min_vid, group.max_vid, vlan.vid
        )));
    }
    Ok(())
}

/// Validate a VLAN: inside its group's bounds and unique within the group.
pub fn validate_vlan(store: &Store, vlan: &Vlan) -> Result<()> {
    vlan.clean()?;
    let Some(group_id) = vlan.group else {
        return Ok(());
    };
    let group = store
        .vlan_group(group_id)
        .ok_or_else(|| IpamError::Validation(format!("VLAN group #{group_id} does not exist")))?;
    if !group.contains(vlan.vid) {
        return Err(IpamError::Validation(format!(
            "VLAN id {} outside group '{}' range {}-{}",
            vlan.vid, group.name, group.min_vid, group.max_vid
        )));
    }
    if store
        .vlans()
        .iter()
        .any(|v| v.id != vlan.id && v.group == Some(group_id) && v.vid == vlan.vid)
    {
        return Err(IpamError::Validation(format!(
            "VLAN id {} already exists in group '{}'",
            vlan.vid, group.name
        )));
    }
    Ok(())
}

/// Audit a whole store against the uniqueness policy.
///
/// Returns an error naming the first violation found.
pub fn check_for_duplicates(store: &Store, settings: &Settings) -> Result<()> {
    let mut seen = HashSet::new();
    for prefix in store.prefixes() {
        if !enforcement_active(store, prefix.vrf, settings)? {
            continue;
        }
        if !seen.insert((prefix.vrf, prefix.prefix)) {
            return Err(IpamError::Validation(format!(
                "duplicate prefix found: {prefix}"
            )));
        }
    }
    for ip in store.ip_addresses() {
        if get_duplicate_ips(store, ip).is_empty() {
            continue;
        }
        validate_ip_address(store, ip, settings)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressRole, Vrf};

    #[test]
    fn test_get_duplicate_prefixes() {
        let mut store = Store::new();
        let ids = store
            .bulk_insert_prefixes(vec![
                Prefix::new("192.0.2.0/24").unwrap(),
                Prefix::new("192.0.2.0/24").unwrap(),
                Prefix::new("192.0.2.0/24").unwrap(),
                Prefix::new("192.0.2.0/25").unwrap(),
            ])
            .unwrap();
        let first = store.prefix(ids[0]).unwrap().clone();
        let dups: HashSet<u32> = get_duplicate_prefixes(&store, &first).iter().map(|p| p.id).collect();
        assert_eq!(dups, HashSet::from([ids[1], ids[2]]));
    }

    #[test]
    fn test_get_duplicate_ips_ignores_mask() {
        let mut store = Store::new();
        let ids = store
            .bulk_insert_ip_addresses(vec![
                IpAddress::new("192.0.2.1/24").unwrap(),
                IpAddress::new("192.0.2.1/24").unwrap(),
                IpAddress::new("192.0.2.1/25").unwrap(),
            ])
            .unwrap();
        let first = store.ip_address(ids[0]).unwrap().clone();
        let dups: HashSet<u32> = get_duplicate_ips(&store, &first).iter().map(|p| p.id).collect();
        assert_eq!(dups, HashSet::from([ids[1], ids[2]]));
    }

    #[test]
    fn test_prefix_global_policy() {
        let mut store = Store::new();
        store.bulk_insert_prefixes(vec![Prefix::new("192.0.2.0/24").unwrap()]).unwrap();
        let duplicate = Prefix::new("192.0.2.0/24").unwrap();
        assert!(validate_prefix(&store, &duplicate, &Settings::with_global_unique(false)).is_ok());
        assert!(matches!(
            validate_prefix(&store, &duplicate, &Settings::with_global_unique(true)),
            Err(IpamError::Validation(_))
        ));
    }

    #[test]
    fn test_prefix_vrf_policy() {
        let mut store = Store::new();
        let loose = store.insert_vrf(Vrf::new("loose", false)).unwrap();
        let strict = store.insert_vrf(Vrf::new("strict", true)).unwrap();
        store
            .bulk_insert_prefixes(vec![
                Prefix::new("192.0.2.0/24").unwrap().with_vrf(Some(loose)),
                Prefix::new("192.0.2.0/24").unwrap().with_vrf(Some(strict)),
            ])
            .unwrap();
        // the VRF flag wins over the global flag
        let settings = Settings::with_global_unique(true);
        let dup_loose = Prefix::new("192.0.2.0/24").unwrap().with_vrf(Some(loose));
        assert!(validate_prefix(&store, &dup_loose, &settings).is_ok());
        let settings = Settings::with_global_unique(false);
        let dup_strict = Prefix::new("192.0.2.0/24").unwrap().with_vrf(Some(strict));
        assert!(validate_prefix(&store, &dup_strict, &settings).is_err());
        // a global copy is not a duplicate of a VRF record
        let global = Prefix::new("192.0.2.0/24").unwrap();
        assert!(validate_prefix(&store, &global, &Settings::with_global_unique(true)).is_ok());
    }

    #[test]
    fn test_unknown_vrf_rejected() {
        let store = Store::new();
        let prefix = Prefix::new("192.0.2.0/24").unwrap().with_vrf(Some(42));
        assert!(validate_prefix(&store, &prefix, &Settings::default()).is_err());
    }

    #[test]
    fn test_ip_role_exemptions() {
        let settings = Settings::with_global_unique(true);
        let vip = Some(AddressRole::Vip);

        let mut store = Store::new();
        store.bulk_insert_ip_addresses(vec![IpAddress::new("192.0.2.1/24").unwrap()]).unwrap();
        let new_vip = IpAddress::new("192.0.2.1/24").unwrap().with_role(vip);
        assert!(validate_ip_address(&store, &new_vip, &settings).is_err());

        let mut store = Store::new();
        store
            .bulk_insert_ip_addresses(vec![IpAddress::new("192.0.2.1/24").unwrap().with_role(vip)])
            .unwrap();
        let plain = IpAddress::new("192.0.2.1/24").unwrap();
        assert!(validate_ip_address(&store, &plain, &settings).is_err());
        assert!(validate_ip_address(&store, &new_vip, &settings).is_ok());

        let loopback = IpAddress::new("192.0.2.1/24").unwrap().with_role(Some(AddressRole::Loopback));
        assert!(validate_ip_address(&store, &loopback, &settings).is_err());
    }

    #[test]
    fn test_aggregate_overlap() {
        let mut store = Store::new();
        store.insert_aggregate(Aggregate::new("10.0.0.0/8", "RFC1918").unwrap()).unwrap();
        assert!(validate_aggregate(&store, &Aggregate::new("10.16.0.0/12", "RFC1918").unwrap()).is_err());
        assert!(validate_aggregate(&store, &Aggregate::new("172.16.0.0/12", "RFC1918").unwrap()).is_ok());
    }

    #[test]
    fn test_validate_vlan() {
        let mut store = Store::new();
        let gid = store.insert_vlan_group(VlanGroup::new("g", 100, 199)).unwrap();
        store.insert_vlan(Vlan::new(100, "a", Some(gid))).unwrap();
        assert!(validate_vlan(&store, &Vlan::new(100, "dup", Some(gid))).is_err());
        assert!(validate_vlan(&store, &Vlan::new(200, "out", Some(gid))).is_err());
        assert!(validate_vlan(&store, &Vlan::new(101, "ok", Some(gid))).is_ok());
        assert!(validate_vlan(&store, &Vlan::new(101, "nogroup", Some(99))).is_err());

        let mut shrunk = store.vlan_group(gid).cloned().unwrap();
        shrunk.min_vid = 150;
        assert!(validate_vlan_group(&store, &shrunk).is_err());
    }

    #[test]
    fn test_check_for_duplicates() {
        let mut store = Store::new();
        store
            .bulk_insert_prefixes(vec![Prefix::new("192.0.2.0/24").unwrap(), Prefix::new("192.0.2.0/24").unwrap()])
            .unwrap();
        assert!(check_for_duplicates(&store, &Settings::with_global_unique(false)).is_ok());
        assert!(check_for_duplicates(&store, &Settings::with_global_unique(true)).is_err());
    }
}
