//! In-memory record store.
//!
//! Every write is validated first and applied second, so a rejected write
//! leaves the store untouched. Prefix writes are followed by recomputation
//! of the affected hierarchy scopes.

mod dataset;

pub use dataset::{read_dataset, write_dataset, Dataset};

use crate::config::Settings;
use crate::error::{IpamError, Result};
use crate::models::{Aggregate, GroupId, IpAddress, IpRange, Prefix, RecordId, Vlan, VlanGroup, Vrf, VrfId};
use crate::processing::hierarchy::{rebuild_scope, Scope};
use crate::processing::uniqueness::{
    validate_aggregate, validate_ip_address, validate_ip_range, validate_prefix, validate_vlan,
    validate_vlan_group,
};
use std::collections::BTreeSet;

fn id_space_exhausted(count: usize) -> IpamError {
    IpamError::Input(format!("record id space exhausted, cannot assign {count} more id(s)"))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    vrfs: Vec<Vrf>,
    aggregates: Vec<Aggregate>,
    prefixes: Vec<Prefix>,
    ip_ranges: Vec<IpRange>,
    ip_addresses: Vec<IpAddress>,
    vlan_groups: Vec<VlanGroup>,
    vlans: Vec<Vlan>,
    next_id: u32,
}

impl Store {
    pub fn new() -> Store {
        Store {
            next_id: 1,
            ..Default::default()
        }
    }

    fn allocate_id(&mut self) -> Result<u32> {
        let id = self.next_id.max(1);
        self.next_id = id.checked_add(1).ok_or_else(|| id_space_exhausted(1))?;
        Ok(id)
    }

    /// Fail before any write when `count` more ids cannot be handed out.
    fn check_id_capacity(&self, count: usize) -> Result<()> {
        let left = (u32::MAX - self.next_id.max(1)) as usize;
        if count > left {
            return Err(id_space_exhausted(count));
        }
        Ok(())
    }

    pub fn vrfs(&self) -> &[Vrf] {
        &self.vrfs
    }

    pub fn vrf(&self, id: VrfId) -> Option<&Vrf> {
        self.vrfs.iter().find(|v| v.id == id)
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn aggregate(&self, id: RecordId) -> Option<&Aggregate> {
        self.aggregates.iter().find(|a| a.id == id)
    }

    pub fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }

    pub fn prefix(&self, id: RecordId) -> Option<&Prefix> {
        self.prefixes.iter().find(|p| p.id == id)
    }

    pub fn ip_ranges(&self) -> &[IpRange] {
        &self.ip_ranges
    }

    pub fn ip_range(&self, id: RecordId) -> Option<&IpRange> {
        self.ip_ranges.iter().find(|r| r.id == id)
    }

    pub fn ip_addresses(&self) -> &[IpAddress] {
        &self.ip_addresses
    }

    pub fn ip_address(&self, id: RecordId) -> Option<&IpAddress> {
        self.ip_addresses.iter().find(|a| a.id == id)
    }

    pub fn vlan_groups(&self) -> &[VlanGroup] {
        &self.vlan_groups
    }

    pub fn vlan_group(&self, id: GroupId) -> Option<&VlanGroup> {
        self.vlan_groups.iter().find(|g| g.id == id)
    }

    pub fn vlans(&self) -> &[Vlan] {
        &self.vlans
    }

    pub fn vlan(&self, id: RecordId) -> Option<&Vlan> {
        self.vlans.iter().find(|v| v.id == id)
    }

    fn check_vrf(&self, vrf: Option<VrfId>) -> Result<()> {
        match vrf {
            Some(id) if self.vrf(id).is_none() => {
                Err(IpamError::Validation(format!("VRF #{id} does not exist")))
            }
            _ => Ok(()),
        }
    }

    /// Recompute depth and descendant counts of one scope.
    pub fn recompute_scope(&mut self, scope: Scope) -> usize {
        rebuild_scope(&mut self.prefixes, scope)
    }

    fn recompute_scopes(&mut self, scopes: BTreeSet<Scope>) {
        for scope in scopes {
            self.recompute_scope(scope);
        }
    }

    pub fn insert_vrf(&mut self, mut vrf: Vrf) -> Result<VrfId> {
        if vrf.name.trim().is_empty() {
            return Err(IpamError::Validation("VRF name must not be empty".to_string()));
        }
        vrf.id = self.allocate_id()?;
        log::info!("Adding VRF #{} {vrf}", vrf.id);
        let id = vrf.id;
        self.vrfs.push(vrf);
        Ok(id)
    }

    pub fn insert_prefix(&mut self, mut prefix: Prefix, settings: &Settings) -> Result<RecordId> {
        prefix.id = 0;
        validate_prefix(self, &prefix, settings)?;
        prefix.id = self.allocate_id()?;
        log::info!("Adding prefix #{} {}", prefix.id, prefix.prefix);
        let (id, scope) = (prefix.id, Scope::of(&prefix));
        self.prefixes.push(prefix);
        self.recompute_scope(scope);
        Ok(id)
    }

    /// Replace a stored prefix. Both the old and the new scope are recomputed.
    pub fn update_prefix(&mut self, prefix: Prefix, settings: &Settings) -> Result<()> {
        let index = self
            .prefixes
            .iter()
            .position(|p| p.id == prefix.id)
            .ok_or(IpamError::NotFound { kind: "prefix", id: prefix.id })?;
        validate_prefix(self, &prefix, settings)?;
        let old_scope = Scope::of(&self.prefixes[index]);
        log::info!(
            "Updating prefix #{} {} -> {}",
            prefix.id,
            self.prefixes[index].prefix,
            prefix.prefix
        );
        let new_scope = Scope::of(&prefix);
        let (depth, children) = (self.prefixes[index].depth, self.prefixes[index].children);
        self.prefixes[index] = Prefix { depth, children, ..prefix };
        self.recompute_scopes(BTreeSet::from([old_scope, new_scope]));
        Ok(())
    }

    pub fn delete_prefix(&mut self, id: RecordId) -> Result<Prefix> {
        let index = self
            .prefixes
            .iter()
            .position(|p| p.id == id)
            .ok_or(IpamError::NotFound { kind: "prefix", id })?;
        let prefix = self.prefixes.remove(index);
        log::info!("Deleted prefix #{id} {}", prefix.prefix);
        self.recompute_scope(Scope::of(&prefix));
        Ok(prefix)
    }

    /// Insert many prefixes at once, skipping the duplicate policy.
    ///
    /// Records are still cleaned and their VRF must exist. Each touched
    /// scope is recomputed once.
    pub fn bulk_insert_prefixes(&mut self, prefixes: Vec<Prefix>) -> Result<Vec<RecordId>> {
        for prefix in &prefixes {
            prefix.clean()?;
            self.check_vrf(prefix.vrf)?;
        }
        self.check_id_capacity(prefixes.len())?;
        let mut scopes = BTreeSet::new();
        let mut ids = Vec::with_capacity(prefixes.len());
        for mut prefix in prefixes {
            prefix.id = self.allocate_id()?;
            scopes.insert(Scope::of(&prefix));
            ids.push(prefix.id);
            self.prefixes.push(prefix);
        }
        log::info!("Bulk added {} prefixes across {} scope(s)", ids.len(), scopes.len());
        self.recompute_scopes(scopes);
        Ok(ids)
    }

    pub fn insert_ip_address(&mut self, mut ip: IpAddress, settings: &Settings) -> Result<RecordId> {
        ip.id = 0;
        validate_ip_address(self, &ip, settings)?;
        ip.id = self.allocate_id()?;
        log::info!("Adding IP address #{} {}", ip.id, ip.address);
        let id = ip.id;
        self.ip_addresses.push(ip);
        Ok(id)
    }

    pub fn update_ip_address(&mut self, ip: IpAddress, settings: &Settings) -> Result<()> {
        let index = self
            .ip_addresses
            .iter()
            .position(|a| a.id == ip.id)
            .ok_or(IpamError::NotFound { kind: "IP address", id: ip.id })?;
        validate_ip_address(self, &ip, settings)?;
        log::info!("Updating IP address #{} -> {}", ip.id, ip.address);
        self.ip_addresses[index] = ip;
        Ok(())
    }

    pub fn delete_ip_address(&mut self, id: RecordId) -> Result<IpAddress> {
        let index = self
            .ip_addresses
            .iter()
            .position(|a| a.id == id)
            .ok_or(IpamError::NotFound { kind: "IP address", id })?;
        let ip = self.ip_addresses.remove(index);
        log::info!("Deleted IP address #{id} {}", ip.address);
        Ok(ip)
    }

    /// Insert many addresses at once, skipping the duplicate policy.
    pub fn bulk_insert_ip_addresses(&mut self, ips: Vec<IpAddress>) -> Result<Vec<RecordId>> {
        for ip in &ips {
            ip.clean()?;
            self.check_vrf(ip.vrf)?;
        }
        self.check_id_capacity(ips.len())?;
        let mut ids = Vec::with_capacity(ips.len());
        for mut ip in ips {
            ip.id = self.allocate_id()?;
            ids.push(ip.id);
            self.ip_addresses.push(ip);
        }
        log::info!("Bulk added {} IP addresses", ids.len());
        Ok(ids)
    }

    pub fn insert_ip_range(&mut self, mut range: IpRange) -> Result<RecordId> {
        validate_ip_range(self, &range)?;
        range.id = self.allocate_id()?;
        log::info!("Adding IP range #{} {range}", range.id);
        let id = range.id;
        self.ip_ranges.push(range);
        Ok(id)
    }

    pub fn delete_ip_range(&mut self, id: RecordId) -> Result<IpRange> {
        let index = self
            .ip_ranges
            .iter()
            .position(|r| r.id == id)
            .ok_or(IpamError::NotFound { kind: "IP range", id })?;
        let range = self.ip_ranges.remove(index);
        log::info!("Deleted IP range #{id} {range}");
        Ok(range)
    }

    pub fn insert_aggregate(&mut self, mut aggregate: Aggregate) -> Result<RecordId> {
        aggregate.id = 0;
        if let Err(e) = validate_aggregate(self, &aggregate) {
            log::warn!("Rejecting aggregate {}: {e}", aggregate.prefix);
            return Err(e);
        }
        aggregate.id = self.allocate_id()?;
        log::info!("Adding aggregate #{} {aggregate}", aggregate.id);
        let id = aggregate.id;
        self.aggregates.push(aggregate);
        Ok(id)
    }

    pub fn delete_aggregate(&mut self, id: RecordId) -> Result<Aggregate> {
        let index = self
            .aggregates
            .iter()
            .position(|a| a.id == id)
            .ok_or(IpamError::NotFound { kind: "aggregate", id })?;
        let aggregate = self.aggregates.remove(index);
        log::info!("Deleted aggregate #{id} {aggregate}");
        Ok(aggregate)
    }

    pub fn insert_vlan_group(&mut self, mut group: VlanGroup) -> Result<GroupId> {
        group.id = 0;
        validate_vlan_group(self, &group)?;
        group.id = self.allocate_id()?;
        log::info!(
            "Adding VLAN group #{} '{}' {}-{}",
            group.id,
            group.name,
            group.min_vid,
            group.max_vid
        );
        let id = group.id;
        self.vlan_groups.push(group);
        Ok(id)
    }

    /// Change a group's name or bounds; existing VLANs must stay inside.
    pub fn update_vlan_group(&mut self, group: VlanGroup) -> Result<()> {
        let index = self
            .vlan_groups
            .iter()
            .position(|g| g.id == group.id)
            .ok_or(IpamError::NotFound { kind: "VLAN group", id: group.id })?;
        validate_vlan_group(self, &group)?;
        self.vlan_groups[index] = group;
        Ok(())
    }

    pub fn insert_vlan(&mut self, mut vlan: Vlan) -> Result<RecordId> {
        vlan.id = 0;
        if let Err(e) = validate_vlan(self, &vlan) {
            log::warn!("Rejecting VLAN {}: {e}", vlan.vid);
            return Err(e);
        }
        vlan.id = self.allocate_id()?;
        log::info!("Adding VLAN #{} vid={} '{}'", vlan.id, vlan.vid, vlan.name);
        let id = vlan.id;
        self.vlans.push(vlan);
        Ok(id)
    }

    pub fn delete_vlan(&mut self, id: RecordId) -> Result<Vlan> {
        let index = self
            .vlans
            .iter()
            .position(|v| v.id == id)
            .ok_or(IpamError::NotFound { kind: "VLAN", id })?;
        let vlan = self.vlans.remove(index);
        log::info!("Deleted VLAN #{id} vid={}", vlan.vid);
        Ok(vlan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Family;

    fn depth_children(store: &Store, id: RecordId) -> (u32, u32) {
        let p = store.prefix(id).unwrap();
        (p.depth, p.children)
    }

    #[test]
    fn test_insert_prefix_recomputes() {
        let settings = Settings::default();
        let mut store = Store::new();
        let a = store.insert_prefix(Prefix::new("10.0.0.0/8").unwrap(), &settings).unwrap();
        let b = store.insert_prefix(Prefix::new("10.1.0.0/16").unwrap(), &settings).unwrap();
        assert_eq!(depth_children(&store, a), (0, 1));
        assert_eq!(depth_children(&store, b), (1, 0));
    }

    #[test]
    fn test_rejected_write_leaves_store_untouched() {
        let settings = Settings::with_global_unique(true);
        let mut store = Store::new();
        store.insert_prefix(Prefix::new("10.0.0.0/8").unwrap(), &settings).unwrap();
        let before = store.clone();
        assert!(store.insert_prefix(Prefix::new("10.0.0.0/8").unwrap(), &settings).is_err());
        assert!(store
            .bulk_insert_prefixes(vec![
                Prefix::new("10.1.0.0/16").unwrap(),
                Prefix::new("10.2.0.0/16").unwrap().with_vrf(Some(99)),
            ])
            .is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_update_prefix_moves_between_scopes() {
        let settings = Settings::default();
        let mut store = Store::new();
        let vrf = store.insert_vrf(Vrf::new("blue", true)).unwrap();
        let a = store.insert_prefix(Prefix::new("10.0.0.0/8").unwrap(), &settings).unwrap();
        let b = store.insert_prefix(Prefix::new("10.1.0.0/16").unwrap(), &settings).unwrap();

        let moved = store.prefix(b).cloned().unwrap().with_vrf(Some(vrf));
        store.update_prefix(moved, &settings).unwrap();
        assert_eq!(depth_children(&store, a), (0, 0));
        assert_eq!(depth_children(&store, b), (0, 0));

        let back = store.prefix(b).cloned().unwrap().with_vrf(None);
        store.update_prefix(back, &settings).unwrap();
        assert_eq!(depth_children(&store, a), (0, 1));
        assert_eq!(depth_children(&store, b), (1, 0));
    }

    #[test]
    fn test_delete_prefix() {
        let settings = Settings::default();
        let mut store = Store::new();
        let a = store.insert_prefix(Prefix::new("10.0.0.0/8").unwrap(), &settings).unwrap();
        let b = store.insert_prefix(Prefix::new("10.1.0.0/16").unwrap(), &settings).unwrap();
        store.delete_prefix(b).unwrap();
        assert_eq!(depth_children(&store, a), (0, 0));
        assert_eq!(
            store.delete_prefix(b),
            Err(IpamError::NotFound { kind: "prefix", id: b })
        );
    }

    #[test]
    fn test_recompute_scope_is_idempotent() {
        let mut store = Store::new();
        store
            .bulk_insert_prefixes(vec![
                Prefix::new("2001:db8::/32").unwrap(),
                Prefix::new("2001:db8::/48").unwrap(),
            ])
            .unwrap();
        assert_eq!(store.recompute_scope(Scope::new(None, Family::V6)), 0);
    }

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut store = Store::new();
        let vrf = store.insert_vrf(Vrf::new("red", false)).unwrap();
        let range = store
            .insert_ip_range(IpRange::new("10.0.0.1/24", "10.0.0.9/24").unwrap())
            .unwrap();
        let gid = store.insert_vlan_group(VlanGroup::new("g", 1, 10)).unwrap();
        assert_eq!(BTreeSet::from([vrf, range, gid]).len(), 3);
        assert!(store.insert_vrf(Vrf::new(" ", true)).is_err());
    }

    #[test]
    fn test_id_space_ceiling() {
        let mut store = Store::new();
        store.next_id = u32::MAX - 1;
        let before = store.clone();
        let err = store
            .bulk_insert_prefixes(vec![
                Prefix::new("10.0.0.0/8").unwrap(),
                Prefix::new("11.0.0.0/8").unwrap(),
            ])
            .unwrap_err();
        assert!(matches!(err, IpamError::Input(_)));
        assert_eq!(store, before);

        let ids = store.bulk_insert_prefixes(vec![Prefix::new("10.0.0.0/8").unwrap()]).unwrap();
        assert_eq!(ids, vec![u32::MAX - 1]);
        assert!(store.insert_vrf(Vrf::new("late", true)).is_err());
        assert_eq!(store.vrfs().len(), 0);
    }

    #[test]
    fn test_update_vlan_group_bounds() {
        let mut store = Store::new();
        let gid = store.insert_vlan_group(VlanGroup::new("g", 1, 100)).unwrap();
        store.insert_vlan(Vlan::new(50, "v50", Some(gid))).unwrap();
        let mut group = store.vlan_group(gid).cloned().unwrap();
        group.max_vid = 40;
        assert!(store.update_vlan_group(group.clone()).is_err());
        group.max_vid = 60;
        store.update_vlan_group(group).unwrap();
        assert_eq!(store.vlan_group(gid).unwrap().max_vid, 60);
    }
}
