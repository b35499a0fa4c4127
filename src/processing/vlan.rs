//! VLAN id allocation within a group.

use crate::error::{IpamError, Result};
use crate::models::{ChildCandidate, Vlan, VlanGroup};
use crate::store::Store;
use std::collections::BTreeSet;

/// VLANs owned by the group, by vid.
pub fn get_child_vlans<'a>(store: &'a Store, group: &VlanGroup) -> Vec<&'a Vlan> {
    let mut vlans: Vec<&Vlan> = store
        .vlans()
        .iter()
        .filter(|v| v.group == Some(group.id))
        .collect();
    vlans.sort_by_key(|v| (v.vid, v.id));
    vlans
}

/// Ids in `[min_vid, max_vid]` not used by any VLAN of the group, ascending.
pub fn get_available_vids(store: &Store, group: &VlanGroup) -> Vec<u16> {
    let used: BTreeSet<u128> = get_child_vlans(store, group)
        .into_iter()
        .map(|v| ChildCandidate::Vlan(v).range().first)
        .collect();
    (group.min_vid..=group.max_vid)
        .filter(|vid| !used.contains(&(*vid as u128)))
        .collect()
}

/// Lowest unused id of the group.
///
/// # Returns
/// The id, or `Exhaustion` when the whole group range is in use
pub fn get_next_available_vid(store: &Store, group: &VlanGroup) -> Result<u16> {
    get_available_vids(store, group)
        .into_iter()
        .next()
        .ok_or_else(|| {
            IpamError::Exhaustion(format!(
                "no free VLAN id left in group '{}' ({}-{})",
                group.name, group.min_vid, group.max_vid
            ))
        })
}
