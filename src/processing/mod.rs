//! IPAM processing logic.
//!
//! This module contains the queries and checks run against a [`Store`](crate::store::Store):
//! - [`hierarchy`] - Prefix depth and descendant counts per scope
//! - [`allocation`] - Child queries, free space and first-fit allocation
//! - [`utilization`] - Exact utilization percentages
//! - [`vlan`] - VLAN id allocation inside a group
//! - [`uniqueness`] - Duplicate policy and record validation

pub mod allocation;
pub mod hierarchy;
pub mod uniqueness;
pub mod utilization;
pub mod vlan;

// Re-export public functions
pub use allocation::{
    get_aggregate_available_prefixes, get_aggregate_child_prefixes, get_available_ips,
    get_available_prefixes, get_child_ips, get_child_prefixes, get_child_ranges,
    get_first_available_ip, get_first_available_prefix, get_first_available_range,
    usable_host_space,
};
pub use hierarchy::{compute_scope, rebuild_all, HierarchyEntry, Scope};
pub use uniqueness::{check_for_duplicates, get_duplicate_ips, get_duplicate_prefixes};
pub use utilization::{get_aggregate_utilization, get_utilization, Utilization};
pub use vlan::{get_available_vids, get_next_available_vid};
