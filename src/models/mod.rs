//! Domain models for address management.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`Cidr`] - IPv4/IPv6 address with CIDR notation support
//! - [`Prefix`], [`IpRange`], [`IpAddress`], [`Aggregate`] - address records
//! - [`Vrf`] - routing context
//! - [`VlanGroup`] and [`Vlan`] - scalar id allocation
//! - [`ChildCandidate`] - any record that can occupy space in a container

mod address;
mod aggregate;
mod candidate;
mod cidr;
mod prefix;
mod vlan;
mod vrf;

/// Record id assigned by the store.
pub type RecordId = u32;
/// Id of a routing context.
pub type VrfId = u32;
/// Id of a VLAN group.
pub type GroupId = u32;

// Re-export public types
pub use address::{AddressRole, AddressStatus, IpAddress, IpRange};
pub use aggregate::Aggregate;
pub use candidate::ChildCandidate;
pub use cidr::{
    addr_to_bits, bits_to_addr, block_size, host_mask, lo_mask, Cidr, Family,
};
pub use prefix::{Prefix, PrefixStatus};
pub use vlan::{Vlan, VlanGroup, VLAN_VID_MAX, VLAN_VID_MIN};
pub use vrf::Vrf;
