//! Individual IP address and IP range data models.

use super::{addr_to_bits, Cidr, Family, RecordId, VrfId};
use crate::error::{IpamError, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Operational status of an address or range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressStatus {
    #[default]
    Active,
    Reserved,
    Deprecated,
    Dhcp,
    Slaac,
}

/// Functional role of an address.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    Loopback,
    Secondary,
    Anycast,
    Vip,
    Vrrp,
    Hsrp,
    Glbp,
    Carp,
}

impl AddressRole {
    /// Parse a lowercase role name.
    pub fn from_name(name: &str) -> Option<AddressRole> {
        match name.trim().to_ascii_lowercase().as_str() {
            "loopback" => Some(AddressRole::Loopback),
            "secondary" => Some(AddressRole::Secondary),
            "anycast" => Some(AddressRole::Anycast),
            "vip" => Some(AddressRole::Vip),
            "vrrp" => Some(AddressRole::Vrrp),
            "hsrp" => Some(AddressRole::Hsrp),
            "glbp" => Some(AddressRole::Glbp),
            "carp" => Some(AddressRole::Carp),
            _ => None,
        }
    }

    /// Roles that may legitimately share an address.
    pub fn default_nonunique() -> Vec<AddressRole> {
        vec![
            AddressRole::Anycast,
            AddressRole::Vip,
            AddressRole::Vrrp,
            AddressRole::Hsrp,
            AddressRole::Glbp,
            AddressRole::Carp,
        ]
    }
}

/// A single host address, carrying the mask of its network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IpAddress {
    #[serde(default)]
    pub id: RecordId,
    pub address: Cidr,
    #[serde(default)]
    pub vrf: Option<VrfId>,
    #[serde(default)]
    pub status: AddressStatus,
    #[serde(default)]
    pub role: Option<AddressRole>,
}

impl IpAddress {
    /// Create a global, active address from text such as "10.0.0.1/24".
    pub fn new(address: &str) -> Result<IpAddress> {
        Ok(IpAddress::from_cidr(Cidr::new(address)?))
    }

    pub fn from_cidr(address: Cidr) -> IpAddress {
        IpAddress {
            id: 0,
            address,
            vrf: None,
            status: AddressStatus::default(),
            role: None,
        }
    }

    pub fn with_vrf(mut self, vrf: Option<VrfId>) -> IpAddress {
        self.vrf = vrf;
        self
    }

    pub fn with_role(mut self, role: Option<AddressRole>) -> IpAddress {
        self.role = role;
        self
    }

    pub fn family(&self) -> Family {
        self.address.family()
    }

    /// The host address without its mask.
    pub fn host(&self) -> IpAddr {
        self.address.addr
    }

    pub fn bits(&self) -> u128 {
        addr_to_bits(self.address.addr)
    }

    pub fn clean(&self) -> Result<()> {
        if self.address.mask == 0 {
            return Err(IpamError::Validation(format!(
                "cannot create IP address with /0 mask: {}",
                self.address
            )));
        }
        Ok(())
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// A contiguous, inclusive run of addresses not aligned to CIDR boundaries.
///
/// Ranges may overlap one another.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IpRange {
    #[serde(default)]
    pub id: RecordId,
    pub start_address: Cidr,
    pub end_address: Cidr,
    #[serde(default)]
    pub vrf: Option<VrfId>,
    #[serde(default)]
    pub status: AddressStatus,
}

impl IpRange {
    /// Create a global range from two addresses, e.g. "10.0.0.9/26" and "10.0.0.12/26".
    pub fn new(start: &str, end: &str) -> Result<IpRange> {
        let range = IpRange {
            id: 0,
            start_address: Cidr::new(start)?,
            end_address: Cidr::new(end)?,
            vrf: None,
            status: AddressStatus::default(),
        };
        range.clean()?;
        Ok(range)
    }

    pub fn with_vrf(mut self, vrf: Option<VrfId>) -> IpRange {
        self.vrf = vrf;
        self
    }

    pub fn family(&self) -> Family {
        self.start_address.family()
    }

    /// First address, encoded.
    pub fn first(&self) -> u128 {
        self.start_address.bits()
    }

    /// Last address (inclusive), encoded.
    pub fn last(&self) -> u128 {
        self.end_address.bits()
    }

    /// Number of addresses in the range.
    pub fn size(&self) -> BigUint {
        BigUint::from(self.last().saturating_sub(self.first())) + BigUint::from(1u8)
    }

    /// True when both ends lie inside `cidr`.
    pub fn is_inside(&self, cidr: &Cidr) -> bool {
        self.family() == cidr.family()
            && cidr.lo() <= self.first()
            && self.last() <= cidr.hi()
    }

    pub fn clean(&self) -> Result<()> {
        if self.start_address.family() != self.end_address.family() {
            return Err(IpamError::Validation(format!(
                "starting and ending address families differ: {} - {}",
                self.start_address, self.end_address
            )));
        }
        if self.start_address.mask != self.end_address.mask {
            return Err(IpamError::Validation(format!(
                "starting and ending address masks must match: {} - {}",
                self.start_address, self.end_address
            )));
        }
        if self.first() > self.last() {
            return Err(IpamError::Validation(format!(
                "ending address {} is lower than starting address {}",
                self.end_address, self.start_address
            )));
        }
        Ok(())
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_address.addr, self.end_address.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_size() {
        let r = IpRange::new("10.0.0.33/24", "10.0.0.64/24").unwrap();
        assert_eq!(r.size(), BigUint::from(32u32));
        let single = IpRange::new("10.0.0.1/24", "10.0.0.1/24").unwrap();
        assert_eq!(single.size(), BigUint::from(1u32));
        let all6 = IpRange::new("::/1", "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff/1").unwrap();
        assert_eq!(all6.size(), BigUint::from(u128::MAX) + BigUint::from(1u8));
    }

    #[test]
    fn test_range_clean() {
        assert!(IpRange::new("10.0.0.10/24", "10.0.0.1/24").is_err());
        assert!(IpRange::new("10.0.0.1/24", "10.0.0.10/25").is_err());
        assert!(IpRange::new("10.0.0.1/24", "2001:db8::1/24").is_err());
    }

    #[test]
    fn test_range_is_inside() {
        let container = Cidr::new("192.168.0.16/28").unwrap();
        assert!(IpRange::new("192.168.0.18/24", "192.168.0.23/24").unwrap().is_inside(&container));
        assert!(!IpRange::new("192.168.0.11/24", "192.168.0.17/24").unwrap().is_inside(&container));
        assert!(!IpRange::new("192.168.0.31/24", "192.168.0.40/24").unwrap().is_inside(&container));
    }

    #[test]
    fn test_address_role_names() {
        assert_eq!(AddressRole::from_name(" VIP "), Some(AddressRole::Vip));
        assert_eq!(AddressRole::from_name("nope"), None);
        assert!(AddressRole::default_nonunique().contains(&AddressRole::Anycast));
        assert!(!AddressRole::default_nonunique().contains(&AddressRole::Loopback));
    }

    #[test]
    fn test_address_host_keeps_bits() {
        let ip = IpAddress::new("10.0.0.4/24").unwrap();
        assert_eq!(ip.host().to_string(), "10.0.0.4");
        assert_eq!(ip.to_string(), "10.0.0.4/24");
        assert!(IpAddress::new("10.0.0.4/0").unwrap().clean().is_err());
    }
}
