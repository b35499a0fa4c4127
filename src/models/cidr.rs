//! IPv4/IPv6 address and CIDR notation utilities.
//!
//! Provides [`Cidr`] for representing an address with a mask length, along
//! with the bit-level helpers used by the address-space algebra. Both
//! families are encoded as `u128`; IPv4 values live in the low 32 bits.

use crate::error::{IpamError, Result};
use num_bigint::BigUint;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family of a network or address.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    #[serde(rename = "4")]
    V4,
    #[serde(rename = "6")]
    V6,
}

impl Family {
    /// Family of the given address.
    pub fn of(addr: IpAddr) -> Family {
        match addr {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    /// Maximum mask length (32 or 128).
    pub fn max_length(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    /// Highest encoded address of the family.
    pub fn max_bits(self) -> u128 {
        match self {
            Family::V4 => u32::MAX as u128,
            Family::V6 => u128::MAX,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// Encode an address as an unsigned integer.
pub fn addr_to_bits(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(a) => u32::from(a) as u128,
        IpAddr::V6(a) => u128::from(a),
    }
}

/// Decode an integer back into an address of the given family.
///
/// IPv4 values are truncated to their low 32 bits.
pub fn bits_to_addr(bits: u128, family: Family) -> IpAddr {
    match family {
        Family::V4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        Family::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

/// Mask of the host bits for a prefix length (`0` for a host route).
///
/// # Examples
/// ```
/// use ipam_space::models::{host_mask, Family};
/// assert_eq!(host_mask(24, Family::V4).unwrap(), 0xFF);
/// assert_eq!(host_mask(128, Family::V6).unwrap(), 0);
/// ```
pub fn host_mask(len: u8, family: Family) -> Result<u128> {
    let max = family.max_length();
    if len > max {
        return Err(IpamError::Input(format!(
            "network length /{len} is too long for {family}"
        )));
    }
    let host_bits = (max - len) as u32;
    if host_bits == 0 {
        Ok(0)
    } else {
        Ok(u128::MAX >> (128 - host_bits))
    }
}

/// Shortest mask length the address is aligned to, based on trailing zeros.
pub fn lo_mask(bits: u128, family: Family) -> u8 {
    let max = family.max_length() as u32;
    let trailing_zeros = bits.trailing_zeros().min(max);
    (max - trailing_zeros) as u8
}

/// Number of addresses in a block of the given length, exact.
pub fn block_size(len: u8, family: Family) -> BigUint {
    let host_bits = family.max_length().saturating_sub(len) as usize;
    BigUint::from(1u8) << host_bits
}

/// Address with CIDR mask length.
///
/// Networks are usually normalized with [`Cidr::network`]; host addresses
/// keep their host bits and use the mask of their containing network.
#[derive(Eq, Ord, PartialEq, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Cidr {
    /// The address.
    pub addr: IpAddr,
    /// The mask length (0-32 or 0-128).
    pub mask: u8,
}

impl Serialize for Cidr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cidr::new(&s).map_err(de::Error::custom)
    }
}

impl FromStr for Cidr {
    type Err = IpamError;

    fn from_str(s: &str) -> Result<Cidr> {
        Cidr::new(s)
    }
}

fn parse_mask(text: &str) -> Option<u8> {
    let digits_only = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (text.len() > 1 && text.starts_with('0')) {
        return None;
    }
    text.parse().ok()
}

impl Cidr {
    /// Parse a CIDR string (e.g. "10.0.0.0/24"). A bare address gets a host mask.
    ///
    /// The mask must be plain decimal digits without a sign or leading zero,
    /// so accepted text prints back unchanged.
    pub fn new(addr_cidr: &str) -> Result<Cidr> {
        let (addr_part, mask_part) = match addr_cidr.split_once('/') {
            Some((a, m)) => (a, Some(m)),
            None => (addr_cidr, None),
        };
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| IpamError::parse(addr_cidr, format!("invalid address {addr_part}")))?;
        let family = Family::of(addr);
        let mask = match mask_part {
            Some(m) => parse_mask(m)
                .ok_or_else(|| IpamError::parse(addr_cidr, format!("invalid mask {m}")))?,
            None => family.max_length(),
        };
        Cidr::from_parts(addr, mask).map_err(|e| IpamError::parse(addr_cidr, e.to_string()))
    }

    /// Build from an address and a mask length, checking the length.
    pub fn from_parts(addr: IpAddr, mask: u8) -> Result<Cidr> {
        if mask > Family::of(addr).max_length() {
            return Err(IpamError::Input(format!(
                "network length /{mask} is too long for {addr}"
            )));
        }
        Ok(Cidr { addr, mask })
    }

    /// Build from encoded bits.
    pub fn from_bits(bits: u128, mask: u8, family: Family) -> Result<Cidr> {
        Cidr::from_parts(bits_to_addr(bits, family), mask)
    }

    pub fn family(&self) -> Family {
        Family::of(self.addr)
    }

    /// Same mask, host bits cleared.
    pub fn network(&self) -> Cidr {
        Cidr {
            addr: bits_to_addr(self.lo(), self.family()),
            mask: self.mask,
        }
    }

    /// True when the address has no host bits set.
    pub fn is_network(&self) -> bool {
        addr_to_bits(self.addr) == self.lo()
    }

    /// Get the broadcast (highest) address of the subnet, same mask.
    pub fn broadcast(&self) -> Cidr {
        Cidr {
            addr: bits_to_addr(self.hi(), self.family()),
            mask: self.mask,
        }
    }

    /// Encoded address of the host itself.
    pub fn bits(&self) -> u128 {
        addr_to_bits(self.addr)
    }

    /// Lowest (network) address of the subnet, encoded.
    pub fn lo(&self) -> u128 {
        self.bits() & !self.host_bits()
    }

    /// Highest (broadcast) address of the subnet, encoded.
    pub fn hi(&self) -> u128 {
        self.lo() | self.host_bits()
    }

    fn host_bits(&self) -> u128 {
        // mask is range-checked on construction
        host_mask(self.mask, self.family()).unwrap_or(0)
    }

    /// Number of addresses in the subnet.
    pub fn size(&self) -> BigUint {
        block_size(self.mask, self.family())
    }

    /// True if the subnet covers the given address.
    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        Family::of(addr) == self.family() && {
            let bits = addr_to_bits(addr);
            self.lo() <= bits && bits <= self.hi()
        }
    }

    /// True if `other` lies inside this subnet (equal subnets included).
    pub fn contains(&self, other: &Cidr) -> bool {
        other.family() == self.family() && self.lo() <= other.lo() && other.hi() <= self.hi()
    }

    /// True if `other` lies inside this subnet and is a smaller block.
    pub fn strictly_contains(&self, other: &Cidr) -> bool {
        self.contains(other) && other.mask > self.mask
    }

    /// Same network address and length.
    pub fn same_network(&self, other: &Cidr) -> bool {
        self.family() == other.family() && self.mask == other.mask && self.lo() == other.lo()
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_lo_mask() {
        assert_eq!(lo_mask(addr_to_bits(v4(192, 168, 1, 1)), Family::V4), 32);
        assert_eq!(lo_mask(addr_to_bits(v4(10, 0, 4, 0)), Family::V4), 22);
        assert_eq!(lo_mask(0, Family::V4), 0);
        assert_eq!(lo_mask(0, Family::V6), 0);
        assert_eq!(lo_mask(1 << 64, Family::V6), 64);
    }

    #[test]
    fn test_cidr_parse_roundtrip() {
        for text in ["10.0.0.0/8", "10.0.0.1/24", "2001:db8::/32", "2001:db8:500:5::/127", "::/0"] {
            let cidr = Cidr::new(text).unwrap();
            assert_eq!(cidr.to_string(), text);
            assert_eq!(Cidr::new(&cidr.to_string()).unwrap(), cidr);
        }
        assert_eq!(Cidr::new("10.0.0.1").unwrap().to_string(), "10.0.0.1/32");
        assert!(Cidr::new("10.0.0.0/33").is_err());
        assert!(Cidr::new("10.0.0/8").is_err());
        assert!(Cidr::new("10.0.0.0/x").is_err());
    }

    #[test]
    fn test_cidr_rejects_loose_text() {
        for text in ["10.0.0.0/+8", "10.0.0.0/08", " 10.0.0.0/8", "10.0.0.0/8 ", "10.0.0.0/", "2001:db8::/064"] {
            assert!(
                matches!(Cidr::new(text), Err(IpamError::Parse { .. })),
                "{text:?} should not parse"
            );
        }
        assert_eq!(Cidr::new("0.0.0.0/0").unwrap().mask, 0);
    }

    #[test]
    fn test_cidr_serde() {
        let cidr = Cidr::new("10.1.2.0/24").unwrap();
        let json = serde_json::to_string(&cidr).unwrap();
        assert_eq!(json, "\"10.1.2.0/24\"");
        let back: Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cidr);
        assert!(serde_json::from_str::<Cidr>("\"10.1.2.0/40\"").is_err());
    }

    #[test]
    fn test_cidr_bounds_and_containment() {
        let outer = Cidr::new("10.0.0.0/8").unwrap();
        let inner = Cidr::new("10.0.10.64/26").unwrap();
        assert_eq!(outer.hi(), addr_to_bits(v4(10, 255, 255, 255)));
        assert!(outer.contains(&inner));
        assert!(outer.strictly_contains(&inner));
        assert!(outer.contains(&outer));
        assert!(!outer.strictly_contains(&outer));
        assert!(!inner.contains(&outer));
        assert!(outer.contains_addr(v4(10, 1, 1, 1)));
        assert!(!outer.contains_addr("::1".parse().unwrap()));

        let host = Cidr::new("10.0.0.5/24").unwrap();
        assert!(!host.is_network());
        assert_eq!(host.network().to_string(), "10.0.0.0/24");
        assert_eq!(host.broadcast().to_string(), "10.0.0.255/24");
    }

    #[test]
    fn test_cidr_size() {
        assert_eq!(Cidr::new("10.0.0.0/24").unwrap().size(), BigUint::from(256u32));
        assert_eq!(
            Cidr::new("::/0").unwrap().size(),
            BigUint::from(u128::MAX) + BigUint::from(1u8)
        );
    }

    #[test]
    fn test_cidr_cmp() {
        let ip1 = Cidr::new("10.0.0.1/24").unwrap();
        let ip2 = Cidr::new("10.0.0.2/24").unwrap();
        let ip3 = Cidr::new("10.0.0.0/8").unwrap();
        assert!(ip1 < ip2);
        assert!(ip3 < ip1);
        assert!(Cidr::new("255.0.0.0/8").unwrap() < Cidr::new("::/0").unwrap());
    }
}
