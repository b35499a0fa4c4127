//! Records that can occupy space inside a container.

use super::{Family, IpAddress, IpRange, Prefix, Vlan};
use crate::space::Interval;
use std::fmt;

/// A record that may be counted as a child of a container.
#[derive(Debug, Clone, Copy)]
pub enum ChildCandidate<'a> {
    Prefix(&'a Prefix),
    Range(&'a IpRange),
    Address(&'a IpAddress),
    Vlan(&'a Vlan),
}

impl<'a> ChildCandidate<'a> {
    /// The run of encoded values the record occupies.
    pub fn range(&self) -> Interval {
        match self {
            ChildCandidate::Prefix(p) => Interval::new(p.prefix.lo(), p.prefix.hi()),
            ChildCandidate::Range(r) => Interval::new(r.first(), r.last()),
            ChildCandidate::Address(a) => Interval::single(a.bits()),
            ChildCandidate::Vlan(v) => Interval::single(v.vid as u128),
        }
    }

    /// Address family, `None` for scalar ids.
    pub fn family(&self) -> Option<Family> {
        match self {
            ChildCandidate::Prefix(p) => Some(p.family()),
            ChildCandidate::Range(r) => Some(r.family()),
            ChildCandidate::Address(a) => Some(a.family()),
            ChildCandidate::Vlan(_) => None,
        }
    }

    /// Printable value of the record.
    pub fn value(&self) -> String {
        self.to_string()
    }
}

impl<'a> fmt::Display for ChildCandidate<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildCandidate::Prefix(p) => write!(f, "{}", p.prefix),
            ChildCandidate::Range(r) => write!(f, "{r}"),
            ChildCandidate::Address(a) => write!(f, "{}", a.address),
            ChildCandidate::Vlan(v) => write!(f, "vid {}", v.vid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_ranges() {
        let p = Prefix::new("10.0.0.0/30").unwrap();
        let r = IpRange::new("10.0.0.9/24", "10.0.0.12/24").unwrap();
        let a = IpAddress::new("10.0.0.1/24").unwrap();
        let v = Vlan::new(100, "v100", None);
        assert_eq!(ChildCandidate::Prefix(&p).range(), Interval::new(0x0A000000, 0x0A000003));
        assert_eq!(ChildCandidate::Range(&r).range(), Interval::new(0x0A000009, 0x0A00000C));
        assert_eq!(ChildCandidate::Address(&a).range(), Interval::single(0x0A000001));
        assert_eq!(ChildCandidate::Vlan(&v).range(), Interval::single(100));
        assert_eq!(ChildCandidate::Vlan(&v).family(), None);
        assert_eq!(ChildCandidate::Range(&r).value(), "10.0.0.9-10.0.0.12");
    }
}
