//! Prefix (CIDR network) data model.

use super::{Cidr, Family, RecordId, VrfId};
use crate::error::{IpamError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status of a prefix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrefixStatus {
    /// Organizational only; holds child prefixes rather than hosts.
    Container,
    #[default]
    Active,
    Reserved,
    Deprecated,
}

impl fmt::Display for PrefixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrefixStatus::Container => "container",
            PrefixStatus::Active => "active",
            PrefixStatus::Reserved => "reserved",
            PrefixStatus::Deprecated => "deprecated",
        };
        write!(f, "{s}")
    }
}

/// A CIDR network, optionally scoped to a VRF.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    /// Record id, assigned by the store.
    #[serde(default)]
    pub id: RecordId,
    /// Network, always stored with host bits cleared.
    pub prefix: Cidr,
    /// Routing context, `None` for the global table.
    #[serde(default)]
    pub vrf: Option<VrfId>,
    #[serde(default)]
    pub status: PrefixStatus,
    /// All addresses, including network and broadcast, are usable.
    #[serde(default)]
    pub is_pool: bool,
    /// Report the prefix as fully utilized regardless of its children.
    #[serde(default)]
    pub mark_utilized: bool,
    /// Number of strict ancestors in scope. Computed.
    #[serde(default)]
    pub depth: u32,
    /// Number of strict descendants in scope. Computed.
    #[serde(default)]
    pub children: u32,
}

impl Prefix {
    /// Create a global, active prefix from CIDR text. Host bits are cleared.
    pub fn new(cidr: &str) -> Result<Prefix> {
        Ok(Prefix::from_cidr(Cidr::new(cidr)?))
    }

    pub fn from_cidr(cidr: Cidr) -> Prefix {
        Prefix {
            id: 0,
            prefix: cidr.network(),
            vrf: None,
            status: PrefixStatus::default(),
            is_pool: false,
            mark_utilized: false,
            depth: 0,
            children: 0,
        }
    }

    pub fn with_vrf(mut self, vrf: Option<VrfId>) -> Prefix {
        self.vrf = vrf;
        self
    }

    pub fn with_status(mut self, status: PrefixStatus) -> Prefix {
        self.status = status;
        self
    }

    pub fn with_pool(mut self, is_pool: bool) -> Prefix {
        self.is_pool = is_pool;
        self
    }

    pub fn family(&self) -> Family {
        self.prefix.family()
    }

    pub fn is_container(&self) -> bool {
        self.status == PrefixStatus::Container
    }

    /// Checks that do not need any other record.
    pub fn clean(&self) -> Result<()> {
        if self.prefix.mask == 0 {
            return Err(IpamError::Validation(format!(
                "cannot create prefix with /0 mask: {}",
                self.prefix
            )));
        }
        if !self.prefix.is_network() {
            return Err(IpamError::Validation(format!(
                "prefix {} has host bits set",
                self.prefix
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vrf {
            Some(vrf) => write!(f, "{} (vrf {vrf})", self.prefix),
            None => write!(f, "{}", self.prefix),
        }
    }
}
