//! Aggregate (registry-owned top level block) data model.

use super::{Cidr, Family, RecordId};
use crate::error::{IpamError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A top-level block allocated by a regional internet registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    #[serde(default)]
    pub id: RecordId,
    pub prefix: Cidr,
    /// Owning registry, e.g. "RIPE".
    pub rir: String,
}

impl Aggregate {
    pub fn new(prefix: &str, rir: &str) -> Result<Aggregate> {
        Ok(Aggregate {
            id: 0,
            prefix: Cidr::new(prefix)?.network(),
            rir: rir.to_string(),
        })
    }

    pub fn family(&self) -> Family {
        self.prefix.family()
    }

    pub fn clean(&self) -> Result<()> {
        if self.prefix.mask == 0 {
            return Err(IpamError::Validation(format!(
                "cannot create aggregate with /0 mask: {}",
                self.prefix
            )));
        }
        if !self.prefix.is_network() {
            return Err(IpamError::Validation(format!(
                "aggregate {} has host bits set",
                self.prefix
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.prefix, self.rir)
    }
}
