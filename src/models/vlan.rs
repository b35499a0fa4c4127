//! VLAN and VLAN group data models.

use super::{GroupId, RecordId};
use crate::error::{IpamError, Result};
use serde::{Deserialize, Serialize};

/// Lowest assignable 802.1Q VLAN id.
pub const VLAN_VID_MIN: u16 = 1;
/// Highest assignable 802.1Q VLAN id.
pub const VLAN_VID_MAX: u16 = 4094;

/// A scalar id allocation domain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VlanGroup {
    #[serde(default)]
    pub id: GroupId,
    pub name: String,
    #[serde(default = "default_min_vid")]
    pub min_vid: u16,
    #[serde(default = "default_max_vid")]
    pub max_vid: u16,
}

fn default_min_vid() -> u16 {
    VLAN_VID_MIN
}

fn default_max_vid() -> u16 {
    VLAN_VID_MAX
}

impl VlanGroup {
    pub fn new(name: &str, min_vid: u16, max_vid: u16) -> VlanGroup {
        VlanGroup {
            id: 0,
            name: name.to_string(),
            min_vid,
            max_vid,
        }
    }

    pub fn contains(&self, vid: u16) -> bool {
        self.min_vid <= vid && vid <= self.max_vid
    }

    pub fn clean(&self) -> Result<()> {
        if self.min_vid < VLAN_VID_MIN || self.max_vid > VLAN_VID_MAX {
            return Err(IpamError::Validation(format!(
                "VLAN group '{}' bounds {}-{} outside {VLAN_VID_MIN}-{VLAN_VID_MAX}",
                self.name, self.min_vid, self.max_vid
            )));
        }
        if self.min_vid > self.max_vid {
            return Err(IpamError::Validation(format!(
                "VLAN group '{}' minimum id {} exceeds maximum {}",
                self.name, self.min_vid, self.max_vid
            )));
        }
        Ok(())
    }
}

/// A VLAN, optionally owned by a group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    #[serde(default)]
    pub id: RecordId,
    pub vid: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: Option<GroupId>,
}

impl Vlan {
    pub fn new(vid: u16, name: &str, group: Option<GroupId>) -> Vlan {
        Vlan {
            id: 0,
            vid,
            name: name.to_string(),
            group,
        }
    }

    pub fn clean(&self) -> Result<()> {
        if !(VLAN_VID_MIN..=VLAN_VID_MAX).contains(&self.vid) {
            return Err(IpamError::Validation(format!(
                "VLAN id {} outside {VLAN_VID_MIN}-{VLAN_VID_MAX}",
                self.vid
            )));
        }
        Ok(())
    }
}
