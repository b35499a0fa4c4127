//! Routing context (VRF) data model.

use super::VrfId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A routing context partitioning otherwise identical address values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vrf {
    #[serde(default)]
    pub id: VrfId,
    pub name: String,
    /// Route distinguisher.
    #[serde(default)]
    pub rd: Option<String>,
    /// Reject duplicate prefixes/addresses inside this VRF.
    #[serde(default = "default_enforce_unique")]
    pub enforce_unique: bool,
}

fn default_enforce_unique() -> bool {
    true
}

impl Vrf {
    pub fn new(name: &str, enforce_unique: bool) -> Vrf {
        Vrf {
            id: 0,
            name: name.to_string(),
            rd: None,
            enforce_unique,
        }
    }
}

impl fmt::Display for Vrf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rd {
            Some(rd) => write!(f, "{} ({rd})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
