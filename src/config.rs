//! Runtime settings.
//!
//! Settings are read once (from the environment, after `.env` has been
//! loaded by `dotenv`) and then passed explicitly to every call that needs
//! them. Nothing in the library reads ambient global state.

use crate::models::AddressRole;

/// Environment variable: reject duplicates in the global table.
pub const ENV_ENFORCE_GLOBAL_UNIQUE: &str = "IPAM_ENFORCE_GLOBAL_UNIQUE";
/// Environment variable: comma separated roles exempt from uniqueness.
pub const ENV_NONUNIQUE_ROLES: &str = "IPAM_NONUNIQUE_ROLES";
/// Environment variable: dataset file read by the binary.
pub const ENV_DATA_FILE: &str = "IPAM_DATA_FILE";
/// Dataset file used when none is configured.
pub const DEFAULT_DATA_FILE: &str = "ipam_dataset.json";

/// Uniqueness policy and other process-wide knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Enforce unique prefixes/addresses for records without a VRF.
    pub enforce_global_unique: bool,
    /// Address roles allowed to share an address with each other.
    pub nonunique_roles: Vec<AddressRole>,
    /// Dataset file for the report binary.
    pub data_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            enforce_global_unique: true,
            nonunique_roles: AddressRole::default_nonunique(),
            data_file: DEFAULT_DATA_FILE.to_string(),
        }
    }
}

impl Settings {
    /// Default settings with the given global uniqueness flag.
    pub fn with_global_unique(enforce_global_unique: bool) -> Settings {
        Settings {
            enforce_global_unique,
            ..Default::default()
        }
    }

    /// Build settings from `IPAM_*` environment variables, falling back to defaults.
    pub fn from_env() -> Settings {
        Settings::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(value) = lookup(ENV_ENFORCE_GLOBAL_UNIQUE) {
            match parse_bool(&value) {
                Some(flag) => settings.enforce_global_unique = flag,
                None => log::warn!(
                    "Ignoring {ENV_ENFORCE_GLOBAL_UNIQUE}='{value}', expected true/false"
                ),
            }
        }

        if let Some(value) = lookup(ENV_NONUNIQUE_ROLES) {
            settings.nonunique_roles = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|name| {
                    let role = AddressRole::from_name(name);
                    if role.is_none() {
                        log::warn!("Unknown address role '{}' in {ENV_NONUNIQUE_ROLES}", name.trim());
                    }
                    role
                })
                .collect();
        }

        if let Some(value) = lookup(ENV_DATA_FILE) {
            settings.data_file = value;
        }

        log::debug!("Settings: {settings:?}");
        settings
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
