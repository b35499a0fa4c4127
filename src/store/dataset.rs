//! JSON dataset file: the persisted form of a [`Store`].

use super::Store;
use crate::error::{IpamError, Result};
use crate::models::{Aggregate, IpAddress, IpRange, Prefix, Vlan, VlanGroup, Vrf};
use crate::processing::hierarchy::rebuild_all;
use crate::processing::uniqueness::{validate_aggregate, validate_vlan};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// All records of one store. Computed prefix columns are written but
/// recomputed on load.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Dataset {
    #[serde(default)]
    pub vrfs: Vec<Vrf>,
    #[serde(default)]
    pub aggregates: Vec<Aggregate>,
    #[serde(default)]
    pub prefixes: Vec<Prefix>,
    #[serde(default)]
    pub ip_ranges: Vec<IpRange>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
    #[serde(default)]
    pub vlan_groups: Vec<VlanGroup>,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
    /// When the file was written.
    #[serde(default)]
    pub generated: Option<String>,
}

/// Read and parse a dataset file. Parse errors name the failing JSON path.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| IpamError::Dataset(format!("Error reading {}: {e}", path.display())))?;
    log::info!("Reading dataset file: {}", path.display());
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        IpamError::Dataset(format!(
            "Error parsing {}: path={} error={}",
            path.display(),
            e.path(),
            e.inner()
        ))
    })
}

/// Write a dataset file, stamping the generation time.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut dataset = dataset.clone();
    dataset.generated = Some(chrono::Utc::now().to_rfc3339());
    let json = serde_json::to_string_pretty(&dataset)
        .map_err(|e| IpamError::Dataset(format!("Error serializing dataset: {e}")))?;
    log::warn!("Writing dataset file: {}", path.display());
    std::fs::write(path, json)
        .map_err(|e| IpamError::Dataset(format!("Error writing {}: {e}", path.display())))
}

fn check_ids<T>(kind: &str, records: &[T], id_of: impl Fn(&T) -> u32) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        let id = id_of(record);
        if id != 0 && !seen.insert(id) {
            return Err(IpamError::Dataset(format!("Duplicate {kind} id {id}")));
        }
    }
    Ok(())
}

impl Store {
    /// Build a store from a dataset.
    ///
    /// Records without an id get a fresh one. References must resolve, and
    /// hierarchy columns are recomputed. The duplicate policy is not applied;
    /// see [`crate::processing::check_for_duplicates`].
    pub fn from_dataset(dataset: Dataset) -> Result<Store> {
        check_ids("VRF", &dataset.vrfs, |v| v.id)?;
        check_ids("aggregate", &dataset.aggregates, |a| a.id)?;
        check_ids("prefix", &dataset.prefixes, |p| p.id)?;
        check_ids("IP range", &dataset.ip_ranges, |r| r.id)?;
        check_ids("IP address", &dataset.ip_addresses, |a| a.id)?;
        check_ids("VLAN group", &dataset.vlan_groups, |g| g.id)?;
        check_ids("VLAN", &dataset.vlans, |v| v.id)?;

        let max_id = [
            dataset.vrfs.iter().map(|v| v.id).max(),
            dataset.aggregates.iter().map(|a| a.id).max(),
            dataset.prefixes.iter().map(|p| p.id).max(),
            dataset.ip_ranges.iter().map(|r| r.id).max(),
            dataset.ip_addresses.iter().map(|a| a.id).max(),
            dataset.vlan_groups.iter().map(|g| g.id).max(),
            dataset.vlans.iter().map(|v| v.id).max(),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0);

        let next_id = max_id.checked_add(1).ok_or_else(|| {
            IpamError::Dataset(format!("record id {max_id} leaves no room for new ids"))
        })?;
        let mut store = Store {
            next_id,
            ..Default::default()
        };

        // VRFs and groups first so references resolve.
        for mut vrf in dataset.vrfs {
            if vrf.id == 0 {
                vrf.id = store.allocate_id()?;
            }
            store.vrfs.push(vrf);
        }
        for mut group in dataset.vlan_groups {
            group.clean()?;
            if group.id == 0 {
                group.id = store.allocate_id()?;
            }
            store.vlan_groups.push(group);
        }
        for mut aggregate in dataset.aggregates {
            validate_aggregate(&store, &aggregate)?;
            if aggregate.id == 0 {
                aggregate.id = store.allocate_id()?;
            }
            store.aggregates.push(aggregate);
        }
        for mut prefix in dataset.prefixes {
            prefix.clean()?;
            store.check_vrf(prefix.vrf)?;
            if prefix.id == 0 {
                prefix.id = store.allocate_id()?;
            }
            store.prefixes.push(prefix);
        }
        for mut range in dataset.ip_ranges {
            range.clean()?;
            store.check_vrf(range.vrf)?;
            if range.id == 0 {
                range.id = store.allocate_id()?;
            }
            store.ip_ranges.push(range);
        }
        for mut ip in dataset.ip_addresses {
            ip.clean()?;
            store.check_vrf(ip.vrf)?;
            if ip.id == 0 {
                ip.id = store.allocate_id()?;
            }
            store.ip_addresses.push(ip);
        }
        for mut vlan in dataset.vlans {
            validate_vlan(&store, &vlan)?;
            if vlan.id == 0 {
                vlan.id = store.allocate_id()?;
            }
            store.vlans.push(vlan);
        }

        let changed = rebuild_all(&mut store.prefixes);
        log::info!(
            "Loaded dataset: vrfs={} aggregates={} prefixes={} ranges={} addresses={} vlans={} (hierarchy changed={changed})",
            store.vrfs.len(),
            store.aggregates.len(),
            store.prefixes.len(),
            store.ip_ranges.len(),
            store.ip_addresses.len(),
            store.vlans.len()
        );
        Ok(store)
    }

    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            vrfs: self.vrfs.clone(),
            aggregates: self.aggregates.clone(),
            prefixes: self.prefixes.clone(),
            ip_ranges: self.ip_ranges.clone(),
            ip_addresses: self.ip_addresses.clone(),
            vlan_groups: self.vlan_groups.clone(),
            vlans: self.vlans.clone(),
            generated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "vrfs": [{"id": 5, "name": "blue", "enforce_unique": false}],
        "prefixes": [
            {"prefix": "10.0.0.0/8", "status": "container"},
            {"prefix": "10.1.0.0/16"},
            {"prefix": "10.1.0.0/16", "vrf": 5}
        ],
        "ip_addresses": [{"address": "10.1.0.1/16"}],
        "vlan_groups": [{"id": 2, "name": "dc1", "min_vid": 100, "max_vid": 110}],
        "vlans": [{"vid": 100, "group": 2}]
    }"#;

    #[test]
    fn test_from_dataset_assigns_ids_and_hierarchy() {
        let dataset: Dataset = serde_json::from_str(SAMPLE).unwrap();
        let store = Store::from_dataset(dataset).unwrap();
        let ids: HashSet<u32> = store.prefixes().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| *id > 5));
        assert_eq!(store.prefixes()[0].children, 1);
        assert_eq!(store.prefixes()[1].depth, 1);
        assert_eq!(store.prefixes()[2].depth, 0);
        assert_eq!(store.vlans()[0].group, Some(2));
    }

    #[test]
    fn test_from_dataset_rejects_bad_references() {
        let json = r#"{"prefixes": [{"prefix": "10.0.0.0/8", "vrf": 9}]}"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert!(Store::from_dataset(dataset).is_err());

        let json = r#"{"vrfs": [{"id": 1, "name": "a"}, {"id": 1, "name": "b"}]}"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert!(matches!(Store::from_dataset(dataset), Err(IpamError::Dataset(_))));
    }

    #[test]
    fn test_from_dataset_rejects_id_at_ceiling() {
        let json = r#"{"vrfs": [{"id": 4294967295, "name": "edge"}], "prefixes": [{"prefix": "10.0.0.0/8"}]}"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert!(matches!(Store::from_dataset(dataset), Err(IpamError::Dataset(_))));

        let json = r#"{"vrfs": [{"id": 4294967294, "name": "edge"}], "prefixes": [{"prefix": "10.0.0.0/8"}]}"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        match Store::from_dataset(dataset) {
            Err(IpamError::Input(msg)) => assert!(msg.contains("exhausted"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dataset_file_round_trip() {
        let dataset: Dataset = serde_json::from_str(SAMPLE).unwrap();
        let store = Store::from_dataset(dataset).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        write_dataset(&path, &store.to_dataset()).unwrap();

        let read = read_dataset(&path).unwrap();
        assert!(read.generated.is_some());
        assert_eq!(Store::from_dataset(read).unwrap(), store);
    }

    #[test]
    fn test_read_dataset_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"prefixes": [{{"prefix": "not-a-cidr"}}]}}"#).unwrap();
        match read_dataset(file.path()) {
            Err(IpamError::Dataset(msg)) => assert!(msg.contains("prefixes[0].prefix"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(read_dataset(Path::new("/nonexistent/ipam.json")).is_err());
    }
}
