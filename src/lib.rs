//! IP address management core.
//!
//! Interval algebra over address space, prefix containment hierarchy,
//! free-space allocation, utilization and uniqueness checks over an
//! in-memory [`store::Store`].

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod space;
pub mod store;

use config::Settings;
use error::Result;
use std::path::Path;
use store::{read_dataset, Store};

/// Load the store from a dataset file, defaulting to the configured one.
pub fn load_store(data_file: Option<&str>, settings: &Settings) -> Result<Store> {
    let path = data_file.unwrap_or(&settings.data_file);
    let dataset = read_dataset(Path::new(path))?;
    Store::from_dataset(dataset)
}

/// Load a store and reject it when it breaks the duplicate policy.
pub fn load_checked_store(data_file: Option<&str>, settings: &Settings) -> Result<Store> {
    let store = load_store(data_file, settings)?;
    processing::check_for_duplicates(&store, settings)?;
    Ok(store)
}
