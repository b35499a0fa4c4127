//! CSV output of the prefix report.

use super::report::{report_rows, ReportRow};
use super::terminal::{format_field, highlight_row};
use crate::config::Settings;
use crate::error::Result;
use crate::processing::{check_for_duplicates, get_aggregate_utilization, get_available_vids};
use crate::store::Store;
use colored::Colorize;

/// Print the prefix report as CSV to stdout, followed by aggregate and
/// VLAN group summaries.
///
/// # Arguments
/// * `store` - The records to report on
/// * `settings` - Uniqueness settings used for the duplicate audit line
///
/// # Errors
/// Returns an error if a utilization or free block cannot be computed.
/// Duplicates found by the audit are printed, not returned.
pub fn report_print(store: &Store, settings: &Settings) -> Result<()> {
    log::info!(
        "#Start report_print() prefixes={} addresses={}",
        store.prefixes().len(),
        store.ip_addresses().len()
    );
    println!(
        "# Report generated {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    // Print CSV header
    println!(
        r#" "cnt",   "gap",        "scope",                     "prefix",     "status", "depth", "children", "utilization",        "next_free""#
    );
    for row in report_rows(store)? {
        print_csv_row(&row);
    }

    for aggregate in store.aggregates() {
        println!(
            "#aggregate {} rir={} utilization={}",
            aggregate.prefix,
            aggregate.rir,
            get_aggregate_utilization(store, aggregate)?
        );
    }

    for group in store.vlan_groups() {
        let free = get_available_vids(store, group);
        println!(
            "#vlan_group '{}' {}-{} free={} next={}",
            group.name,
            group.min_vid,
            group.max_vid,
            free.len(),
            free.first().map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
        );
    }

    if let Err(e) = check_for_duplicates(store, settings) {
        println!("#{}# {e}", "DUPLICATE".on_red());
    }
    Ok(())
}

/// Print a single CSV row.
fn print_csv_row(row: &ReportRow) {
    let line = format!(
        r#"{j},{gap},{scope},{prefix},{status},{depth},{children},{utilization},{next_free}"#,
        j = format_field(row.j, 6),
        gap = format_field(&row.gap, 8),
        scope = format_field(&row.scope, 14),
        prefix = format_field(&row.prefix, 30),
        status = format_field(&row.status, 12),
        depth = format_field(row.depth, 7),
        children = format_field(row.children, 10),
        utilization = format_field(&row.utilization, 13),
        next_free = format_field(&row.next_free, 28),
    );
    println!("{}", highlight_row(row, line));
}
