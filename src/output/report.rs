//! Report rows: every prefix in hierarchy order followed by its free blocks.

use crate::error::Result;
use crate::models::Prefix;
use crate::processing::{
    get_available_prefixes, get_first_available_ip, get_utilization, Scope,
};
use crate::store::Store;
use itertools::Itertools;

/// Represents a row of prefix data for output.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Row index (0 for gap rows).
    pub j: usize,
    /// Gap indicator or prefix record id.
    pub gap: String,
    /// Scope the prefix belongs to.
    pub scope: String,
    /// Prefix, indented by depth.
    pub prefix: String,
    pub status: String,
    pub depth: u32,
    /// Descendant count.
    pub children: u32,
    pub utilization: String,
    /// First free host, or first free block for containers.
    pub next_free: String,
}

/// Build the report rows of one scope.
///
/// # Arguments
/// * `store` - The records to report on
/// * `scope` - The VRF and address family to walk
///
/// # Returns
/// Prefix rows in hierarchy order, each container followed by `-gap-` rows
/// for its free blocks
pub fn scope_rows(store: &Store, scope: Scope) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::new();
    let ordered = store
        .prefixes()
        .iter()
        .filter(|p| scope.includes(p))
        .sorted_by_key(|p| (p.prefix.lo(), p.prefix.mask, p.id));

    for prefix in ordered {
        rows.push(prefix_row(store, prefix, scope, rows.len() + 1)?);
        if !prefix.is_container() {
            continue;
        }
        // Free blocks directly after their container
        let free = get_available_prefixes(store, prefix)?;
        for cidr in free.iter_cidrs() {
            rows.push(ReportRow {
                j: 0,
                gap: "-gap-".to_string(),
                scope: scope.to_string(),
                prefix: format!("{}{cidr}", indent(prefix.depth + 1)),
                status: "free".to_string(),
                depth: prefix.depth + 1,
                children: 0,
                utilization: "None".to_string(),
                next_free: cidr.to_string(),
            });
        }
    }
    Ok(rows)
}

/// Build report rows for every scope in the store.
///
/// # Returns
/// The rows of each scope in turn, global scopes first
pub fn report_rows(store: &Store) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::new();
    for scope in crate::processing::hierarchy::scopes(store.prefixes()) {
        rows.extend(scope_rows(store, scope)?);
    }
    Ok(rows)
}

fn prefix_row(store: &Store, prefix: &Prefix, scope: Scope, j: usize) -> Result<ReportRow> {
    let next_free = if prefix.is_container() {
        get_available_prefixes(store, prefix)?
            .iter_cidrs()
            .first()
            .map(|c| c.to_string())
    } else {
        get_first_available_ip(store, prefix).ok().map(|c| c.to_string())
    };
    Ok(ReportRow {
        j,
        gap: format!("Pfx{}", prefix.id),
        scope: scope.to_string(),
        prefix: format!("{}{}", indent(prefix.depth), prefix.prefix),
        status: prefix.status.to_string(),
        depth: prefix.depth,
        children: prefix.children,
        utilization: get_utilization(store, prefix)?.to_string(),
        next_free: next_free.unwrap_or_else(|| "None".to_string()),
    })
}

fn indent(depth: u32) -> String {
    "  ".repeat(depth as usize)
}
