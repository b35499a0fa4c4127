//! Prefix containment hierarchy.
//!
//! Depth and descendant counts are derived columns, recomputed by walking
//! every prefix of one scope with a stack of open ancestors. There are no
//! parent/child pointers to keep in sync.

use crate::models::{Family, Prefix, RecordId, VrfId};
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Containment scope: one routing context and one address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    pub vrf: Option<VrfId>,
    pub family: Family,
}

impl Scope {
    pub fn new(vrf: Option<VrfId>, family: Family) -> Scope {
        Scope { vrf, family }
    }

    /// Scope the prefix belongs to.
    pub fn of(prefix: &Prefix) -> Scope {
        Scope {
            vrf: prefix.vrf,
            family: prefix.family(),
        }
    }

    pub fn includes(&self, prefix: &Prefix) -> bool {
        Scope::of(prefix) == *self
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vrf {
            Some(vrf) => write!(f, "vrf {vrf}/{}", self.family),
            None => write!(f, "global/{}", self.family),
        }
    }
}

/// Derived hierarchy values of one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub id: RecordId,
    pub depth: u32,
    pub children: u32,
}

/// Identical prefixes sharing one level of the stack.
struct Group {
    lo: u128,
    hi: u128,
    mask: u8,
    members: Vec<usize>,
}

impl Group {
    fn strictly_contains(&self, prefix: &Prefix) -> bool {
        self.lo <= prefix.prefix.lo() && prefix.prefix.hi() <= self.hi && prefix.prefix.mask > self.mask
    }

    fn is_same(&self, prefix: &Prefix) -> bool {
        self.lo == prefix.prefix.lo() && self.mask == prefix.prefix.mask
    }
}

/// Compute depth and descendant count for every prefix of `scope`.
///
/// Prefixes outside the scope are ignored. Nothing is written; the result
/// is applied with [`apply_hierarchy`].
///
/// # Returns
/// One entry per prefix of the scope, with its new depth and children
pub fn compute_scope(prefixes: &[Prefix], scope: Scope) -> Vec<HierarchyEntry> {
    let ordered: Vec<&Prefix> = prefixes
        .iter()
        .filter(|p| scope.includes(p))
        .sorted_by_key(|p| (p.prefix.lo(), p.prefix.mask, p.id))
        .collect();

    let mut depth = vec![0u32; ordered.len()];
    let mut children = vec![0u32; ordered.len()];
    let mut stack: Vec<Group> = Vec::new();

    for (i, prefix) in ordered.iter().enumerate() {
        while let Some(top) = stack.last() {
            if top.strictly_contains(prefix) || top.is_same(prefix) {
                break;
            }
            stack.pop();
        }

        let joins_top = stack.last().map(|top| top.is_same(prefix)).unwrap_or(false);
        let ancestors = if joins_top { stack.len() - 1 } else { stack.len() };

        for group in &stack[..ancestors] {
            for &member in &group.members {
                children[member] += 1;
            }
        }
        depth[i] = ancestors as u32;

        match stack.last_mut() {
            Some(top) if joins_top => top.members.push(i),
            _ => stack.push(Group {
                lo: prefix.prefix.lo(),
                hi: prefix.prefix.hi(),
                mask: prefix.prefix.mask,
                members: vec![i],
            }),
        }
    }

    ordered
        .iter()
        .enumerate()
        .map(|(i, p)| HierarchyEntry {
            id: p.id,
            depth: depth[i],
            children: children[i],
        })
        .collect()
}

/// Write computed values back. Returns how many prefixes changed.
pub fn apply_hierarchy(prefixes: &mut [Prefix], entries: &[HierarchyEntry]) -> usize {
    let by_id: HashMap<RecordId, &HierarchyEntry> = entries.iter().map(|e| (e.id, e)).collect();
    let mut changed = 0;
    for prefix in prefixes.iter_mut() {
        if let Some(entry) = by_id.get(&prefix.id) {
            if prefix.depth != entry.depth || prefix.children != entry.children {
                prefix.depth = entry.depth;
                prefix.children = entry.children;
                changed += 1;
            }
        }
    }
    changed
}

/// Recompute one scope in place.
pub fn rebuild_scope(prefixes: &mut [Prefix], scope: Scope) -> usize {
    let entries = compute_scope(prefixes, scope);
    let changed = apply_hierarchy(prefixes, &entries);
    log::debug!(
        "rebuild_scope({scope}) prefixes={} changed={changed}",
        entries.len()
    );
    changed
}

/// Every scope present in the given prefixes.
pub fn scopes(prefixes: &[Prefix]) -> BTreeSet<Scope> {
    prefixes.iter().map(Scope::of).collect()
}

/// Recompute every scope in place.
pub fn rebuild_all(prefixes: &mut [Prefix]) -> usize {
    scopes(prefixes)
        .into_iter()
        .map(|scope| rebuild_scope(prefixes, scope))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(cidrs: &[&str]) -> Vec<Prefix> {
        cidrs
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut p = Prefix::new(c).unwrap();
                p.id = i as u32 + 1;
                p
            })
            .collect()
    }

    fn summary(prefixes: &[Prefix], scope: Scope) -> Vec<(String, u32, u32)> {
        prefixes
            .iter()
            .filter(|p| scope.includes(p))
            .sorted_by_key(|p| (p.prefix.lo(), p.prefix.mask, p.id))
            .map(|p| (p.prefix.to_string(), p.depth, p.children))
            .collect()
    }

    fn v4() -> Scope {
        Scope::new(None, Family::V4)
    }

    #[test]
    fn test_chain() {
        let mut ps = prefixes(&["10.0.0.0/24", "10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/12"]);
        rebuild_all(&mut ps);
        assert_eq!(
            summary(&ps, v4()),
            vec![
                ("10.0.0.0/8".to_string(), 0, 3),
                ("10.0.0.0/12".to_string(), 1, 2),
                ("10.0.0.0/16".to_string(), 2, 1),
                ("10.0.0.0/24".to_string(), 3, 0),
            ]
        );
    }

    #[test]
    fn test_siblings_across_networks() {
        // a length-first walk would lose 10.0.0.0/8 as ancestor of 10.1.0.0/16
        let mut ps = prefixes(&["10.0.0.0/8", "11.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24", "10.2.0.0/16"]);
        rebuild_all(&mut ps);
        assert_eq!(
            summary(&ps, v4()),
            vec![
                ("10.0.0.0/8".to_string(), 0, 3),
                ("10.1.0.0/16".to_string(), 1, 1),
                ("10.1.2.0/24".to_string(), 2, 0),
                ("10.2.0.0/16".to_string(), 1, 0),
                ("11.0.0.0/8".to_string(), 0, 0),
            ]
        );
    }

    #[test]
    fn test_duplicates_share_level() {
        let mut ps = prefixes(&["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24", "10.0.0.0/16"]);
        rebuild_all(&mut ps);
        assert_eq!(
            summary(&ps, v4()),
            vec![
                ("10.0.0.0/8".to_string(), 0, 3),
                ("10.0.0.0/16".to_string(), 1, 1),
                ("10.0.0.0/16".to_string(), 1, 1),
                ("10.0.0.0/24".to_string(), 2, 0),
            ]
        );
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut ps = prefixes(&["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24", "2001:db8::/32"]);
        ps[1].vrf = Some(7);
        rebuild_all(&mut ps);
        assert_eq!(
            summary(&ps, v4()),
            vec![("10.0.0.0/8".to_string(), 0, 1), ("10.0.0.0/24".to_string(), 1, 0)]
        );
        assert_eq!(
            summary(&ps, Scope::new(Some(7), Family::V4)),
            vec![("10.0.0.0/16".to_string(), 0, 0)]
        );
        assert_eq!(scopes(&ps).len(), 3);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut ps = prefixes(&["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/16", "10.0.0.0/24", "10.128.0.0/9"]);
        assert!(rebuild_all(&mut ps) > 0);
        let first = ps.clone();
        assert_eq!(rebuild_all(&mut ps), 0);
        assert_eq!(ps, first);
    }

    #[test]
    fn test_compute_does_not_write() {
        let ps = prefixes(&["10.0.0.0/8", "10.0.0.0/16"]);
        let entries = compute_scope(&ps, v4());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], HierarchyEntry { id: 2, depth: 1, children: 0 });
        assert!(ps.iter().all(|p| p.depth == 0 && p.children == 0));
    }
}
