//! Boot ordering via Tarjan's SCC over the allowed dependency subgraph.
//!
//! Edges point from a module to its dependencies, so `tarjan_scc`'s
//! reverse-topological output already lists dependencies first. Members of
//! a cycle boot in slug order.

use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use bizkit_core::manifest::ManifestMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootPlan {
    /// Every allowed slug with a manifest, dependencies before dependents.
    pub order: Vec<String>,
    /// Dependency cycles among allowed modules, each sorted by slug.
    pub cycles: Vec<Vec<String>>,
}

pub fn boot_order(manifests: &ManifestMap, allowed: &BTreeSet<String>) -> BootPlan {
    let mut pg: DiGraph<&str, ()> = DiGraph::new();
    let mut node_map: FxHashMap<&str, NodeIndex> = FxHashMap::default();

    let slugs: Vec<&str> = allowed
        .iter()
        .map(String::as_str)
        .filter(|s| manifests.contains_key(*s))
        .collect();
    for &slug in &slugs {
        node_map.insert(slug, pg.add_node(slug));
    }

    for &slug in &slugs {
        let idx = node_map[slug];
        for dep in &manifests[slug].dependencies {
            if let Some(&dep_idx) = node_map.get(dep.as_str()) {
                pg.add_edge(idx, dep_idx, ());
            }
        }
    }

    let mut plan = BootPlan::default();
    for scc in petgraph::algo::tarjan_scc(&pg) {
        let mut members: Vec<&str> = scc.iter().map(|idx| pg[*idx]).collect();
        members.sort_unstable();

        let is_cycle = scc.len() > 1 || pg.contains_edge(scc[0], scc[0]);
        if is_cycle {
            plan.cycles
                .push(members.iter().map(|s| s.to_string()).collect());
        }
        plan.order.extend(members.into_iter().map(str::to_string));
    }
    plan
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bizkit_core::manifest::ModuleManifest;

    use super::*;

    fn manifests(graph: &[(&str, &[&str])]) -> ManifestMap {
        graph.iter()
            .map(|(slug, deps)| {
                (
                    slug.to_string(),
                    Arc::new(ModuleManifest::new(slug).with_dependencies(deps.iter().copied())),
                )
            })
            .collect()
    }

    fn all(m: &ManifestMap) -> BTreeSet<String> {
        m.keys().cloned().collect()
    }

    fn position(plan: &BootPlan, slug: &str) -> usize {
        plan.order.iter().position(|s| s == slug).unwrap()
    }

    #[test]
    fn dependencies_come_first() {
        let m = manifests(&[
            ("reports", &["billing", "customers"]),
            ("billing", &["customers"]),
            ("customers", &[]),
            ("scheduling", &["customers"]),
        ]);
        let plan = boot_order(&m, &all(&m));
        assert_eq!(plan.order.len(), 4);
        assert!(position(&plan, "customers") < position(&plan, "billing"));
        assert!(position(&plan, "billing") < position(&plan, "reports"));
        assert!(position(&plan, "customers") < position(&plan, "scheduling"));
        assert!(plan.cycles.is_empty());
    }

    #[test]
    fn cycle_members_are_grouped_in_slug_order() {
        let m = manifests(&[("b", &["a"]), ("a", &["b"]), ("c", &["a"])]);
        let plan = boot_order(&m, &all(&m));
        assert_eq!(plan.cycles, vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(plan.order, vec!["a", "b", "c"]);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let m = manifests(&[("loop", &["loop"])]);
        let plan = boot_order(&m, &all(&m));
        assert_eq!(plan.cycles, vec![vec!["loop".to_string()]]);
    }

    #[test]
    fn only_allowed_slugs_are_ordered() {
        let m = manifests(&[("customers", &[]), ("billing", &["customers"])]);
        let allowed: BTreeSet<String> = ["customers".to_string()].into_iter().collect();
        assert_eq!(boot_order(&m, &allowed).order, vec!["customers"]);
    }
}
