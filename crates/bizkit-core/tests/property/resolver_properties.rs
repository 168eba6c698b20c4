//! Property tests for dependency resolution: stability, order independence,
//! and closure safety over random dependency graphs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use proptest::prelude::*;

use bizkit_core::manifest::ManifestMap;
use bizkit_core::{resolve, LicenseDecision, ModuleManifest, ResolvedModuleSet};

/// Random graph over `m0..m{n}` with dependencies possibly pointing at
/// uninstalled `ghost*` slugs, a random license-denied subset, and a random
/// requested subset.
#[derive(Debug, Clone)]
struct Scenario {
    manifests: ManifestMap,
    denied: BTreeSet<String>,
    requested: Vec<String>,
}

fn scenario() -> impl Strategy<Value = Scenario> {
    (2usize..12).prop_flat_map(|n| {
        let deps = proptest::collection::vec(
            proptest::collection::btree_set(0usize..n + 2, 0..4),
            n,
        );
        let denied = proptest::collection::btree_set(0usize..n, 0..3);
        let requested = proptest::collection::btree_set(0usize..n + 2, 0..n + 2);
        (Just(n), deps, denied, requested).prop_map(|(n, deps, denied, requested)| {
            let name = |i: usize| {
                if i < n {
                    format!("m{i}")
                } else {
                    format!("ghost{i}")
                }
            };
            let manifests = deps
                .into_iter()
                .enumerate()
                .map(|(i, d)| {
                    let slug = name(i);
                    let manifest = ModuleManifest::new(&slug).with_dependencies(d.into_iter().map(name));
                    (slug, Arc::new(manifest))
                })
                .collect::<BTreeMap<_, _>>();
            Scenario {
                manifests,
                denied: denied.into_iter().map(name).collect(),
                requested: requested.into_iter().map(name).collect(),
            }
        })
    })
}

fn run(s: &Scenario, requested: &[String]) -> ResolvedModuleSet {
    resolve(&s.manifests, requested.iter().map(String::as_str), |slug, _| {
        LicenseDecision::from(!s.denied.contains(slug))
    })
}

proptest! {
    #[test]
    fn resolving_the_allowed_set_is_a_fixed_point(s in scenario()) {
        let first = run(&s, &s.requested);
        let allowed: Vec<String> = first.allowed_slugs().into_iter().collect();
        let second = run(&s, &allowed);
        prop_assert_eq!(second.allowed_slugs(), first.allowed_slugs());
    }

    #[test]
    fn request_order_does_not_matter(s in scenario()) {
        let forward = run(&s, &s.requested);
        let mut reversed = s.requested.clone();
        reversed.reverse();
        let backward = run(&s, &reversed);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn allowed_modules_have_allowed_dependency_closure(s in scenario()) {
        let set = run(&s, &s.requested);
        for slug in set.allowed_slugs() {
            let mut stack = vec![slug.clone()];
            let mut seen = BTreeSet::new();
            while let Some(current) = stack.pop() {
                if !seen.insert(current.clone()) {
                    continue;
                }
                prop_assert!(set.is_allowed(&current), "{} allowed but {} is not", slug, current);
                prop_assert!(!s.denied.contains(&current));
                for dep in &s.manifests[&current].dependencies {
                    stack.push(dep.clone());
                }
            }
        }
    }

    #[test]
    fn only_installed_requested_slugs_are_reported(s in scenario()) {
        let set = run(&s, &s.requested);
        for (slug, _) in set.iter() {
            prop_assert!(s.manifests.contains_key(slug));
            prop_assert!(s.requested.iter().any(|r| r == slug));
        }
    }
}
