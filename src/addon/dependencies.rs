// src/addon/dependencies.rs

//! Dependency graph analysis over installed packs
//!
//! Builds forward and reverse dependency edges from installed manifests,
//! detects cycles with a DFS recursion stack, and partitions packs into
//! root / dependent / standalone / circular categories. A bad manifest or
//! a malformed dependency UUID degrades to a warning, never an abort:
//! analysis must work on servers that were hand-edited.

use crate::error::Result;
use crate::manifest::Manifest;
use crate::server::packs::InstalledPack;
use crate::server::Server;
use crate::validation::{is_valid_uuid, normalize_uuid};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// An installed pack with its full relationship picture
#[derive(Debug, Clone)]
pub struct PackRelationship {
    pub pack: InstalledPack,
    /// UUIDs of packs this pack depends on (forward edges)
    pub dependencies: Vec<String>,
    /// UUIDs of packs that depend on this pack (reverse edges)
    pub dependents: Vec<String>,
    /// Declared dependencies that are not installed
    pub missing_dependencies: Vec<String>,
    /// Script API modules used (e.g. `@minecraft/server`)
    pub modules: Vec<String>,
    pub manifest: Option<Manifest>,
}

/// Installed packs partitioned by graph topology
///
/// The four categories are mutually exclusive and jointly cover every
/// installed pack; a pack on any cycle lands only in a circular group.
#[derive(Debug, Clone, Default)]
pub struct DependencyGroup {
    /// Packs others depend on that depend on nothing themselves
    pub root_packs: Vec<PackRelationship>,
    /// Packs with outgoing dependencies, not on a cycle
    pub dependent_packs: Vec<PackRelationship>,
    /// Packs with no edges in either direction
    pub standalone_packs: Vec<PackRelationship>,
    /// Cycle member groups, each cycle reported once
    pub circular_groups: Vec<Vec<PackRelationship>>,
}

impl DependencyGroup {
    /// Every categorized pack, cycles included.
    pub fn all_packs(&self) -> impl Iterator<Item = &PackRelationship> {
        self.root_packs
            .iter()
            .chain(self.dependent_packs.iter())
            .chain(self.standalone_packs.iter())
            .chain(self.circular_groups.iter().flatten())
    }
}

/// Result of one analysis run: the partition plus non-fatal findings
#[derive(Debug, Clone)]
pub struct DependencyAnalysis {
    pub group: DependencyGroup,
    pub warnings: Vec<String>,
}

/// An unmet dependency found when checking an incoming install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    /// Display name of the pack that declares the requirement
    pub pack_name: String,
    /// The dependency UUID that is neither installed nor incoming
    pub missing_uuid: String,
}

impl fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pack '{}' requires dependency UUID {} which is not installed",
            self.pack_name, self.missing_uuid
        )
    }
}

/// Analyzes the dependency graph of a server's installed packs
pub struct DependencyAnalyzer<'a> {
    server: &'a Server,
}

impl<'a> DependencyAnalyzer<'a> {
    pub fn new(server: &'a Server) -> Self {
        Self { server }
    }

    /// Build the full graph and classification for all installed packs.
    pub fn analyze(&self) -> Result<DependencyAnalysis> {
        let installed = self.server.installed_packs()?;

        let mut warnings = Vec::new();
        let mut relationships: BTreeMap<String, PackRelationship> = BTreeMap::new();

        for pack in installed {
            let key = normalize_uuid(&pack.pack_id);
            let rel = self.build_relationship(&pack, &mut warnings);
            relationships.insert(key, rel);
        }

        // Deps that point at nothing installed
        let keys: Vec<String> = relationships.keys().cloned().collect();
        for rel in relationships.values_mut() {
            rel.missing_dependencies = rel
                .dependencies
                .iter()
                .filter(|dep| !keys.contains(dep))
                .cloned()
                .collect();
        }

        compute_dependents(&mut relationships);

        let group = classify(&relationships);

        Ok(DependencyAnalysis { group, warnings })
    }

    fn build_relationship(
        &self,
        pack: &InstalledPack,
        warnings: &mut Vec<String>,
    ) -> PackRelationship {
        let mut rel = PackRelationship {
            pack: pack.clone(),
            dependencies: Vec::new(),
            dependents: Vec::new(),
            missing_dependencies: Vec::new(),
            modules: Vec::new(),
            manifest: None,
        };

        let manifest = match self.server.find_manifest(&pack.pack_id, pack.pack_type) {
            Ok(manifest) => manifest,
            Err(e) => {
                warnings.push(format!(
                    "could not analyze pack {} ({}): {}; treating pack as standalone",
                    pack.name, pack.pack_id, e
                ));
                return rel;
            }
        };

        for (uuid, _version) in manifest.pack_dependencies() {
            if !is_valid_uuid(uuid) {
                warnings.push(format!(
                    "invalid dependency UUID format '{}' in pack {}; skipping this dependency",
                    uuid, pack.pack_id
                ));
                continue;
            }
            rel.dependencies.push(normalize_uuid(uuid));
        }
        for module in manifest.module_dependencies() {
            rel.modules.push(module.to_string());
        }

        rel.manifest = Some(manifest);
        rel
    }

    /// Root → children map for tree rendering: every root pack maps to the
    /// dependent packs that declare it, standalone packs map to nothing.
    pub fn dependency_tree(group: &DependencyGroup) -> BTreeMap<String, Vec<PackRelationship>> {
        let mut tree = BTreeMap::new();

        for root in &group.root_packs {
            let root_id = normalize_uuid(&root.pack.pack_id);
            let children: Vec<PackRelationship> = group
                .dependent_packs
                .iter()
                .filter(|dep| dep.dependencies.iter().any(|d| *d == root_id))
                .cloned()
                .collect();
            tree.insert(root_id, children);
        }

        for standalone in &group.standalone_packs {
            tree.insert(normalize_uuid(&standalone.pack.pack_id), Vec::new());
        }

        tree
    }
}

/// Check that every pack-UUID dependency of an incoming pack set is
/// satisfied by the union of already-installed and incoming packs.
///
/// Module-name dependencies are resolved by the game runtime and are not
/// checked here.
pub fn unsatisfied_dependencies(
    incoming: &[&Manifest],
    installed: &[InstalledPack],
) -> Vec<MissingDependency> {
    let mut available: HashSet<String> = installed
        .iter()
        .map(|p| normalize_uuid(&p.pack_id))
        .collect();
    for manifest in incoming {
        available.insert(normalize_uuid(&manifest.header.uuid));
    }

    let mut missing = Vec::new();
    for manifest in incoming {
        for (uuid, _version) in manifest.pack_dependencies() {
            let dep = normalize_uuid(uuid);
            if !available.contains(&dep) {
                missing.push(MissingDependency {
                    pack_name: manifest.display_name(),
                    missing_uuid: dep,
                });
            }
        }
    }

    missing
}

fn compute_dependents(relationships: &mut BTreeMap<String, PackRelationship>) {
    let edges: Vec<(String, Vec<String>)> = relationships
        .iter()
        .map(|(id, rel)| (id.clone(), rel.dependencies.clone()))
        .collect();

    for (pack_id, deps) in edges {
        for dep in deps {
            if let Some(target) = relationships.get_mut(&dep) {
                target.dependents.push(pack_id.clone());
            }
        }
    }
}

/// Find all dependency cycles with a depth-first search.
///
/// A back edge to a node on the current recursion stack reveals a cycle;
/// the cycle is the path suffix starting at that node. Equivalent cycles
/// reached from different starting points are deduplicated by a key built
/// from the sorted member set. O(V + E).
fn detect_cycles(relationships: &BTreeMap<String, PackRelationship>) -> Vec<Vec<String>> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let mut seen_keys: HashSet<String> = HashSet::new();

    for start in relationships.keys() {
        if visited.contains(start) {
            continue;
        }

        let mut rec_stack: HashSet<String> = HashSet::new();
        let mut path: Vec<String> = Vec::new();
        if let Some(cycle) = dfs(start, relationships, &mut visited, &mut rec_stack, &mut path) {
            let mut key_parts = cycle.clone();
            key_parts.sort();
            let key = key_parts.join(",");
            if seen_keys.insert(key) {
                cycles.push(cycle);
            }
        }
    }

    cycles
}

fn dfs(
    node: &str,
    relationships: &BTreeMap<String, PackRelationship>,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(rel) = relationships.get(node) {
        for dep in &rel.dependencies {
            if !visited.contains(dep) {
                if let Some(cycle) = dfs(dep, relationships, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(dep) {
                // Back edge: the cycle is the path suffix from the target
                if let Some(start) = path.iter().position(|id| id == dep) {
                    return Some(path[start..].to_vec());
                }
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

fn classify(relationships: &BTreeMap<String, PackRelationship>) -> DependencyGroup {
    let mut group = DependencyGroup::default();

    let cycles = detect_cycles(relationships);
    let mut in_cycle: HashSet<String> = HashSet::new();
    for cycle in &cycles {
        let members: Vec<PackRelationship> = cycle
            .iter()
            .filter_map(|id| relationships.get(id).cloned())
            .collect();
        for id in cycle {
            in_cycle.insert(id.clone());
        }
        if !members.is_empty() {
            group.circular_groups.push(members);
        }
    }

    for (pack_id, rel) in relationships {
        if in_cycle.contains(pack_id) {
            continue;
        }

        let has_dependencies = !rel.dependencies.is_empty();
        let has_dependents = !rel.dependents.is_empty();

        match (has_dependencies, has_dependents) {
            (false, false) => group.standalone_packs.push(rel.clone()),
            (false, true) => group.root_packs.push(rel.clone()),
            // Anything with outgoing edges sits in a chain
            (true, _) => group.dependent_packs.push(rel.clone()),
        }
    }

    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackType;
    use crate::version::PackVersion;

    fn pack(uuid: &str, name: &str) -> InstalledPack {
        InstalledPack {
            pack_id: uuid.to_string(),
            name: name.to_string(),
            description: String::new(),
            version: PackVersion::new(1, 0, 0),
            pack_type: PackType::Behavior,
        }
    }

    fn rel(uuid: &str, name: &str, deps: &[&str]) -> PackRelationship {
        PackRelationship {
            pack: pack(uuid, name),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            dependents: Vec::new(),
            missing_dependencies: Vec::new(),
            modules: Vec::new(),
            manifest: None,
        }
    }

    fn graph(rels: Vec<PackRelationship>) -> BTreeMap<String, PackRelationship> {
        let mut map = BTreeMap::new();
        for r in rels {
            map.insert(r.pack.pack_id.clone(), r);
        }
        map
    }

    const A: &str = "aaaaaaaa-0000-0000-0000-000000000000";
    const B: &str = "bbbbbbbb-0000-0000-0000-000000000000";
    const C: &str = "cccccccc-0000-0000-0000-000000000000";
    const D: &str = "dddddddd-0000-0000-0000-000000000000";

    #[test]
    fn test_classification_partition() {
        // B depends on A; C stands alone
        let mut map = graph(vec![
            rel(A, "A", &[]),
            rel(B, "B", &[A]),
            rel(C, "C", &[]),
        ]);
        compute_dependents(&mut map);

        let group = classify(&map);
        assert_eq!(group.root_packs.len(), 1);
        assert_eq!(group.root_packs[0].pack.pack_id, A);
        assert_eq!(group.dependent_packs.len(), 1);
        assert_eq!(group.dependent_packs[0].pack.pack_id, B);
        assert_eq!(group.standalone_packs.len(), 1);
        assert_eq!(group.standalone_packs[0].pack.pack_id, C);
        assert!(group.circular_groups.is_empty());

        // The partition covers everything exactly once
        assert_eq!(group.all_packs().count(), 3);
    }

    #[test]
    fn test_middle_of_chain_is_dependent() {
        // C -> B -> A: B has both edges but no cycle
        let mut map = graph(vec![
            rel(A, "A", &[]),
            rel(B, "B", &[A]),
            rel(C, "C", &[B]),
        ]);
        compute_dependents(&mut map);

        let group = classify(&map);
        let dependents: Vec<_> = group
            .dependent_packs
            .iter()
            .map(|r| r.pack.pack_id.as_str())
            .collect();
        assert!(dependents.contains(&B));
        assert!(dependents.contains(&C));
        assert_eq!(group.root_packs.len(), 1);
    }

    #[test]
    fn test_three_cycle_reported_once() {
        let mut map = graph(vec![
            rel(A, "X", &[B]),
            rel(B, "Y", &[C]),
            rel(C, "Z", &[A]),
        ]);
        compute_dependents(&mut map);

        let group = classify(&map);
        assert_eq!(group.circular_groups.len(), 1);
        assert_eq!(group.circular_groups[0].len(), 3);
        assert!(group.root_packs.is_empty());
        assert!(group.dependent_packs.is_empty());
        assert!(group.standalone_packs.is_empty());
    }

    #[test]
    fn test_two_cycles_both_found() {
        let mut map = graph(vec![
            rel(A, "A", &[B]),
            rel(B, "B", &[A]),
            rel(C, "C", &[D]),
            rel(D, "D", &[C]),
        ]);
        compute_dependents(&mut map);

        let group = classify(&map);
        assert_eq!(group.circular_groups.len(), 2);
        assert_eq!(group.all_packs().count(), 4);
    }

    #[test]
    fn test_self_cycle() {
        let mut map = graph(vec![rel(A, "A", &[A])]);
        compute_dependents(&mut map);

        let group = classify(&map);
        assert_eq!(group.circular_groups.len(), 1);
        assert_eq!(group.circular_groups[0].len(), 1);
    }

    #[test]
    fn test_unsatisfied_dependencies() {
        let manifest_json = format!(
            r#"{{
                "format_version": 2,
                "header": {{
                    "name": "Needy",
                    "uuid": "{A}",
                    "version": [1, 0, 0]
                }},
                "modules": [
                    {{ "type": "data", "uuid": "{B}", "version": [1, 0, 0] }}
                ],
                "dependencies": [
                    {{ "uuid": "{C}", "version": [1, 0, 0] }},
                    {{ "module_name": "@minecraft/server", "version": "1.9.0" }}
                ]
            }}"#
        );
        let manifest = Manifest::parse(manifest_json.as_bytes()).unwrap();

        // Nothing installed: C is missing
        let missing = unsatisfied_dependencies(&[&manifest], &[]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].missing_uuid, C);
        assert_eq!(missing[0].pack_name, "Needy");

        // C installed: satisfied; module deps never count
        let missing = unsatisfied_dependencies(&[&manifest], &[pack(C, "Dep")]);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_incoming_set_satisfies_itself() {
        let a_json = format!(
            r#"{{
                "format_version": 2,
                "header": {{ "name": "A", "uuid": "{A}", "version": [1, 0, 0] }},
                "modules": [ {{ "type": "data", "uuid": "{C}", "version": [1, 0, 0] }} ],
                "dependencies": [ {{ "uuid": "{B}", "version": [1, 0, 0] }} ]
            }}"#
        );
        let b_json = format!(
            r#"{{
                "format_version": 2,
                "header": {{ "name": "B", "uuid": "{B}", "version": [1, 0, 0] }},
                "modules": [ {{ "type": "data", "uuid": "{D}", "version": [1, 0, 0] }} ]
            }}"#
        );
        let a = Manifest::parse(a_json.as_bytes()).unwrap();
        let b = Manifest::parse(b_json.as_bytes()).unwrap();

        let missing = unsatisfied_dependencies(&[&a, &b], &[]);
        assert!(missing.is_empty());
    }

    #[test]
    fn test_dependency_tree_shape() {
        let mut map = graph(vec![
            rel(A, "A", &[]),
            rel(B, "B", &[A]),
            rel(C, "C", &[]),
        ]);
        compute_dependents(&mut map);
        let group = classify(&map);

        let tree = DependencyAnalyzer::dependency_tree(&group);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[A].len(), 1);
        assert_eq!(tree[A][0].pack.pack_id, B);
        assert!(tree[C].is_empty());
    }

    #[test]
    fn test_missing_dependencies_noted_on_node() {
        let mut map = graph(vec![rel(A, "A", &[B])]);
        let keys: Vec<String> = map.keys().cloned().collect();
        for rel in map.values_mut() {
            rel.missing_dependencies = rel
                .dependencies
                .iter()
                .filter(|d| !keys.contains(d))
                .cloned()
                .collect();
        }
        assert_eq!(map[A].missing_dependencies, vec![B.to_string()]);
    }
}
