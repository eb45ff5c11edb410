//! Tree optimization - hoisting shared sub-dependencies and pruning
//! now-redundant nested duplicates.
//!
//! The pass runs bottom-up: a node's children are optimized before the
//! node's own level is rewritten. For each level, nested grandchildren
//! are hoisted up when the level has no entry with that name yet,
//! pruned when an entry with the identical reference already exists,
//! and left nested when the references conflict - the conflicting copy
//! stays closest to the dependent that needs it. Hoisting is a single
//! pass over the level as it looked before any grandchild moved up;
//! hoisted entries are not themselves re-scanned, so multi-level
//! duplicates may take effect only at the next level down.

use crate::resolve::PackageNode;

/// Rewrite a resolved tree so each level holds at most one entry per
/// package name, minimizing on-disk duplication while keeping genuine
/// version conflicts isolated.
pub fn optimize_tree(mut node: PackageNode) -> PackageNode {
    node.dependencies = node.dependencies.into_iter().map(optimize_tree).collect();

    let mut dependencies = node.dependencies;
    let level_len = dependencies.len();

    for host in 0..level_len {
        // Snapshot by name: the child list was already optimized, so
        // names are unique within it.
        let nested: Vec<String> = dependencies[host]
            .dependencies
            .iter()
            .map(|sub| sub.name.clone())
            .collect();

        for sub_name in nested {
            let Some(sub_index) = dependencies[host]
                .dependencies
                .iter()
                .position(|d| d.name == sub_name)
            else {
                continue;
            };

            match dependencies.iter().position(|d| d.name == sub_name) {
                // Nothing at this level with that name: hoist.
                None => {
                    let sub = dependencies[host].dependencies.remove(sub_index);
                    dependencies.push(sub);
                }
                Some(existing) => {
                    // Same reference: the sibling copy satisfies it.
                    // Different reference: genuine conflict, keep nested.
                    if dependencies[existing].reference
                        == dependencies[host].dependencies[sub_index].reference
                    {
                        dependencies[host].dependencies.remove(sub_index);
                    }
                }
            }
        }
    }

    node.dependencies = dependencies;
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::PackageNode;
    use std::collections::HashSet;

    fn node(name: &str, reference: &str, dependencies: Vec<PackageNode>) -> PackageNode {
        PackageNode::with_dependencies(name, reference, dependencies)
    }

    fn leaf(name: &str, reference: &str) -> PackageNode {
        PackageNode::new(name, reference)
    }

    fn root(dependencies: Vec<PackageNode>) -> PackageNode {
        node("demo", "", dependencies)
    }

    fn names_at_level(node: &PackageNode) -> Vec<&str> {
        node.dependencies.iter().map(|d| d.name.as_str()).collect()
    }

    fn assert_unique_names(node: &PackageNode) {
        let mut seen = HashSet::new();
        for dep in &node.dependencies {
            assert!(
                seen.insert(dep.name.as_str()),
                "duplicate name {} at one level",
                dep.name
            );
            assert_unique_names(dep);
        }
    }

    #[test]
    fn test_hoists_single_nested_dependency() {
        let tree = root(vec![node("a", "1.0.0", vec![leaf("b", "2.1.0")])]);
        let optimized = optimize_tree(tree);

        assert_eq!(names_at_level(&optimized), vec!["a", "b"]);
        assert!(optimized.dependencies[0].dependencies.is_empty());
        assert_unique_names(&optimized);
    }

    #[test]
    fn test_prunes_duplicate_with_same_reference() {
        let tree = root(vec![
            node("a", "1.0.0", vec![leaf("b", "2.0.0")]),
            leaf("b", "2.0.0"),
        ]);
        let optimized = optimize_tree(tree);

        assert_eq!(names_at_level(&optimized), vec!["a", "b"]);
        assert!(
            optimized.dependencies[0].dependencies.is_empty(),
            "nested copy with the same reference must be pruned"
        );
    }

    #[test]
    fn test_keeps_conflicting_version_nested() {
        let tree = root(vec![
            node("a", "1.0.0", vec![leaf("b", "1.5.0")]),
            leaf("b", "2.0.0"),
        ]);
        let optimized = optimize_tree(tree);

        assert_eq!(names_at_level(&optimized), vec!["a", "b"]);
        // The conflicting 1.5.0 stays under a; the root keeps 2.0.0
        assert_eq!(optimized.dependencies[0].dependencies, vec![leaf("b", "1.5.0")]);
        assert_eq!(optimized.dependencies[1].reference, "2.0.0");
        assert_unique_names(&optimized);
    }

    #[test]
    fn test_hoisted_entry_blocks_later_conflicting_copy() {
        let tree = root(vec![
            node("a", "1.0.0", vec![leaf("c", "1.0.0")]),
            node("b", "1.0.0", vec![leaf("c", "2.0.0")]),
        ]);
        let optimized = optimize_tree(tree);

        // c@1.0.0 was hoisted first; b keeps its conflicting c@2.0.0
        assert_eq!(names_at_level(&optimized), vec!["a", "b", "c"]);
        assert_eq!(optimized.dependencies[2].reference, "1.0.0");
        assert_eq!(
            optimized.dependencies[1].dependencies,
            vec![leaf("c", "2.0.0")]
        );
        assert_unique_names(&optimized);
    }

    #[test]
    fn test_hoisted_entry_absorbs_later_identical_copy() {
        let tree = root(vec![
            node("a", "1.0.0", vec![leaf("c", "1.0.0")]),
            node("b", "1.0.0", vec![leaf("c", "1.0.0")]),
        ]);
        let optimized = optimize_tree(tree);

        assert_eq!(names_at_level(&optimized), vec!["a", "b", "c"]);
        assert!(optimized.dependencies[0].dependencies.is_empty());
        assert!(optimized.dependencies[1].dependencies.is_empty());
    }

    #[test]
    fn test_runs_bottom_up() {
        // b's own duplicate of c is resolved before a's level is scanned
        let tree = root(vec![node(
            "a",
            "1.0.0",
            vec![
                node("b", "1.0.0", vec![leaf("c", "3.0.0")]),
                leaf("c", "3.0.0"),
            ],
        )]);
        let optimized = optimize_tree(tree);

        assert_eq!(names_at_level(&optimized), vec!["a", "b", "c"]);
        assert_unique_names(&optimized);
    }

    #[test]
    fn test_idempotent_on_optimized_tree() {
        let tree = root(vec![
            node("a", "1.0.0", vec![leaf("b", "1.5.0")]),
            leaf("b", "2.0.0"),
            leaf("c", "1.0.0"),
        ]);
        let once = optimize_tree(tree);
        let twice = optimize_tree(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_and_flat_trees_unchanged() {
        let empty = root(vec![]);
        assert_eq!(optimize_tree(empty.clone()), empty);

        let flat = root(vec![leaf("a", "1.0.0"), leaf("b", "2.0.0")]);
        assert_eq!(optimize_tree(flat.clone()), flat);
    }
}
