pub mod aggregate;
pub mod arena;

use std::collections::HashMap;

use self::arena::{NodeId, Tree};

/// Build a weighted Tree from slash-separated paths.
///
/// Every intermediate segment becomes a container, every final segment a leaf.
/// Paths are attached in the order given so sibling order follows the input.
/// Blank lines and `#` comments are skipped.
pub fn build_tree<'a>(root_label: &str, paths: impl IntoIterator<Item = &'a str>) -> Tree {
    let mut tree = Tree::new(root_label);

    // Map from path prefix → NodeId for parent lookups
    let mut path_map: HashMap<String, NodeId> = HashMap::new();
    let mut entries = 0usize;

    for raw in paths {
        let path = raw.trim().trim_matches('/');
        if path.is_empty() || path.starts_with('#') {
            continue;
        }
        ensure_node(&mut tree, &mut path_map, path);
        entries += 1;
    }

    aggregate::assign_weights(&mut tree);

    tracing::info!(
        "Tree built from {} paths: {} nodes, {} leaves",
        entries,
        tree.len(),
        tree.get(tree.root).weight
    );

    tree
}

/// Ensure every prefix of `path` exists, creating missing ancestors from the root downward.
fn ensure_node(tree: &mut Tree, path_map: &mut HashMap<String, NodeId>, path: &str) -> NodeId {
    if let Some(&id) = path_map.get(path) {
        return id;
    }

    let mut parent = tree.root;
    let mut prefix = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        parent = match path_map.get(&prefix) {
            Some(&id) => id,
            None => {
                let id = tree.add_child(parent, Some(segment));
                path_map.insert(prefix.clone(), id);
                id
            }
        };
    }

    parent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_containers() {
        let tree = build_tree(
            "repo",
            ["src/lib.rs", "src/layout/mod.rs", "src/layout/engine.rs", "README.md", ""],
        );
        // root, src, lib.rs, layout, mod.rs, engine.rs, README.md
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.get(tree.root).weight, 4);

        let top: Vec<String> = tree
            .children(tree.root)
            .map(|id| tree.display_name(id))
            .collect();
        assert_eq!(top, vec!["src", "README.md"]);
    }

    #[test]
    fn duplicate_paths_are_merged() {
        let tree = build_tree("r", ["a/b", "a/b", "# comment", "a/c"]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(tree.root).weight, 2);
    }
}
