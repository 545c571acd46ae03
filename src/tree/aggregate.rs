use super::arena::{NodeId, Tree};

/// Compute weights for all nodes (bottom-up).
/// After this, every leaf has weight 1 and every container the sum of its
/// children's weights, i.e. the number of leaves beneath it. Idempotent.
pub fn assign_weights(tree: &mut Tree) {
    // Process nodes in reverse order (children before parents) since
    // children always have higher indices than their parents in our arena.
    let len = tree.nodes.len();
    for i in (0..len).rev() {
        let node = &tree.nodes[i];
        if node.is_leaf() {
            tree.nodes[i].weight = 1;
            continue;
        }

        let mut total: u64 = 0;
        let mut child = node.first_child;
        while let Some(child_id) = child {
            total += tree.nodes[child_id.index()].weight;
            child = tree.nodes[child_id.index()].next_sibling;
        }
        tree.nodes[i].weight = total;
    }
}

/// Number of nodes strictly below `id`.
pub fn descendant_count(tree: &Tree, id: NodeId) -> u32 {
    let mut count = 0;
    let mut stack: Vec<NodeId> = tree.children(id).collect();
    while let Some(next) = stack.pop() {
        count += 1;
        stack.extend(tree.children(next));
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let mut tree = Tree::new("root");
        let a = tree.add_child(tree.root, Some("a"));
        tree.add_child(a, Some("a1"));
        tree.add_child(a, Some("a2"));
        let b = tree.add_child(tree.root, Some("b"));
        let b1 = tree.add_child(b, Some("b1"));
        tree.add_child(b1, Some("b1x"));
        tree.add_child(tree.root, Some("c"));
        tree
    }

    #[test]
    fn root_weight_equals_leaf_count() {
        let mut tree = sample();
        assign_weights(&mut tree);
        assert_eq!(tree.get(tree.root).weight, 4);
        let kids: Vec<NodeId> = tree.children(tree.root).collect();
        assert_eq!(tree.get(kids[0]).weight, 2);
        assert_eq!(tree.get(kids[1]).weight, 1);
        assert_eq!(tree.get(kids[2]).weight, 1);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut tree = sample();
        assign_weights(&mut tree);
        let first: Vec<u64> = tree.nodes.iter().map(|n| n.weight).collect();
        tree.nodes[0].weight = 999;
        assign_weights(&mut tree);
        let second: Vec<u64> = tree.nodes.iter().map(|n| n.weight).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn counts_descendants() {
        let tree = sample();
        assert_eq!(descendant_count(&tree, tree.root), 7);
        let b = tree.children(tree.root).nth(1).unwrap();
        assert_eq!(descendant_count(&tree, b), 2);
    }
}
