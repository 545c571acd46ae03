use compact_str::CompactString;

/// Index into the arena `Vec<Node>`. Uses u32 to keep layout bookkeeping small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single node in the input tree, stored in a flat arena.
/// Uses sibling-list representation: each node has `first_child` and `next_sibling`.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display label (optional; renderers fall back to the id)
    pub label: Option<CompactString>,
    /// Leaf count of the subtree. Written by `aggregate::assign_weights`.
    pub weight: u64,
    /// Parent node index (None for root)
    pub parent: Option<NodeId>,
    /// First child node index (None for leaves)
    pub first_child: Option<NodeId>,
    /// Last child, kept so appends stay O(1) and source order is preserved
    pub last_child: Option<NodeId>,
    /// Next sibling node index (None if last child)
    pub next_sibling: Option<NodeId>,
    /// Depth in the tree (root = 0)
    pub depth: u16,
}

impl Node {
    fn new(label: Option<&str>) -> Self {
        Self {
            label: label.map(CompactString::new),
            weight: 1,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            depth: 0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.first_child.is_none()
    }
}

/// The weighted input tree stored as a flat arena of nodes.
///
/// Children always have higher indices than their parents, which is what lets
/// weight aggregation run as a single reverse sweep. Nodes can only be attached
/// to an existing parent, so the arena can never contain a cycle.
#[derive(Debug, Clone)]
pub struct Tree {
    /// All nodes in contiguous memory
    pub nodes: Vec<Node>,
    /// Root node index
    pub root: NodeId,
}

impl Tree {
    /// Create a tree holding only a root node.
    pub fn new(root_label: &str) -> Self {
        Tree {
            nodes: vec![Node::new(Some(root_label))],
            root: NodeId(0),
        }
    }

    /// Append a child under the given parent. Returns the new node's ID.
    pub fn add_child(&mut self, parent: NodeId, label: Option<&str>) -> NodeId {
        let new_id = NodeId(self.nodes.len() as u32);
        let mut node = Node::new(label);
        node.parent = Some(parent);
        node.depth = self.nodes[parent.index()].depth + 1;

        let parent_node = &mut self.nodes[parent.index()];
        match parent_node.last_child {
            Some(last) => {
                parent_node.last_child = Some(new_id);
                self.nodes[last.index()].next_sibling = Some(new_id);
            }
            None => {
                parent_node.first_child = Some(new_id);
                parent_node.last_child = Some(new_id);
            }
        }

        self.nodes.push(node);
        new_id
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Total number of nodes, root included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over children of a node in insertion order.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            current: self.nodes[parent.index()].first_child,
        }
    }

    /// Label for display, falling back to `#<id>`.
    pub fn display_name(&self, id: NodeId) -> String {
        match &self.get(id).label {
            Some(label) => label.to_string(),
            None => format!("#{}", id.0),
        }
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    tree: &'a Tree,
    current: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.nodes[id.index()].next_sibling;
        Some(id)
    }
}
