pub mod config;
pub mod engine;
pub mod free_rects;
pub mod overlap;
pub mod packer;
pub mod rect;

use std::collections::HashMap;

use crate::tree::aggregate::{assign_weights, descendant_count};
use crate::tree::arena::{NodeId, Tree};

pub use config::{ConfigError, Heuristics, LayoutOptions};
pub use overlap::{find_overlaps, resolve_overlaps, OverlapReport};
pub use rect::Rect;

/// How much visual detail a node gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Border plus label
    Text,
    /// Border (and header band for containers) only
    Box,
    /// Too small to draw
    None,
}

/// A positioned node in the layout.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub node: NodeId,
    /// Absolute viewport coordinates
    pub rect: Rect,
    pub depth: u16,
    /// Index of the parent in `Layout::nodes` (None for root). Used for ancestor checks.
    pub parent: Option<usize>,
    /// Indices of laid-out children, in input order
    pub children: Vec<usize>,
    pub mode: RenderMode,
    pub is_container: bool,
    /// Direct children that could not be placed
    pub hidden_children: u32,
    /// Input nodes anywhere below this one that have no layout node
    pub hidden_descendants: u32,
}

/// The full layout result (nodes in pre-order + fast lookup).
#[derive(Debug, Clone)]
pub struct Layout {
    /// All laid-out nodes; index 0 is the root and parents precede their children
    pub nodes: Vec<LayoutNode>,
    /// node → index into `nodes` (O(1) hover, tooltip, highlighting)
    pub node_to_index: HashMap<NodeId, usize>,
    /// Outcome of the overlap correction pass
    pub overlap: OverlapReport,
}

impl Layout {
    pub fn root(&self) -> &LayoutNode {
        &self.nodes[0]
    }

    pub fn get(&self, node: NodeId) -> Option<&LayoutNode> {
        self.node_to_index.get(&node).map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Area available to the children of `nodes[index]`.
    pub fn content_rect(&self, index: usize, options: &LayoutOptions) -> Rect {
        engine::content_area(&self.nodes[index].rect, options)
    }

    /// Whether `ancestor` lies on the parent chain of `index`.
    pub fn is_ancestor(&self, ancestor: usize, index: usize) -> bool {
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent].parent;
        }
        false
    }

    /// Deepest rendered node containing the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        // Iterate in reverse since deeper nodes are added later
        self.nodes
            .iter()
            .rev()
            .filter(|n| n.mode != RenderMode::None)
            .find(|n| x >= n.rect.x && x < n.rect.right() && y >= n.rect.y && y < n.rect.bottom())
            .map(|n| n.node)
    }

    /// Shift a node and everything beneath it vertically.
    pub fn translate_subtree(&mut self, index: usize, dy: f32) {
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            self.nodes[i].rect.y += dy;
            stack.extend(self.nodes[i].children.iter().copied());
        }
    }
}

/// Compute the layout of the subtree rooted at `root` inside a
/// `viewport_w` x `viewport_h` viewport.
///
/// Weights are re-aggregated first, so the tree may come straight from
/// `Tree::add_child`. Only invalid options produce an error; running out of
/// space never does.
pub fn compute_layout(
    tree: &mut Tree,
    root: NodeId,
    viewport_w: f32,
    viewport_h: f32,
    options: &LayoutOptions,
    heuristics: &Heuristics,
) -> Result<Layout, ConfigError> {
    options.validate()?;
    assign_weights(tree);
    let tree = &*tree;

    let viewport = Rect::new(0.0, 0.0, viewport_w, viewport_h);
    let (nodes, node_to_index) = engine::LayoutEngine::new(tree, options, heuristics).run(root, viewport);

    let mut layout = Layout {
        nodes,
        node_to_index,
        overlap: OverlapReport::default(),
    };
    layout.overlap = resolve_overlaps(&mut layout, options, heuristics.overlap_epsilon);

    let root_node = layout.root();
    tracing::info!(
        "Laid out {} of {} nodes under '{}' in {:.0}x{:.0} ({} hidden, {} overlap corrections)",
        layout.len(),
        1 + descendant_count(tree, root),
        tree.display_name(root),
        viewport_w,
        viewport_h,
        root_node.hidden_descendants,
        layout.overlap.corrections
    );

    Ok(layout)
}
