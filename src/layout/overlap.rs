use super::{Layout, LayoutOptions, Rect, RenderMode};

/// Drift allowed past a parent's content edge before a move is refused.
const CONTAINMENT_TOLERANCE: f32 = 0.01;

/// Outcome of one overlap correction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapReport {
    /// Pairs corrected by moving a subtree down
    pub corrections: usize,
    /// Pairs still overlapping after the pass
    pub remaining: usize,
}

fn participates(layout: &Layout, index: usize) -> bool {
    layout.nodes[index].mode != RenderMode::None
}

fn related(layout: &Layout, a: usize, b: usize) -> bool {
    layout.is_ancestor(a, b) || layout.is_ancestor(b, a)
}

/// Interiors cross on both axes and the shared area exceeds `epsilon`.
/// Wide siblings that merely touch can share a measurable area through float
/// error alone, so the per-axis check has to hold as well.
fn overlapping(a: &Rect, b: &Rect, epsilon: f32) -> bool {
    a.overlaps(b) && a.intersection_area(b) > epsilon
}

/// All rendered, non-ancestor pairs whose intersection area exceeds `epsilon`.
pub fn find_overlaps(layout: &Layout, epsilon: f32) -> Vec<(usize, usize)> {
    let n = layout.nodes.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        if !participates(layout, i) {
            continue;
        }
        for j in (i + 1)..n {
            if !participates(layout, j) || related(layout, i, j) {
                continue;
            }
            if overlapping(&layout.nodes[i].rect, &layout.nodes[j].rect, epsilon) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Single correction pass over the finished layout.
///
/// For every overlapping pair, the node with the larger y (the later one on a
/// tie) moves straight down until it clears the other plus `padding`, carrying
/// its whole subtree. Nodes are never moved sideways and the packer is not
/// re-run, so a chain of corrections can make a layout taller than needed.
/// A move that would push the node out of its parent's content area is
/// refused. Whatever still overlaps afterwards is counted and logged.
pub fn resolve_overlaps(layout: &mut Layout, options: &LayoutOptions, epsilon: f32) -> OverlapReport {
    let n = layout.nodes.len();
    let padding = options.padding;
    let mut corrections = 0;

    for i in 0..n {
        if !participates(layout, i) {
            continue;
        }
        for j in (i + 1)..n {
            if !participates(layout, j) || related(layout, i, j) {
                continue;
            }
            let a = layout.nodes[i].rect;
            let b = layout.nodes[j].rect;
            if !overlapping(&a, &b, epsilon) {
                continue;
            }

            let (moved, fixed) = if b.y >= a.y { (j, a) } else { (i, b) };
            let delta = fixed.y + fixed.h - layout.nodes[moved].rect.y + padding;
            if let Some(parent) = layout.nodes[moved].parent {
                let target = layout.nodes[moved].rect.translate(0.0, delta);
                let content = layout.content_rect(parent, options);
                if target.bottom() > content.bottom() + CONTAINMENT_TOLERANCE {
                    tracing::debug!(
                        "Overlap between layout nodes {} and {}: moving {} down by {:.2} would leave its parent",
                        i,
                        j,
                        moved,
                        delta
                    );
                    continue;
                }
            }
            tracing::debug!(
                "Overlap between layout nodes {} and {}: moving {} down by {:.2}",
                i,
                j,
                moved,
                delta
            );
            layout.translate_subtree(moved, delta);
            corrections += 1;
        }
    }

    let remaining = find_overlaps(layout, epsilon).len();
    if remaining > 0 {
        tracing::warn!(
            "{} overlapping pairs remain after {} corrections",
            remaining,
            corrections
        );
    }

    OverlapReport {
        corrections,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::layout::config::tests::options;
    use crate::layout::LayoutNode;
    use crate::tree::arena::NodeId;

    fn node(id: u32, rect: Rect, parent: Option<usize>, children: Vec<usize>) -> LayoutNode {
        LayoutNode {
            node: NodeId(id),
            rect,
            depth: if parent.is_some() { 1 } else { 0 },
            parent,
            children,
            mode: RenderMode::Box,
            is_container: true,
            hidden_children: 0,
            hidden_descendants: 0,
        }
    }

    fn layout(nodes: Vec<LayoutNode>) -> Layout {
        let node_to_index: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.node, i)).collect();
        Layout {
            nodes,
            node_to_index,
            overlap: OverlapReport::default(),
        }
    }

    #[test]
    fn lower_node_moves_down_with_its_subtree() {
        let mut l = layout(vec![
            node(0, Rect::new(0.0, 0.0, 200.0, 300.0), None, vec![1, 2]),
            node(1, Rect::new(0.0, 10.0, 100.0, 50.0), Some(0), vec![]),
            node(2, Rect::new(0.0, 40.0, 100.0, 50.0), Some(0), vec![3]),
            node(3, Rect::new(5.0, 45.0, 20.0, 20.0), Some(2), vec![]),
        ]);
        let before_child = l.nodes[3].rect.y;

        let report = resolve_overlaps(&mut l, &options(), 0.1);
        assert_eq!(report, OverlapReport { corrections: 1, remaining: 0 });

        let a = l.nodes[1].rect;
        let b = l.nodes[2].rect;
        assert!(b.y >= a.y + a.h + 4.0);
        assert_eq!(b.y, 64.0);
        assert_eq!(l.nodes[3].rect.y - before_child, 24.0);
        // Parent is untouched
        assert_eq!(l.nodes[0].rect.y, 0.0);
    }

    #[test]
    fn ancestors_and_hidden_nodes_are_ignored() {
        let mut l = layout(vec![
            node(0, Rect::new(0.0, 0.0, 200.0, 300.0), None, vec![1, 2]),
            node(1, Rect::new(0.0, 10.0, 100.0, 50.0), Some(0), vec![]),
            node(2, Rect::new(0.0, 40.0, 100.0, 50.0), Some(0), vec![]),
        ]);
        l.nodes[2].mode = RenderMode::None;
        assert!(find_overlaps(&l, 0.1).is_empty());
        let report = resolve_overlaps(&mut l, &options(), 0.1);
        assert_eq!(report.corrections, 0);
        assert_eq!(l.nodes[2].rect.y, 40.0);
    }

    #[test]
    fn float_noise_is_not_an_overlap() {
        let mut l = layout(vec![
            node(0, Rect::new(0.0, 0.0, 200.0, 300.0), None, vec![1, 2]),
            node(1, Rect::new(0.0, 0.0, 100.0, 50.0), Some(0), vec![]),
            node(2, Rect::new(0.0, 49.9995, 100.0, 50.0), Some(0), vec![]),
        ]);
        assert_eq!(resolve_overlaps(&mut l, &options(), 0.1).corrections, 0);
    }

    #[test]
    fn corrections_cascade_downwards() {
        let mut l = layout(vec![
            node(0, Rect::new(0.0, 0.0, 300.0, 400.0), None, vec![1, 2, 3]),
            node(1, Rect::new(0.0, 0.0, 100.0, 100.0), Some(0), vec![]),
            node(2, Rect::new(0.0, 50.0, 100.0, 100.0), Some(0), vec![]),
            node(3, Rect::new(0.0, 90.0, 100.0, 100.0), Some(0), vec![]),
        ]);
        let report = resolve_overlaps(&mut l, &options(), 0.1);
        assert_eq!(report, OverlapReport { corrections: 3, remaining: 0 });
        assert_eq!(l.nodes[2].rect.y, 104.0);
        // Pushed below 1 first, then below 2: taller than a fresh packing would be
        assert_eq!(l.nodes[3].rect.y, 208.0);
        assert!(find_overlaps(&l, 0.1).is_empty());
    }

    #[test]
    fn flush_wide_siblings_are_left_alone() {
        let top = Rect::new(3.48, 30.29, 2018.73, 100.0);
        let below = Rect::new(3.48, top.bottom() - 1.2e-4, 2018.73, 100.0);
        // Float error alone gives a shared area above the epsilon
        assert!(top.intersection_area(&below) > 0.1);

        let mut l = layout(vec![
            node(0, Rect::new(0.0, 0.0, 2030.0, 260.0), None, vec![1, 2]),
            node(1, top, Some(0), vec![]),
            node(2, below, Some(0), vec![3]),
            node(3, Rect::new(10.0, below.y + 30.0, 50.0, 50.0), Some(2), vec![]),
        ]);
        let report = resolve_overlaps(&mut l, &options(), 0.1);
        assert_eq!(report, OverlapReport { corrections: 0, remaining: 0 });
        assert_eq!(l.nodes[2].rect, below);
        assert!(find_overlaps(&l, 0.1).is_empty());
    }

    #[test]
    fn move_out_of_parent_is_refused_and_reported() {
        // Parent content ends at 116; clearing node 1 would put node 2 at 78..128
        let mut l = layout(vec![
            node(0, Rect::new(0.0, 0.0, 200.0, 120.0), None, vec![1, 2]),
            node(1, Rect::new(4.0, 24.0, 100.0, 50.0), Some(0), vec![]),
            node(2, Rect::new(4.0, 60.0, 100.0, 50.0), Some(0), vec![]),
        ]);
        let report = resolve_overlaps(&mut l, &options(), 0.1);
        assert_eq!(report, OverlapReport { corrections: 0, remaining: 1 });
        assert_eq!(l.nodes[2].rect.y, 60.0);
        let content = l.content_rect(0, &options());
        assert!(content.contains(&l.nodes[2].rect, 0.01));
    }
}
