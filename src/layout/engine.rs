use std::collections::HashMap;

use super::config::{Heuristics, LayoutOptions};
use super::packer::{GuillotinePacker, Packer, Placement};
use super::rect::Rect;
use super::{LayoutNode, RenderMode};
use crate::tree::aggregate::descendant_count;
use crate::tree::arena::{NodeId, Tree};

/// Area inside a container left for its children: below the header band, inset by padding.
pub fn content_area(rect: &Rect, options: &LayoutOptions) -> Rect {
    let header = options.header_height.min(rect.h).max(0.0);
    let pad = options.padding;
    Rect::new(
        rect.x + pad,
        rect.y + header + pad,
        rect.w - 2.0 * pad,
        rect.h - header - 2.0 * pad,
    )
}

/// Size a child should ask the packer for inside a `content_w` x `content_h` area.
///
/// Containers get a near-square share of the area proportional to their weight,
/// snapped to the full width/height when close to it. Leaves get the preferred
/// size, enlarged a little when they have few siblings.
pub fn child_target_size(
    weight: u64,
    total_weight: u64,
    is_container: bool,
    sibling_count: usize,
    content_w: f32,
    content_h: f32,
    options: &LayoutOptions,
    heuristics: &Heuristics,
) -> (f32, f32) {
    let (mut w, mut h, min_w, min_h) = if is_container {
        let share = weight.max(1) as f64 / total_weight.max(1) as f64;
        let area = (share * content_w as f64 * content_h as f64) as f32;
        let side = area.sqrt();
        let (mut w, mut h) = (side, side);
        if w > content_w {
            w = content_w;
            h = area / content_w;
        }
        if h > content_h {
            h = content_h;
            w = (area / content_h).min(content_w);
        }

        // Avoid leaving a sliver beside or below a nearly full-size child
        let snap = 1.0 - heuristics.snap_fraction;
        if w >= content_w * snap {
            w = content_w;
        }
        if h >= content_h * snap {
            h = content_h;
        }

        let (min_w, min_h) = options.min_container_size();
        (w, h, min_w, min_h)
    } else {
        let scale = if sibling_count <= heuristics.few_siblings {
            heuristics.few_siblings_expansion
        } else {
            1.0
        };
        (
            options.leaf_pref_width * scale,
            options.leaf_pref_height * scale,
            options.leaf_min_width,
            options.leaf_min_height,
        )
    };

    w = w.max(min_w).min(content_w);
    h = h.max(min_h).min(content_h);
    (w, h)
}

/// Final size of a leaf inside its allocation: the preferred size, grown into
/// slack (width first, then height) within the expansion caps and aspect range,
/// then clamped to the minimums and to the allocation.
pub fn leaf_rect(alloc: &Rect, options: &LayoutOptions, heuristics: &Heuristics) -> Rect {
    let mut w = options.leaf_pref_width;
    let mut h = options.leaf_pref_height;

    if alloc.w > w {
        let cap = w * heuristics.leaf_width_expansion;
        w = alloc.w.min(cap).min(h * options.leaf_max_aspect_ratio).max(w);
    }
    if alloc.h > h {
        let cap = h * heuristics.leaf_height_expansion;
        h = alloc.h.min(cap).min(w / options.leaf_min_aspect_ratio).max(h);
    }

    w = w.max(options.leaf_min_width).min(alloc.w);
    h = h.max(options.leaf_min_height).min(alloc.h);
    Rect::new(alloc.x, alloc.y, w, h)
}

/// Placement of last resort when the strict packer refuses an item.
///
/// Scans the free rectangles directly without the inter-item padding reserve,
/// shrinks the request to each candidate, grows it along the axis with more
/// slack (inside the aspect range), and scores by position plus an aspect
/// penalty. The winner is consumed through `split_rectangle` + `mark_used`.
pub fn adaptive_fallback(
    packer: &mut impl Packer,
    id: usize,
    w: f32,
    h: f32,
    min_size: (f32, f32),
    options: &LayoutOptions,
    heuristics: &Heuristics,
) -> Option<Placement> {
    let (min_w, min_h) = min_size;
    let mut best: Option<(Rect, Rect, f32)> = None;

    for free in packer.free_rectangles() {
        if free.w < min_w || free.h < min_h {
            continue;
        }

        let mut cw = w.min(free.w);
        let mut ch = h.min(free.h);
        let slack_w = free.w - cw;
        let slack_h = free.h - ch;
        if slack_w > slack_h {
            cw = free.w.min(ch * options.leaf_max_aspect_ratio).max(cw);
        } else if slack_h > 0.0 {
            ch = free.h.min(cw / options.leaf_min_aspect_ratio).max(ch);
        }

        let aspect_penalty = heuristics.fallback_aspect_penalty * (cw / ch).ln().abs();
        let score = heuristics.placement_score(free.x, free.y, free.area() - cw * ch) + aspect_penalty;
        if best.as_ref().map_or(true, |(_, _, s)| score < *s) {
            best = Some((*free, Rect::new(free.x, free.y, cw, ch), score));
        }
    }

    let (free, used, _) = best?;
    packer.split_rectangle(free, used);
    packer.mark_used(id, used);
    tracing::debug!(
        "Fallback placed item {} at {:.1},{:.1} as {:.1}x{:.1} (asked {:.1}x{:.1})",
        id,
        used.x,
        used.y,
        used.w,
        used.h,
        w,
        h
    );

    Some(Placement {
        x: used.x,
        y: used.y,
        w: used.w,
        h: used.h,
        fits: true,
    })
}

/// Hand back space a child did not use.
///
/// `allocated` is the child's packer-local allocation and `actual_w`/`actual_h`
/// its laid-out size. The packed item is shrunk to the actual size first; then a
/// piece to the right (width shrank) and/or below (height shrank) is offered to
/// the packer, which refuses anything overlapping a packed item or existing free
/// space. Shrinks under `reclaim_fraction` of the leaf minimum are ignored.
///
/// Pieces sit flush against the shrunk item with no padding gap, so a sibling
/// placed into one may touch it exactly. The overlap pass treats touching as
/// disjoint.
pub fn reclaim_space(
    packer: &mut impl Packer,
    id: usize,
    allocated: Rect,
    actual_w: f32,
    actual_h: f32,
    options: &LayoutOptions,
    heuristics: &Heuristics,
) -> Vec<Rect> {
    packer.resize_item(id, actual_w, actual_h);

    let dw = allocated.w - actual_w;
    let dh = allocated.h - actual_h;
    let shrank_w = dw >= heuristics.reclaim_fraction * options.leaf_min_width;
    let shrank_h = dh >= heuristics.reclaim_fraction * options.leaf_min_height;

    let mut pieces = Vec::with_capacity(2);
    if shrank_w {
        pieces.push(Rect::new(allocated.x + actual_w, allocated.y, dw, allocated.h));
    }
    if shrank_h {
        let below_w = if shrank_w { actual_w } else { allocated.w };
        pieces.push(Rect::new(allocated.x, allocated.y + actual_h, below_w, dh));
    }

    let mut reclaimed = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if packer.add_free_rectangle(piece) {
            reclaimed.push(piece);
        } else {
            tracing::debug!("Reclaim of {:?} for item {} refused (overlap)", piece, id);
        }
    }
    reclaimed
}

/// Recursive driver. Builds `LayoutNode`s in pre-order; each container owns
/// one packer for the duration of its own call.
pub struct LayoutEngine<'a> {
    tree: &'a Tree,
    options: &'a LayoutOptions,
    heuristics: &'a Heuristics,
    nodes: Vec<LayoutNode>,
    node_to_index: HashMap<NodeId, usize>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(tree: &'a Tree, options: &'a LayoutOptions, heuristics: &'a Heuristics) -> Self {
        Self {
            tree,
            options,
            heuristics,
            nodes: Vec::with_capacity(tree.len()),
            node_to_index: HashMap::with_capacity(tree.len()),
        }
    }

    /// Lay out the subtree at `root` inside `viewport`.
    pub fn run(mut self, root: NodeId, viewport: Rect) -> (Vec<LayoutNode>, HashMap<NodeId, usize>) {
        self.layout_node(root, viewport, 0, None);
        (self.nodes, self.node_to_index)
    }

    fn layout_node(
        &mut self,
        id: NodeId,
        alloc: Rect,
        depth: u16,
        parent: Option<usize>,
    ) -> usize {
        let tree = self.tree;
        let node = tree.get(id);
        let index = self.nodes.len();
        self.nodes.push(LayoutNode {
            node: id,
            rect: alloc,
            depth,
            parent,
            children: Vec::new(),
            mode: RenderMode::Box,
            is_container: !node.is_leaf(),
            hidden_children: 0,
            hidden_descendants: 0,
        });
        self.node_to_index.insert(id, index);

        if alloc.is_degenerate() {
            tracing::warn!(
                "Degenerate allocation {:?} for '{}' (depth {}), using minimum leaf size",
                alloc,
                tree.display_name(id),
                depth
            );
            let (x, y) = if alloc.x.is_finite() && alloc.y.is_finite() {
                (alloc.x, alloc.y)
            } else {
                (0.0, 0.0)
            };
            self.nodes[index].rect = Rect::new(x, y, self.options.leaf_min_width, self.options.leaf_min_height);
            self.nodes[index].mode = RenderMode::Box;
            self.hide_all_children(index, id);
            return index;
        }

        if node.is_leaf() {
            let rect = leaf_rect(&alloc, self.options, self.heuristics);
            self.nodes[index].rect = rect;
            self.nodes[index].mode = self.leaf_mode(&rect);
        } else {
            self.layout_container(index, id, alloc, depth);
        }
        index
    }

    fn layout_container(&mut self, index: usize, id: NodeId, alloc: Rect, depth: u16) {
        let tree = self.tree;
        let options = self.options;
        let heuristics = self.heuristics;

        let (min_w, min_h) = options.min_container_size();
        if depth >= heuristics.max_depth || alloc.w < min_w || alloc.h < min_h {
            tracing::debug!(
                "Container '{}' too small or too deep ({:.1}x{:.1} at depth {}), rendering as box",
                tree.display_name(id),
                alloc.w,
                alloc.h,
                depth
            );
            self.nodes[index].mode = RenderMode::Box;
            self.hide_all_children(index, id);
            return;
        }

        let header = options.header_height.min(alloc.h);
        let content = content_area(&alloc, options);
        if content.w <= 0.0 || content.h <= 0.0 {
            self.nodes[index].mode = RenderMode::Box;
            self.hide_all_children(index, id);
            return;
        }

        let children: Vec<NodeId> = tree.children(id).collect();
        let total_weight: u64 = children.iter().map(|&c| tree.get(c).weight.max(1)).sum();

        // (source position, child, target size)
        let mut order: Vec<(usize, NodeId, f32, f32)> = children
            .iter()
            .enumerate()
            .map(|(pos, &child)| {
                let child_node = tree.get(child);
                let (w, h) = child_target_size(
                    child_node.weight,
                    total_weight,
                    !child_node.is_leaf(),
                    children.len(),
                    content.w,
                    content.h,
                    options,
                    heuristics,
                );
                (pos, child, w, h)
            })
            .collect();
        // Largest first; the sort is stable so equal areas keep input order
        order.sort_by(|a, b| (b.2 * b.3).total_cmp(&(a.2 * a.3)));

        let mut packer = GuillotinePacker::new(content.w, content.h, options.padding, heuristics);
        let mut placed: Vec<(usize, usize)> = Vec::with_capacity(order.len());
        let mut hidden_children = 0u32;
        let mut hidden_descendants = 0u32;
        let mut reach = 0.0f32;

        for (pos, child, w, h) in order {
            let is_container = !tree.get(child).is_leaf();
            let mut placement = packer.place(pos, w, h);
            if !placement.fits {
                let min_size = if is_container {
                    options.min_container_size()
                } else {
                    (options.leaf_min_width, options.leaf_min_height)
                };
                match adaptive_fallback(&mut packer, pos, w, h, min_size, options, heuristics) {
                    Some(p) => placement = p,
                    None => {
                        hidden_children += 1;
                        hidden_descendants += 1 + descendant_count(tree, child);
                        continue;
                    }
                }
            }

            // Clamp float drift so children never leave the content area
            let allocated = placement.rect().translate(content.x, content.y).clamp_within(&content);
            if allocated.w <= 0.0 || allocated.h <= 0.0 {
                hidden_children += 1;
                hidden_descendants += 1 + descendant_count(tree, child);
                continue;
            }

            let child_index = self.layout_node(child, allocated, depth + 1, Some(index));
            let actual = self.nodes[child_index].rect;

            reclaim_space(
                &mut packer,
                pos,
                allocated.translate(-content.x, -content.y),
                actual.w,
                actual.h,
                options,
                heuristics,
            );

            reach = reach.max(actual.bottom() - content.y);
            placed.push((pos, child_index));
        }

        placed.sort_by_key(|&(pos, _)| pos);
        let child_indices: Vec<usize> = placed.iter().map(|&(_, i)| i).collect();
        let nested_hidden: u32 = child_indices.iter().map(|&i| self.nodes[i].hidden_descendants).sum();

        tracing::debug!(
            "Packed {}/{} children of '{}' into {:.0}x{:.0} (reach {:.1}, {} free rects left)",
            child_indices.len(),
            children.len(),
            tree.display_name(id),
            content.w,
            content.h,
            reach,
            packer.free_rectangles().len()
        );

        let rect = if child_indices.is_empty() {
            alloc
        } else {
            // Measured from what children reached, not the packer's bookkeeping
            let height = (header + options.padding + reach + options.padding).min(alloc.h);
            Rect::new(alloc.x, alloc.y, alloc.w, height)
        };

        let mode = if child_indices.is_empty() {
            RenderMode::Box
        } else {
            self.container_mode(&rect, header)
        };

        let entry = &mut self.nodes[index];
        entry.rect = rect;
        entry.mode = mode;
        entry.children = child_indices;
        entry.hidden_children = hidden_children;
        entry.hidden_descendants = hidden_descendants + nested_hidden;
    }

    fn hide_all_children(&mut self, index: usize, id: NodeId) {
        let entry = &mut self.nodes[index];
        entry.hidden_children = self.tree.children(id).count() as u32;
        entry.hidden_descendants = descendant_count(self.tree, id);
    }

    /// Label only when the leaf reached its minimum size; clamping to a tight
    /// allocation can leave it smaller.
    fn leaf_mode(&self, rect: &Rect) -> RenderMode {
        let min_visible = self.heuristics.min_visible_extent;
        if rect.w < min_visible || rect.h < min_visible {
            RenderMode::None
        } else if rect.w >= self.options.leaf_min_width && rect.h >= self.options.leaf_min_height {
            RenderMode::Text
        } else {
            RenderMode::Box
        }
    }

    fn container_mode(&self, rect: &Rect, header: f32) -> RenderMode {
        let min_visible = self.heuristics.min_visible_extent;
        if rect.w < min_visible || rect.h < min_visible {
            RenderMode::None
        } else if rect.w >= self.options.leaf_min_width && header >= min_visible {
            RenderMode::Text
        } else {
            RenderMode::Box
        }
    }
}
