use super::config::Heuristics;
use super::free_rects::FreeRectangleSet;
use super::rect::Rect;

/// Result of a placement request, in packer-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// False when no free rectangle could take the item; the position is then meaningless.
    pub fits: bool,
}

impl Placement {
    fn miss(w: f32, h: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w,
            h,
            fits: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// An item already placed by a packer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedItem {
    pub id: usize,
    pub rect: Rect,
}

/// 2D packing over a container's content area.
///
/// The accessors expose the free and occupied regions so callers can run their
/// own placement strategy (`split_rectangle` + `mark_used`) or hand back space
/// (`add_free_rectangle`) without reaching into the implementation.
pub trait Packer {
    /// Place a `w` x `h` item using the packer's own strategy.
    fn place(&mut self, id: usize, w: f32, h: f32) -> Placement;
    /// Register an empty region. Refused (false) when it overlaps a packed item
    /// or an existing free rectangle, or is too small to matter.
    fn add_free_rectangle(&mut self, rect: Rect) -> bool;
    /// Consume `free` for `used` (placed at its top-left) and register the leftovers.
    fn split_rectangle(&mut self, free: Rect, used: Rect);
    /// Record a placed item.
    fn mark_used(&mut self, id: usize, rect: Rect);
    /// Shrink or grow a packed item in place, keeping its origin.
    fn resize_item(&mut self, id: usize, w: f32, h: f32) -> bool;
    fn free_rectangles(&self) -> &[Rect];
    fn packed_items(&self) -> &[PackedItem];
    /// Bounding box extent of everything placed.
    fn used_size(&self) -> (f32, f32);
}

/// Guillotine packer with a top-to-bottom, left-to-right placement bias.
///
/// Owned by one container's layout call and dropped when it returns.
pub struct GuillotinePacker<'a> {
    padding: f32,
    free: FreeRectangleSet,
    items: Vec<PackedItem>,
    used_w: f32,
    used_h: f32,
    heuristics: &'a Heuristics,
}

impl<'a> GuillotinePacker<'a> {
    pub fn new(width: f32, height: f32, padding: f32, heuristics: &'a Heuristics) -> Self {
        Self {
            padding,
            free: FreeRectangleSet::new(width, height),
            items: Vec::new(),
            used_w: 0.0,
            used_h: 0.0,
            heuristics,
        }
    }

    fn occupied(&self) -> Vec<Rect> {
        self.items.iter().map(|item| item.rect).collect()
    }

    fn big_enough(&self, rect: &Rect) -> bool {
        rect.w >= self.heuristics.min_free_extent && rect.h >= self.heuristics.min_free_extent
    }

    /// Remove enclosed members and run both merge passes.
    fn cleanup(&mut self, extra_occupied: Option<Rect>) {
        let mut occupied = self.occupied();
        occupied.extend(extra_occupied);
        self.free.remove_contained();
        self.free.merge_adjacent(self.heuristics, &occupied);
        self.free.aggressive_vertical_merge(self.heuristics, &occupied);
    }

    fn recompute_used(&mut self) {
        self.used_w = self.items.iter().map(|i| i.rect.right()).fold(0.0, f32::max);
        self.used_h = self.items.iter().map(|i| i.rect.bottom()).fold(0.0, f32::max);
    }
}

impl Packer for GuillotinePacker<'_> {
    fn place(&mut self, id: usize, w: f32, h: f32) -> Placement {
        if !(w > 0.0 && h > 0.0) {
            return Placement::miss(w, h);
        }

        let reserve = if self.items.is_empty() { 0.0 } else { self.padding };
        let mut best: Option<(usize, f32)> = None;
        for (index, free) in self.free.as_slice().iter().enumerate() {
            if free.w - reserve < w || free.h - reserve < h {
                continue;
            }
            let score = self
                .heuristics
                .placement_score(free.x, free.y, free.area() - w * h);
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((index, score));
            }
        }

        let Some((index, _)) = best else {
            tracing::trace!(
                "No free rectangle for {}x{} item {} ({} candidates)",
                w,
                h,
                id,
                self.free.len()
            );
            return Placement::miss(w, h);
        };

        let free = self.free.as_slice()[index];
        let used = Rect::new(free.x, free.y, w, h);
        self.split_rectangle(free, used);
        self.mark_used(id, used);

        Placement {
            x: used.x,
            y: used.y,
            w,
            h,
            fits: true,
        }
    }

    fn add_free_rectangle(&mut self, rect: Rect) -> bool {
        if rect.is_degenerate() || !self.big_enough(&rect) {
            return false;
        }
        if self.items.iter().any(|item| item.rect.overlaps(&rect)) || self.free.overlaps_any(&rect) {
            return false;
        }
        self.free.insert(rect);
        self.cleanup(None);
        true
    }

    fn split_rectangle(&mut self, free: Rect, used: Rect) {
        if !self.free.remove_rect(&free) {
            tracing::warn!("Split requested for unknown free rectangle {:?}", free);
            return;
        }

        let pad = self.padding;
        let right = Rect::new(
            used.right() + pad,
            free.y,
            free.right() - (used.right() + pad),
            free.h,
        );
        let has_right = self.big_enough(&right);

        // Full original width unless that would run under the right piece
        let bottom_w = if has_right {
            (used.right() + pad - free.x).min(free.w)
        } else {
            free.w
        };
        let bottom_y = used.bottom() + pad;
        let bottom = Rect::new(free.x, bottom_y, bottom_w, free.bottom() - bottom_y);

        if has_right {
            self.free.insert(right);
        }
        if self.big_enough(&bottom) {
            self.free.insert(bottom);
        }

        self.cleanup(Some(used));
    }

    fn mark_used(&mut self, id: usize, rect: Rect) {
        self.items.push(PackedItem { id, rect });
        self.used_w = self.used_w.max(rect.right());
        self.used_h = self.used_h.max(rect.bottom());
    }

    fn resize_item(&mut self, id: usize, w: f32, h: f32) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        item.rect.w = w;
        item.rect.h = h;
        self.recompute_used();
        true
    }

    fn free_rectangles(&self) -> &[Rect] {
        self.free.as_slice()
    }

    fn packed_items(&self) -> &[PackedItem] {
        &self.items
    }

    fn used_size(&self) -> (f32, f32) {
        (self.used_w, self.used_h)
    }
}
