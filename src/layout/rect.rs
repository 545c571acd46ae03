/// Axis-aligned rectangle. Used both for absolute layout coordinates and for
/// packer-local coordinates; which frame applies is up to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Overlap below this extent on either axis counts as touching.
const TOUCH_EPSILON: f32 = 1e-3;

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// NaN, infinite or non-positive extent.
    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite())
            || !(self.w > 0.0 && self.h > 0.0)
            || !(self.w.is_finite() && self.h.is_finite())
    }

    /// Area shared with `other` (0 when disjoint or touching).
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// True when the interiors intersect by more than float noise on both axes.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        w > TOUCH_EPSILON && h > TOUCH_EPSILON
    }

    /// `other` lies entirely inside `self`, allowing `tolerance` of drift on each edge.
    pub fn contains(&self, other: &Rect, tolerance: f32) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Pull the origin inside `bounds` and trim the extent so the result never
    /// spills past it. The result may have zero extent.
    pub fn clamp_within(&self, bounds: &Rect) -> Rect {
        let x = self.x.max(bounds.x).min(bounds.right());
        let y = self.y.max(bounds.y).min(bounds.bottom());
        let w = self.w.min(bounds.right() - x).max(0.0);
        let h = self.h.min(bounds.bottom() - y).max(0.0);
        Rect::new(x, y, w, h)
    }
}
