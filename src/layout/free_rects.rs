use super::config::Heuristics;
use super::rect::Rect;

/// Empty regions inside one container's content area, in the packer's local frame.
///
/// Members never overlap each other after a cleanup pass. Merges are conservative:
/// a coalesced rectangle only replaces its parts when it overlaps neither an
/// occupied region nor another free rectangle.
#[derive(Debug, Clone, Default)]
pub struct FreeRectangleSet {
    rects: Vec<Rect>,
}

impl FreeRectangleSet {
    /// A set holding one rectangle spanning `w` x `h` at the origin.
    pub fn new(w: f32, h: f32) -> Self {
        let mut set = Self::default();
        set.init(w, h);
        set
    }

    /// Reset to a single rectangle at the origin. Non-positive sizes leave the set empty.
    pub fn init(&mut self, w: f32, h: f32) {
        self.rects.clear();
        if w > 0.0 && h > 0.0 {
            self.rects.push(Rect::new(0.0, 0.0, w, h));
        }
    }

    pub fn as_slice(&self) -> &[Rect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn insert(&mut self, rect: Rect) {
        self.rects.push(rect);
    }

    pub fn remove(&mut self, index: usize) -> Rect {
        self.rects.remove(index)
    }

    /// Remove the first member equal to `rect`. Returns whether one was found.
    pub fn remove_rect(&mut self, rect: &Rect) -> bool {
        match self.rects.iter().position(|r| r == rect) {
            Some(index) => {
                self.rects.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn overlaps_any(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|r| r.overlaps(rect))
    }

    /// Drop members fully enclosed by another member. Of two identical members one survives.
    pub fn remove_contained(&mut self) -> usize {
        let n = self.rects.len();
        let mut keep = vec![true; n];
        for i in 0..n {
            for j in 0..n {
                if i == j || !keep[j] {
                    continue;
                }
                if self.rects[j].contains(&self.rects[i], 0.0) {
                    keep[i] = false;
                    break;
                }
            }
        }

        let before = self.rects.len();
        let mut flags = keep.into_iter();
        self.rects.retain(|_| flags.next().unwrap_or(true));
        before - self.rects.len()
    }

    /// Coalesce pairs sharing a full edge (same row band with touching x, or same
    /// column band with touching y), absorbing up to `merge_tolerance` of mismatch.
    /// Returns the number of merges performed.
    pub fn merge_adjacent(&mut self, heuristics: &Heuristics, occupied: &[Rect]) -> usize {
        let tol = heuristics.merge_tolerance;
        self.merge_until_stable(heuristics.merge_iteration_cap, occupied, |a, b| {
            edge_merge(a, b, tol)
        })
    }

    /// Looser second pass: collapse vertically stacked slivers that share most of
    /// their width, across gaps up to `aggressive_merge_tolerance`.
    pub fn aggressive_vertical_merge(&mut self, heuristics: &Heuristics, occupied: &[Rect]) -> usize {
        let tol = heuristics.aggressive_merge_tolerance;
        let overlap = heuristics.aggressive_width_overlap;
        let sliver = heuristics.sliver_height;
        self.merge_until_stable(heuristics.merge_iteration_cap, occupied, |a, b| {
            sliver_merge(a, b, tol, overlap, sliver)
        })
    }

    fn merge_until_stable(
        &mut self,
        cap: usize,
        occupied: &[Rect],
        merge: impl Fn(&Rect, &Rect) -> Option<Rect>,
    ) -> usize {
        let mut merges = 0;
        while merges < cap {
            let Some((i, j, merged)) = self.find_merge(occupied, &merge) else {
                break;
            };
            // j > i, so removing j first keeps i valid
            self.rects.remove(j);
            self.rects[i] = merged;
            self.remove_contained();
            merges += 1;
        }
        merges
    }

    fn find_merge(
        &self,
        occupied: &[Rect],
        merge: &impl Fn(&Rect, &Rect) -> Option<Rect>,
    ) -> Option<(usize, usize, Rect)> {
        for i in 0..self.rects.len() {
            for j in (i + 1)..self.rects.len() {
                let (a, b) = (&self.rects[i], &self.rects[j]);
                let Some(merged) = merge(a, b) else {
                    continue;
                };
                if merged.area() <= a.area().max(b.area()) {
                    continue;
                }
                if occupied.iter().any(|o| o.overlaps(&merged)) {
                    continue;
                }
                let collides = self.rects.iter().enumerate().any(|(k, r)| {
                    k != i && k != j && r.overlaps(&merged) && !merged.contains(r, 0.0)
                });
                if collides {
                    continue;
                }
                return Some((i, j, merged));
            }
        }
        None
    }
}

/// Merge two rectangles sharing an edge. The result is trimmed to the band both
/// cover so it never claims space outside the pair (beyond the absorbed gap).
fn edge_merge(a: &Rect, b: &Rect, tol: f32) -> Option<Rect> {
    if (a.y - b.y).abs() <= tol && (a.h - b.h).abs() <= tol {
        let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
        let gap = right.x - left.right();
        if gap.abs() <= tol {
            let y = left.y.max(right.y);
            let bottom = left.bottom().min(right.bottom());
            let far = left.right().max(right.right());
            return Some(Rect::new(left.x, y, far - left.x, bottom - y));
        }
    }

    if (a.x - b.x).abs() <= tol && (a.w - b.w).abs() <= tol {
        let (top, below) = if a.y <= b.y { (a, b) } else { (b, a) };
        let gap = below.y - top.bottom();
        if gap.abs() <= tol {
            let x = top.x.max(below.x);
            let right = top.right().min(below.right());
            let bottom = top.bottom().max(below.bottom());
            return Some(Rect::new(x, top.y, right - x, bottom - top.y));
        }
    }

    None
}

fn sliver_merge(a: &Rect, b: &Rect, tol: f32, min_overlap: f32, sliver: f32) -> Option<Rect> {
    if a.h.min(b.h) > sliver {
        return None;
    }

    let (top, below) = if a.y <= b.y { (a, b) } else { (b, a) };
    let gap = below.y - top.bottom();
    if gap < -tol || gap > tol {
        return None;
    }

    let x = top.x.max(below.x);
    let right = top.right().min(below.right());
    let shared = right - x;
    if shared <= 0.0 || shared < min_overlap * top.w.max(below.w) {
        return None;
    }

    Some(Rect::new(x, top.y, shared, below.bottom() - top.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlapping_pairs(set: &FreeRectangleSet) -> usize {
        let rects = set.as_slice();
        let mut count = 0;
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                if rects[i].overlaps(&rects[j]) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn init_seeds_one_rect() {
        let set = FreeRectangleSet::new(200.0, 100.0);
        assert_eq!(set.as_slice(), &[Rect::new(0.0, 0.0, 200.0, 100.0)]);
        assert!(FreeRectangleSet::new(0.0, 100.0).is_empty());
    }

    #[test]
    fn removes_enclosed_and_duplicates() {
        let mut set = FreeRectangleSet::new(100.0, 100.0);
        set.insert(Rect::new(10.0, 10.0, 20.0, 20.0));
        set.insert(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(set.remove_contained(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn merges_side_by_side_across_padding_gap() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(0.0, 50.0, 40.0, 30.0));
        set.insert(Rect::new(42.0, 50.0, 60.0, 30.0));
        let merged = set.merge_adjacent(&Heuristics::default(), &[]);
        assert_eq!(merged, 1);
        assert_eq!(set.as_slice(), &[Rect::new(0.0, 50.0, 102.0, 30.0)]);
    }

    #[test]
    fn merges_stacked_column() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(10.0, 0.0, 50.0, 20.0));
        set.insert(Rect::new(10.0, 21.0, 50.0, 40.0));
        set.merge_adjacent(&Heuristics::default(), &[]);
        assert_eq!(set.as_slice(), &[Rect::new(10.0, 0.0, 50.0, 61.0)]);
    }

    #[test]
    fn merge_refuses_to_cover_occupied_space() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(0.0, 0.0, 40.0, 30.0));
        set.insert(Rect::new(43.0, 0.0, 40.0, 30.0));
        let occupied = [Rect::new(40.0, 0.0, 3.0, 30.0)];
        assert_eq!(set.merge_adjacent(&Heuristics::default(), &occupied), 0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn distant_rects_stay_separate() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(0.0, 0.0, 40.0, 30.0));
        set.insert(Rect::new(60.0, 0.0, 40.0, 30.0));
        assert_eq!(set.merge_adjacent(&Heuristics::default(), &[]), 0);
    }

    #[test]
    fn collapses_stacked_slivers() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(0.0, 0.0, 100.0, 5.0));
        set.insert(Rect::new(4.0, 10.0, 90.0, 6.0));
        let h = Heuristics::default();
        // Widths differ by more than the strict tolerance
        assert_eq!(set.merge_adjacent(&h, &[]), 0);
        assert_eq!(set.aggressive_vertical_merge(&h, &[]), 1);
        assert_eq!(set.as_slice(), &[Rect::new(4.0, 0.0, 90.0, 16.0)]);
        assert_eq!(overlapping_pairs(&set), 0);
    }

    #[test]
    fn tall_blocks_are_not_slivers() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(0.0, 0.0, 100.0, 40.0));
        set.insert(Rect::new(5.0, 45.0, 90.0, 60.0));
        assert_eq!(set.aggressive_vertical_merge(&Heuristics::default(), &[]), 0);
    }

    #[test]
    fn merge_never_creates_overlap() {
        let mut set = FreeRectangleSet::default();
        set.insert(Rect::new(0.0, 0.0, 50.0, 20.0));
        set.insert(Rect::new(52.0, 0.0, 50.0, 20.0));
        // Narrow column in the gap, reaching below the pair
        set.insert(Rect::new(50.0, 10.0, 2.0, 30.0));
        assert_eq!(overlapping_pairs(&set), 0);
        assert_eq!(set.merge_adjacent(&Heuristics::default(), &[]), 0);
        assert_eq!(set.len(), 3);
        assert_eq!(overlapping_pairs(&set), 0);
    }
}
