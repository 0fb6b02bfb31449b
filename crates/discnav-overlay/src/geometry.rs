//! Axis-aligned rectangles and rectangle set-difference.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in plane coordinates. `x`/`y` are the top-left
/// corner; the right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn from_edges(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Overlapping area of two rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x1 < x2 && y1 < y2 {
            Some(Rect::from_edges(x1, y1, x2, y2))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Whether `other` lies completely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// `self − cut` as up to four disjoint strips.
    ///
    /// The strips are emitted in top, bottom, left, right order. Top and
    /// bottom span the full width of `self`; left and right only span the
    /// rows covered by the cut. Returns `self` unchanged when the two do not
    /// overlap and an empty list when `cut` covers `self`.
    pub fn subtract(&self, cut: &Rect) -> Vec<Rect> {
        let Some(inner) = self.intersection(cut) else {
            return vec![*self];
        };

        [
            Rect::from_edges(self.x, self.y, self.right(), inner.y),
            Rect::from_edges(self.x, inner.bottom(), self.right(), self.bottom()),
            Rect::from_edges(self.x, inner.y, inner.x, inner.bottom()),
            Rect::from_edges(inner.right(), inner.y, self.right(), inner.bottom()),
        ]
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_subtract_keeps_original() {
        let r = Rect::new(0, 0, 10, 10);
        assert_eq!(r.subtract(&Rect::new(20, 20, 5, 5)), vec![r]);
        // Touching edges do not overlap.
        assert_eq!(r.subtract(&Rect::new(10, 0, 5, 10)), vec![r]);
    }

    #[test]
    fn test_full_cover_yields_nothing() {
        let r = Rect::new(5, 5, 10, 10);
        assert!(r.subtract(&r).is_empty());
        assert!(r.subtract(&Rect::new(0, 0, 100, 100)).is_empty());
    }

    #[test]
    fn test_center_cut_yields_four_strips() {
        let r = Rect::new(0, 0, 10, 10);
        let strips = r.subtract(&Rect::new(3, 4, 2, 2));

        assert_eq!(
            strips,
            vec![
                Rect::new(0, 0, 10, 4), // top
                Rect::new(0, 6, 10, 4), // bottom
                Rect::new(0, 4, 3, 2),  // left
                Rect::new(5, 4, 5, 2),  // right
            ]
        );
        let remaining: u64 = strips.iter().map(Rect::area).sum();
        assert_eq!(remaining, 100 - 4);
    }

    #[test]
    fn test_edge_cut_drops_empty_strips() {
        let r = Rect::new(0, 0, 10, 10);
        // Cut the left half: only the right strip survives.
        assert_eq!(
            r.subtract(&Rect::new(0, 0, 5, 10)),
            vec![Rect::new(5, 0, 5, 10)]
        );
        // Cut across the middle rows: top and bottom survive.
        assert_eq!(
            r.subtract(&Rect::new(0, 3, 10, 2)),
            vec![Rect::new(0, 0, 10, 3), Rect::new(0, 5, 10, 5)]
        );
    }

    #[test]
    fn test_strips_are_pairwise_disjoint_and_avoid_cut() {
        let r = Rect::new(2, 2, 20, 12);
        let cut = Rect::new(8, 0, 4, 30);
        let strips = r.subtract(&cut);

        for (i, a) in strips.iter().enumerate() {
            assert!(!a.intersects(&cut));
            assert!(r.contains(a));
            for b in &strips[i + 1..] {
                assert!(!a.intersects(b), "{a} overlaps {b}");
            }
        }
    }
}
