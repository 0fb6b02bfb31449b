//! Property tests: regions on a plane never overlap, whatever the
//! sequence of clears and draws.

use discnav_overlay::{OverlayCompositor, OverlayImage, Plane, Rect};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Clear(Plane, Rect),
    Draw(Plane, Rect),
}

fn arb_plane() -> impl Strategy<Value = Plane> {
    prop_oneof![Just(Plane::Presentation), Just(Plane::Interactive)]
}

fn arb_rect() -> impl Strategy<Value = Rect> {
    (0u32..64, 0u32..64, 1u32..32, 1u32..32).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_plane(), arb_rect()).prop_map(|(p, r)| Op::Clear(p, r)),
        (arb_plane(), arb_rect()).prop_map(|(p, r)| Op::Draw(p, r)),
    ]
}

fn apply(c: &mut OverlayCompositor, op: &Op, color: u32) {
    match op {
        Op::Clear(plane, rect) => c.clear(*plane, *rect),
        Op::Draw(plane, rect) => c
            .draw(
                *plane,
                *rect,
                OverlayImage::Argb(vec![color; rect.area() as usize]),
            )
            .unwrap(),
    }
}

fn assert_disjoint(c: &OverlayCompositor) -> Result<(), TestCaseError> {
    for plane in Plane::ALL {
        let regions = c.regions(plane);
        for (i, a) in regions.iter().enumerate() {
            prop_assert!(!a.rect.is_empty());
            prop_assert_eq!(a.to_argb().len(), a.rect.area() as usize);
            for b in &regions[i + 1..] {
                prop_assert!(
                    !a.rect.intersects(&b.rect),
                    "{} overlaps {} on {:?}",
                    a.rect,
                    b.rect,
                    plane
                );
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn regions_stay_disjoint(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut c = OverlayCompositor::new();
        for (i, op) in ops.iter().enumerate() {
            apply(&mut c, op, i as u32);
            assert_disjoint(&c)?;
        }
    }

    /// The most recent draw is always fully visible.
    #[test]
    fn last_draw_is_intact(ops in prop::collection::vec(arb_op(), 0..20), last in arb_rect()) {
        let mut c = OverlayCompositor::new();
        for (i, op) in ops.iter().enumerate() {
            apply(&mut c, op, i as u32);
        }
        apply(&mut c, &Op::Draw(Plane::Interactive, last), 0xDEAD_BEEF);

        let regions = c.regions(Plane::Interactive);
        let top = regions.last().unwrap();
        prop_assert_eq!(top.rect, last);
        let covered: u64 = regions
            .iter()
            .filter_map(|r| r.rect.intersection(&last))
            .map(|r| r.area())
            .sum();
        prop_assert_eq!(covered, last.area());
    }

    #[test]
    fn clear_removes_covered_area(ops in prop::collection::vec(arb_op(), 0..20), cut in arb_rect()) {
        let mut c = OverlayCompositor::new();
        for (i, op) in ops.iter().enumerate() {
            apply(&mut c, op, i as u32);
        }
        let area_before: u64 = c.regions(Plane::Presentation).iter().map(|r| r.rect.area()).sum();
        let overlap: u64 = c
            .regions(Plane::Presentation)
            .iter()
            .filter_map(|r| r.rect.intersection(&cut))
            .map(|r| r.area())
            .sum();

        c.clear(Plane::Presentation, cut);

        let area_after: u64 = c.regions(Plane::Presentation).iter().map(|r| r.rect.area()).sum();
        prop_assert_eq!(area_after, area_before - overlap);
        for r in c.regions(Plane::Presentation) {
            prop_assert!(!r.rect.intersects(&cut));
        }
    }
}
