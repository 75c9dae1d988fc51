//! Property-based tests for layout kernel invariants using the `proptest` crate.

use proptest::prelude::*;

use layout_kernel::geometry::hierarchy::ParallelogramNode;
use layout_kernel::{
    Composite, CubicBezier, Curve, EllipticArc, INTERSECTION_EPSILON, IntersectOptions, Point2d,
    Transform2d, Vec2, get_all_intersections, get_all_intersections_with,
};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary 2D coordinate pair in a layout-sized range.
fn arb_point() -> impl Strategy<Value = Point2d> {
    (-100.0f64..100.0, -100.0f64..100.0).prop_map(|(x, y)| Point2d::new(x, y))
}

fn arb_angle() -> impl Strategy<Value = f64> {
    -std::f64::consts::PI..std::f64::consts::PI
}

fn arb_radius() -> impl Strategy<Value = f64> {
    0.5f64..20.0
}

fn arb_bezier() -> impl Strategy<Value = CubicBezier> {
    (arb_point(), arb_point(), arb_point(), arb_point())
        .prop_map(|(a, b, c, d)| CubicBezier::new([a, b, c, d]))
}

fn arb_arc() -> impl Strategy<Value = EllipticArc> {
    (arb_point(), arb_radius(), 0.2f64..1.0, arb_angle(), 0.5f64..6.0).prop_map(
        |(center, r, squash, rot, span)| {
            let major = Vec2::from_angle(rot) * r;
            let minor = major.perp() * squash;
            EllipticArc::new(center, major, minor, rot, rot + span)
        },
    )
}

/// Open polyline of three to six well-separated points.
fn arb_polyline() -> impl Strategy<Value = Composite> {
    prop::collection::vec(arb_point(), 3..7).prop_filter_map("degenerate polyline", |pts| {
        let distinct = pts.windows(2).all(|w| w[0].distance_to(&w[1]) > 0.1);
        if distinct {
            Composite::polyline(&pts, false).ok()
        } else {
            None
        }
    })
}

fn arb_curve() -> impl Strategy<Value = Curve> {
    prop_oneof![
        (arb_point(), arb_point()).prop_map(|(a, b)| Curve::line(a, b)),
        arb_arc().prop_map(Curve::Arc),
        arb_bezier().prop_map(Curve::Bezier),
        arb_polyline().prop_map(Curve::Composite),
    ]
}

fn unit_fractions() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..1.0, 0.0f64..1.0).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

// ---------------------------------------------------------------------------
// 1. value(par_start) == start and value(par_end) == end
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn curve_endpoints_match_parameter_domain(c in arb_curve()) {
        prop_assert!(c.value(c.par_start()).distance_to(&c.start()) < 1e-9);
        prop_assert!(c.value(c.par_end()).distance_to(&c.end()) < 1e-9);
        prop_assert!(c.par_end() >= c.par_start());
    }
}

// ---------------------------------------------------------------------------
// 2. Trim round-trip: trimmed ends coincide with the original at a and b
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn trim_round_trip(c in arb_curve(), (fa, fb) in unit_fractions()) {
        let span = c.par_end() - c.par_start();
        let a = c.par_start() + fa * span;
        let b = c.par_start() + fb * span;
        if let Some(t) = c.trim(a, b) {
            prop_assert!(t.value(t.par_start()).distance_to(&c.value(a)) < 1e-6,
                "trimmed start {:?} vs {:?}", t.start(), c.value(a));
            prop_assert!(t.value(t.par_end()).distance_to(&c.value(b)) < 1e-6,
                "trimmed end {:?} vs {:?}", t.end(), c.value(b));
        } else {
            prop_assert!(c.length_between(a, b) < 1e-5);
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Bounding box contains sampled curve points
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn bounding_box_contains_samples(c in arb_curve()) {
        let bb = c.bounding_box().expanded(1e-9);
        for i in 0..=32 {
            let t = c.par_start() + (c.par_end() - c.par_start()) * i as f64 / 32.0;
            prop_assert!(bb.contains_point(&c.value(t)));
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Every parallelogram leaf bounds its piece of the curve
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn hierarchy_leaves_bound_curve(c in arb_curve()) {
        let tree: &ParallelogramNode = c.parallelogram_tree();
        for leaf in tree.leaves() {
            let piece = &c.pieces()[leaf.segment];
            for i in 0..=8 {
                let t = leaf.low + (leaf.high - leaf.low) * i as f64 / 8.0;
                prop_assert!(leaf.parallelogram.contains(&piece.value(t)));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Reverse traces the same points backwards
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn reverse_swaps_endpoints(c in arb_curve()) {
        let r = c.reverse();
        prop_assert!(r.start().distance_to(&c.end()) < 1e-9);
        prop_assert!(r.end().distance_to(&c.start()) < 1e-9);
        prop_assert!((r.length() - c.length()).abs() < 1e-6 * (1.0 + c.length()));
    }
}

// ---------------------------------------------------------------------------
// 6. Closest parameter beats every sample
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn closest_parameter_is_closest(c in arb_curve(), p in arb_point()) {
        let best = c.closest_point(&p).distance_to(&p);
        for i in 0..=64 {
            let t = c.par_start() + (c.par_end() - c.par_start()) * i as f64 / 64.0;
            prop_assert!(best <= c.value(t).distance_to(&p) + 1e-6);
        }
    }
}

// ---------------------------------------------------------------------------
// 7. Translation moves values and invalidates cached bounds
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn translate_moves_everything(c in arb_curve(), d in arb_point()) {
        let delta = d.to_vec2();
        let before = c.bounding_box();
        let _ = c.parallelogram_tree();
        let mut moved = c.clone();
        moved.translate(delta);
        let after = moved.bounding_box();
        prop_assert!((after.min.x - before.min.x - delta.x).abs() < 1e-9);
        prop_assert!((after.max.y - before.max.y - delta.y).abs() < 1e-9);
        let mid = 0.5 * (c.par_start() + c.par_end());
        prop_assert!(moved.parallelogram_tree().parallelogram().contains(&moved.value(mid)));
    }
}

// ---------------------------------------------------------------------------
// 8. Transforms map values pointwise
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn transform_maps_values(c in arb_curve(), angle in arb_angle(), d in arb_point()) {
        let t = Transform2d::rotation(angle).then(&Transform2d::translation(d.x, d.y));
        let mapped = c.transform(&t);
        for i in 0..=8 {
            let s = c.par_start() + (c.par_end() - c.par_start()) * i as f64 / 8.0;
            let expected = t.transform_point(&c.value(s));
            prop_assert!(mapped.value(s).distance_to(&expected) < 1e-9);
        }
    }
}

// ---------------------------------------------------------------------------
// 9. JSON round trip preserves geometry
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn json_round_trip(c in arb_curve()) {
        let back = Curve::from_json(&c.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.kind_name(), c.kind_name());
        for i in 0..=8 {
            let t = c.par_start() + (c.par_end() - c.par_start()) * i as f64 / 8.0;
            prop_assert!(back.value(t).distance_to(&c.value(t)) < 1e-6);
        }
        let (b0, b1) = (c.bounding_box(), back.bounding_box());
        prop_assert!(b0.min.distance_to(&b1.min) < 1e-6);
        prop_assert!(b0.max.distance_to(&b1.max) < 1e-6);
    }
}

// ---------------------------------------------------------------------------
// 10. Intersection symmetry: swapping the curves swaps the parameters
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn intersection_symmetry(a in arb_curve(), b in arb_curve()) {
        let ab = get_all_intersections(&a, &b);
        let ba = get_all_intersections(&b, &a);
        prop_assert_eq!(ab.len(), ba.len());
        for hit in &ab {
            prop_assert!(
                ba.iter().any(|o| o.point.distance_to(&hit.point) < 100.0 * INTERSECTION_EPSILON),
                "{:?} missing from swapped result", hit.point
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 11. Reported points lie on both curves
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn intersections_lie_on_both_curves(a in arb_curve(), b in arb_curve()) {
        for hit in get_all_intersections(&a, &b) {
            prop_assert!(a.value(hit.par0).distance_to(&hit.point) < INTERSECTION_EPSILON * 1.01);
            prop_assert!(b.value(hit.par1).distance_to(&hit.point) < INTERSECTION_EPSILON * 1.01);
        }
    }
}

// ---------------------------------------------------------------------------
// 12. Closed-form and iterative solvers agree for two segments
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn closed_form_matches_general_for_lines(
        a0 in arb_point(), a1 in arb_point(), b0 in arb_point(), b1 in arb_point(),
    ) {
        let (d, e) = (a1 - a0, b1 - b0);
        prop_assume!(d.length() > 1.0 && e.length() > 1.0);
        prop_assume!(d.cross(&e).abs() > 1e-2 * d.length() * e.length());
        let a = Curve::line(a0, a1);
        let b = Curve::line(b0, b1);
        let fast = get_all_intersections(&a, &b);
        let general = get_all_intersections_with(&a, &b, &IntersectOptions::general_only());
        prop_assert_eq!(fast.len(), general.len());
        if let (Some(f), Some(g)) = (fast.first(), general.first()) {
            prop_assert!(f.point.distance_to(&g.point) < INTERSECTION_EPSILON);
        }
    }
}

// ---------------------------------------------------------------------------
// 13. Circle-circle counts: 0 when apart, 2 when overlapping
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn circle_circle_counts(
        c in arb_point(), r in arb_radius(), angle in arb_angle(), ratio in 0.05f64..3.0,
    ) {
        prop_assume!((ratio - 2.0).abs() > 0.02);
        let d = ratio * r;
        let other = c + Vec2::from_angle(angle) * d;
        let a = Curve::Arc(EllipticArc::circle(c, r));
        let b = Curve::Arc(EllipticArc::circle(other, r));
        let hits = get_all_intersections(&a, &b);
        let expected = if ratio > 2.0 { 0 } else { 2 };
        prop_assert_eq!(hits.len(), expected, "d = {}, r = {}", d, r);
    }
}
