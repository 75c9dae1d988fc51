//! Curve/curve intersection.
//!
//! Both curves' parallelogram trees are walked in pairs; pairs whose oriented
//! parallelograms are disjoint are pruned. At a leaf pair the crossing is solved in
//! closed form for two lines or a line and an arc, and otherwise refined by
//! Levenberg-Marquardt minimization of the squared distance between the pieces.
//! Leaves that do not converge are split on demand up to a depth cap. A leaf pair
//! that did converge keeps splitting while it could still hold a second crossing.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use nalgebra::{Matrix2, Vector2};
use tracing::{debug, instrument, warn};

use super::curves::{Curve, LineSegment};
use super::ellipse::EllipticArc;
use super::hierarchy::{HierarchyConfig, ParallelogramLeaf, ParallelogramNode};
use super::point::Point2d;
use crate::{DISTANCE_EPSILON, INTERSECTION_EPSILON, TOLERANCE};

/// One crossing or touching point between two curves.
///
/// `par0`/`par1` are parameters of the whole curves (global for composites).
#[derive(Debug, Clone)]
pub struct IntersectionInfo<'a> {
    pub par0: f64,
    pub par1: f64,
    pub point: Point2d,
    pub curve0: &'a Curve,
    pub curve1: &'a Curve,
}

impl<'a> IntersectionInfo<'a> {
    /// Same intersection seen from the other curve.
    pub fn swapped(&self) -> IntersectionInfo<'a> {
        IntersectionInfo {
            par0: self.par1,
            par1: self.par0,
            point: self.point,
            curve0: self.curve1,
            curve1: self.curve0,
        }
    }
}

/// Engine switches.
#[derive(Debug, Clone)]
pub struct IntersectOptions {
    /// Use closed-form solutions for line/line and line/arc leaf pairs.
    pub fast_paths: bool,
    /// How deep a non-converging leaf pair may be split.
    pub max_refine_depth: usize,
}

impl Default for IntersectOptions {
    fn default() -> Self {
        Self {
            fast_paths: true,
            max_refine_depth: HierarchyConfig::default().max_refine_depth,
        }
    }
}

impl IntersectOptions {
    /// Only the iterative solver; used to cross-check the closed forms.
    pub fn general_only() -> Self {
        Self {
            fast_paths: false,
            ..Self::default()
        }
    }
}

/// First intersection found, if any.
pub fn intersect_one<'a>(c0: &'a Curve, c1: &'a Curve) -> Option<IntersectionInfo<'a>> {
    let mut engine = Engine::new(c0, c1, IntersectOptions::default(), true);
    engine.run();
    engine.found.into_iter().next()
}

/// Every intersection, deduplicated within `100 * INTERSECTION_EPSILON` and sorted by `par0`.
pub fn get_all_intersections<'a>(c0: &'a Curve, c1: &'a Curve) -> Vec<IntersectionInfo<'a>> {
    get_all_intersections_with(c0, c1, &IntersectOptions::default())
}

#[instrument(skip_all, fields(kind0 = c0.kind_name(), kind1 = c1.kind_name()))]
pub fn get_all_intersections_with<'a>(
    c0: &'a Curve,
    c1: &'a Curve,
    options: &IntersectOptions,
) -> Vec<IntersectionInfo<'a>> {
    let mut engine = Engine::new(c0, c1, options.clone(), false);
    engine.run();
    let mut found = engine.found;
    found.sort_by(|a, b| a.par0.total_cmp(&b.par0));
    debug!(count = found.len(), "intersections found");
    found
}

// ─── Closed forms ──────────────────────────────────────────────────────────

/// Closed-form crossing of two segments as `(s, t, point)` triples.
///
/// Parallel (including collinear) segments only report endpoint contacts: an endpoint
/// of one lying on the other within `INTERSECTION_EPSILON`.
pub fn intersect_segments(a: &LineSegment, b: &LineSegment) -> Vec<(f64, f64, Point2d)> {
    let (d, e) = (a.direction(), b.direction());
    let (len_d, len_e) = (d.length(), e.length());
    if d.cross(&e).abs() <= TOLERANCE * len_d * len_e {
        return endpoint_contacts(a, b);
    }

    let m = Matrix2::new(d.x, -e.x, d.y, -e.y);
    let w = b.start() - a.start();
    let Some(inv) = m.try_inverse() else {
        return endpoint_contacts(a, b);
    };
    let sol = inv * Vector2::new(w.x, w.y);
    let (slack_s, slack_t) = (DISTANCE_EPSILON / len_d, DISTANCE_EPSILON / len_e);
    if sol.x < -slack_s || sol.x > 1.0 + slack_s || sol.y < -slack_t || sol.y > 1.0 + slack_t {
        return Vec::new();
    }
    let (s, t) = (sol.x.clamp(0.0, 1.0), sol.y.clamp(0.0, 1.0));
    vec![(s, t, a.value(s).midpoint(&b.value(t)))]
}

fn endpoint_contacts(a: &LineSegment, b: &LineSegment) -> Vec<(f64, f64, Point2d)> {
    let mut out = Vec::new();
    for s in [0.0, 1.0] {
        let p = a.value(s);
        let t = b.closest_parameter(&p);
        if b.value(t).distance_to(&p) < INTERSECTION_EPSILON {
            out.push((s, t, p));
        }
    }
    for t in [0.0, 1.0] {
        let q = b.value(t);
        let s = a.closest_parameter(&q);
        if a.value(s).distance_to(&q) < INTERSECTION_EPSILON {
            out.push((s, t, q));
        }
    }
    out
}

/// Closed-form crossing of a segment and an elliptic arc, solved in the frame where
/// the ellipse is the unit circle. `None` when the ellipse is degenerate.
///
/// A line passing within `DISTANCE_EPSILON` of tangency counts as one touching point.
pub fn intersect_segment_arc(
    line: &LineSegment,
    arc: &EllipticArc,
) -> Option<Vec<(f64, f64, Point2d)>> {
    let (a, b) = (arc.major_axis(), arc.minor_axis());
    let inv = Matrix2::new(a.x, b.x, a.y, b.y).try_inverse()?;
    let offset = line.start() - arc.center();
    let q = inv * Vector2::new(offset.x, offset.y);
    let d = line.direction();
    let e = inv * Vector2::new(d.x, d.y);

    let qa = e.dot(&e);
    if qa < 1e-300 {
        return None;
    }
    let qb = 2.0 * q.dot(&e);
    let qc = q.dot(&q) - 1.0;
    // 1 - (distance of the line from the unit circle's center)².
    let gap = (qb * qb - 4.0 * qa * qc) / (4.0 * qa);
    let scale = a.length().max(b.length()).max(TOLERANCE);
    let touch = 2.0 * DISTANCE_EPSILON / scale;

    let roots = if gap < -touch {
        Vec::new()
    } else if gap <= touch {
        vec![-qb / (2.0 * qa)]
    } else {
        let sq = (qb * qb - 4.0 * qa * qc).sqrt();
        vec![(-qb - sq) / (2.0 * qa), (-qb + sq) / (2.0 * qa)]
    };

    let slack = DISTANCE_EPSILON / d.length().max(TOLERANCE);
    let mut out = Vec::new();
    for s in roots {
        if s < -slack || s > 1.0 + slack {
            continue;
        }
        let s = s.clamp(0.0, 1.0);
        let u = q + e * s;
        let Some(t) = arc.parameter_of_angle(u.y.atan2(u.x)) else {
            continue;
        };
        let (p0, p1) = (line.value(s), arc.value(t));
        if p0.distance_to(&p1) < INTERSECTION_EPSILON {
            out.push((s, t, p0.midpoint(&p1)));
        }
    }
    Some(out)
}

// ─── Iterative refinement ──────────────────────────────────────────────────

const LM_MAX_ITERATIONS: usize = 100;
const LM_LAMBDA_INITIAL: f64 = 1e-3;
const LM_LAMBDA_FACTOR: f64 = 10.0;
const LM_CONVERGED_COST: f64 = 1e-18;

/// Parameters on `p0` over `r0` and `p1` over `r1` minimizing the squared distance
/// between the two pieces, starting from `guess`.
///
/// Solves `(JᵀJ + λI)·δ = -Jᵀr` on the residual `r = p0(s) - p1(t)`.
fn minimize_distance(
    p0: &Curve,
    r0: (f64, f64),
    p1: &Curve,
    r1: (f64, f64),
    guess: (f64, f64),
) -> (f64, f64) {
    let residual = |s: f64, t: f64| {
        let r = p0.value(s) - p1.value(t);
        Vector2::new(r.x, r.y)
    };
    let (mut s, mut t) = guess;
    let mut r = residual(s, t);
    let mut cost = r.norm_squared();
    let mut lambda = LM_LAMBDA_INITIAL;

    for _ in 0..LM_MAX_ITERATIONS {
        if cost < LM_CONVERGED_COST {
            break;
        }
        let (d0, d1) = (p0.derivative(s), p1.derivative(t));
        let j = Matrix2::new(d0.x, -d1.x, d0.y, -d1.y);
        let jt = j.transpose();
        let jtr = jt * r;
        let jtj = jt * j;

        let mut found_better = false;
        for _ in 0..10 {
            let damped = jtj + Matrix2::identity() * lambda;
            if let Some(inv) = damped.try_inverse() {
                let dx = inv * jtr;
                let ns = (s - dx.x).clamp(r0.0, r0.1);
                let nt = (t - dx.y).clamp(r1.0, r1.1);
                let nr = residual(ns, nt);
                let new_cost = nr.norm_squared();
                if new_cost < cost {
                    let stalled = (ns - s).abs() + (nt - t).abs() < 1e-15;
                    (s, t, r, cost) = (ns, nt, nr, new_cost);
                    lambda = (lambda / LM_LAMBDA_FACTOR).max(1e-15);
                    found_better = !stalled;
                    break;
                }
            }
            lambda *= LM_LAMBDA_FACTOR;
        }
        if !found_better {
            break;
        }
    }
    (s, t)
}

/// Starting point from the leaves' chords; midpoints when the chords are parallel.
fn initial_guess(
    p0: &Curve,
    l0: &ParallelogramLeaf,
    p1: &Curve,
    l1: &ParallelogramLeaf,
) -> (f64, f64) {
    let mid = (0.5 * (l0.low + l0.high), 0.5 * (l1.low + l1.high));
    let (a0, a1) = (p0.value(l0.low), p0.value(l0.high));
    let (b0, b1) = (p1.value(l1.low), p1.value(l1.high));
    let (d, e) = (a1 - a0, b1 - b0);
    let m = Matrix2::new(d.x, -e.x, d.y, -e.y);
    if d.cross(&e).abs() <= TOLERANCE * d.length() * e.length() {
        return mid;
    }
    let Some(inv) = m.try_inverse() else {
        return mid;
    };
    let w = b0 - a0;
    let sol = inv * Vector2::new(w.x, w.y);
    let (u, v) = (sol.x.clamp(0.0, 1.0), sol.y.clamp(0.0, 1.0));
    (
        l0.low + u * (l0.high - l0.low),
        l1.low + v * (l1.high - l1.low),
    )
}

// ─── Engine ────────────────────────────────────────────────────────────────

struct Engine<'a> {
    c0: &'a Curve,
    c1: &'a Curve,
    options: IntersectOptions,
    stop_at_first: bool,
    found: Vec<IntersectionInfo<'a>>,
    capped: usize,
}

impl<'a> Engine<'a> {
    fn new(c0: &'a Curve, c1: &'a Curve, options: IntersectOptions, stop_at_first: bool) -> Self {
        Self {
            c0,
            c1,
            options,
            stop_at_first,
            found: Vec::new(),
            capped: 0,
        }
    }

    fn done(&self) -> bool {
        self.stop_at_first && !self.found.is_empty()
    }

    fn run(&mut self) {
        let (c0, c1) = (self.c0, self.c1);
        if c0.same_geometry(c1) {
            debug!("identical curves, no finite intersection set");
            return;
        }
        let b0 = c0.bounding_box().expanded(DISTANCE_EPSILON);
        if !b0.intersects(&c1.bounding_box()) {
            return;
        }
        self.visit(c0.parallelogram_tree(), c1.parallelogram_tree());
        if self.capped > 0 {
            warn!(
                leaf_pairs = self.capped,
                "intersection refinement stopped at the depth cap"
            );
        }
    }

    fn visit(&mut self, n0: &ParallelogramNode, n1: &ParallelogramNode) {
        if self.done() || !n0.parallelogram().intersects(n1.parallelogram()) {
            return;
        }
        match (n0, n1) {
            (ParallelogramNode::Leaf(l0), ParallelogramNode::Leaf(l1)) => self.leaf_pair(l0, l1, 0),
            (ParallelogramNode::Internal(a), ParallelogramNode::Leaf(_)) => {
                for child in &a.children {
                    self.visit(child, n1);
                }
            }
            (ParallelogramNode::Leaf(_), ParallelogramNode::Internal(b)) => {
                for child in &b.children {
                    self.visit(n0, child);
                }
            }
            (ParallelogramNode::Internal(a), ParallelogramNode::Internal(b)) => {
                for x in &a.children {
                    for y in &b.children {
                        self.visit(x, y);
                    }
                }
            }
        }
    }

    fn leaf_pair(&mut self, l0: &ParallelogramLeaf, l1: &ParallelogramLeaf, depth: usize) {
        if self.done() || !l0.parallelogram.intersects(&l1.parallelogram) {
            return;
        }
        let (c0, c1) = (self.c0, self.c1);
        let p0 = &c0.pieces()[l0.segment];
        let p1 = &c1.pieces()[l1.segment];
        if p0.same_geometry(p1) {
            return;
        }

        if self.options.fast_paths && self.closed_form(l0, p0, l1, p1) {
            return;
        }

        let guess = initial_guess(p0, l0, p1, l1);
        let (s, t) = minimize_distance(p0, (l0.low, l0.high), p1, (l1.low, l1.high), guess);
        let (q0, q1) = (p0.value(s), p1.value(t));
        if q0.distance_squared_to(&q1) < DISTANCE_EPSILON * DISTANCE_EPSILON {
            self.record(l0.segment, s, l1.segment, t, q0.midpoint(&q1));
            // A second crossing may share the pair; split until it cannot.
            if depth < self.options.max_refine_depth && may_cross_again(l0, p0, l1, p1) {
                self.split_pair(l0, p0, l1, p1, depth);
            }
            return;
        }

        if depth >= self.options.max_refine_depth {
            self.capped += 1;
            return;
        }
        self.split_pair(l0, p0, l1, p1, depth);
    }

    fn split_pair(
        &mut self,
        l0: &ParallelogramLeaf,
        p0: &Curve,
        l1: &ParallelogramLeaf,
        p1: &Curve,
        depth: usize,
    ) {
        match (l0.refine(p0), l1.refine(p1)) {
            (None, None) => {}
            (Some(halves), None) => {
                for h in &halves {
                    self.leaf_pair(h, l1, depth + 1);
                }
            }
            (None, Some(halves)) => {
                for h in &halves {
                    self.leaf_pair(l0, h, depth + 1);
                }
            }
            (Some(a), Some(b)) => {
                for x in &a {
                    for y in &b {
                        self.leaf_pair(x, y, depth + 1);
                    }
                }
            }
        }
    }

    /// Handle the pair in closed form when possible. Returns false to fall through to
    /// the iterative solver.
    fn closed_form(
        &mut self,
        l0: &ParallelogramLeaf,
        p0: &Curve,
        l1: &ParallelogramLeaf,
        p1: &Curve,
    ) -> bool {
        let within = |t: f64, l: &ParallelogramLeaf| t >= l.low - TOLERANCE && t <= l.high + TOLERANCE;
        match (p0, p1) {
            (Curve::LineSegment(a), Curve::LineSegment(b)) => {
                for (s, t, point) in intersect_segments(a, b) {
                    self.record(l0.segment, s, l1.segment, t, point);
                }
                true
            }
            (Curve::LineSegment(a), Curve::Arc(e)) => match intersect_segment_arc(a, e) {
                Some(hits) => {
                    for (s, t, point) in hits {
                        if within(t, l1) {
                            self.record(l0.segment, s, l1.segment, t, point);
                        }
                    }
                    true
                }
                None => false,
            },
            (Curve::Arc(e), Curve::LineSegment(a)) => match intersect_segment_arc(a, e) {
                Some(hits) => {
                    for (t, s, point) in hits {
                        if within(s, l0) {
                            self.record(l0.segment, s, l1.segment, t, point);
                        }
                    }
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn record(&mut self, seg0: usize, s: f64, seg1: usize, t: f64, point: Point2d) {
        if self.done() {
            return;
        }
        let (c0, c1) = (self.c0, self.c1);
        let (t, point) = snap_to_end(&c1.pieces()[seg1], t, point);
        let (s, point) = snap_to_end(&c0.pieces()[seg0], s, point);
        let tol = crate::Tolerance::default();
        if self.found.iter().any(|f| tol.same_intersection(&f.point, &point)) {
            return;
        }
        self.found.push(IntersectionInfo {
            par0: c0.global_parameter(seg0, s),
            par1: c1.global_parameter(seg1, t),
            point,
            curve0: c0,
            curve1: c1,
        });
    }
}

/// Move a hit within `INTERSECTION_EPSILON` of a piece end onto that end exactly.
fn snap_to_end(piece: &Curve, t: f64, point: Point2d) -> (f64, Point2d) {
    let here = piece.value(t);
    for end in [piece.par_start(), piece.par_end()] {
        let q = piece.value(end);
        if q.distance_to(&here) < INTERSECTION_EPSILON {
            return (end, q);
        }
    }
    (t, point)
}

// ─── Second-crossing test ──────────────────────────────────────────────────

const CONE_SAMPLES: usize = 9;

/// Undirected tangent directions over a piece span: a center angle and a half-width.
#[derive(Debug, Clone, Copy)]
struct TangentCone {
    center: f64,
    half_width: f64,
}

/// Fold an angle into `(-π/2, π/2]`.
fn fold_half_turn(angle: f64) -> f64 {
    let a = angle % PI;
    if a > FRAC_PI_2 {
        a - PI
    } else if a <= -FRAC_PI_2 {
        a + PI
    } else {
        a
    }
}

impl TangentCone {
    /// `None` when a derivative vanishes or the directions spread too far to bound.
    fn of(piece: &Curve, low: f64, high: f64) -> Option<Self> {
        let reference = piece.derivative(0.5 * (low + high)).normalized()?;
        let mut angles = Vec::with_capacity(CONE_SAMPLES);
        for i in 0..CONE_SAMPLES {
            let t = low + (high - low) * i as f64 / (CONE_SAMPLES - 1) as f64;
            let d = piece.derivative(t).normalized()?;
            angles.push(fold_half_turn(reference.cross(&d).atan2(reference.dot(&d))));
        }
        let lo = angles.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = angles.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Pad by the widest gap between samples.
        let step = angles
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max);
        let half_width = 0.5 * (hi - lo) + step;
        (half_width < FRAC_PI_4).then_some(Self {
            center: reference.y.atan2(reference.x) + 0.5 * (lo + hi),
            half_width,
        })
    }

    fn disjoint(&self, other: &Self) -> bool {
        fold_half_turn(other.center - self.center).abs() > self.half_width + other.half_width
    }
}

/// Whether a leaf pair that already produced a hit can hold another reportable one.
///
/// Two crossings force both pieces to run parallel to the chord between them somewhere
/// in between, so disjoint tangent cones rule a second crossing out. Pieces narrower
/// than the merge radius cannot hold two distinct hits either.
fn may_cross_again(
    l0: &ParallelogramLeaf,
    p0: &Curve,
    l1: &ParallelogramLeaf,
    p1: &Curve,
) -> bool {
    let radius = crate::Tolerance::default().merge_radius();
    let extent = |l: &ParallelogramLeaf| l.parallelogram.bounding_box().diagonal();
    if extent(l0).min(extent(l1)) < radius {
        return false;
    }
    match (
        TangentCone::of(p0, l0.low, l0.high),
        TangentCone::of(p1, l1.low, l1.high),
    ) {
        (Some(a), Some(b)) => !a.disjoint(&b),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bezier::CubicBezier;
    use crate::geometry::composite::Composite;
    use crate::geometry::vector::Vec2;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Curve {
        Curve::line(Point2d::new(x0, y0), Point2d::new(x1, y1))
    }

    #[test]
    fn test_crossing_lines() {
        let a = seg(0.0, 0.0, 2.0, 2.0);
        let b = seg(0.0, 2.0, 2.0, 0.0);
        let hits = get_all_intersections(&a, &b);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].point.distance_to(&Point2d::new(1.0, 1.0)) < 1e-9);
        assert!((hits[0].par0 - 0.5).abs() < 1e-9);
        assert!((hits[0].par1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_lines() {
        let a = seg(0.0, 0.0, 1.0, 0.0);
        let b = seg(0.0, 1.0, 1.0, 2.0);
        assert!(get_all_intersections(&a, &b).is_empty());
        assert!(intersect_one(&a, &b).is_none());
    }

    #[test]
    fn test_collinear_overlap_reports_endpoints_only() {
        let a = seg(0.0, 0.0, 2.0, 0.0);
        let b = seg(1.0, 0.0, 3.0, 0.0);
        let hits = get_all_intersections(&a, &b);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|h| h.point.close_to(&Point2d::new(1.0, 0.0))));
        assert!(hits.iter().any(|h| h.point.close_to(&Point2d::new(2.0, 0.0))));
    }

    #[test]
    fn test_endpoint_snaps_exactly() {
        let a = seg(0.0, 0.0, 1.0, 0.0);
        let b = seg(1.0 + 5e-7, -1.0, 1.0 + 5e-7, 1.0);
        let hit = intersect_one(&a, &b).unwrap();
        assert_eq!(hit.par0, 1.0);
        assert_eq!(hit.point, Point2d::new(1.0, 0.0));
    }

    #[test]
    fn test_line_through_circle() {
        let circle = Curve::Arc(EllipticArc::circle(Point2d::ORIGIN, 1.0));
        let line = seg(-2.0, 0.0, 2.0, 0.0);
        let hits = get_all_intersections(&line, &circle);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].point.distance_to(&Point2d::new(-1.0, 0.0)) < 1e-9);
        assert!(hits[1].point.distance_to(&Point2d::new(1.0, 0.0)) < 1e-9);
        for h in &hits {
            assert!(circle.value(h.par1).distance_to(&h.point) < INTERSECTION_EPSILON);
            assert!(line.value(h.par0).distance_to(&h.point) < INTERSECTION_EPSILON);
        }
    }

    #[test]
    fn test_line_tangent_to_circle_touches_once() {
        let circle = Curve::Arc(EllipticArc::circle(Point2d::ORIGIN, 1.0));
        let line = seg(-2.0, 1.0, 2.0, 1.0);
        let hits = get_all_intersections(&line, &circle);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].point.distance_to(&Point2d::new(0.0, 1.0)) < 1e-6);
    }

    #[test]
    fn test_line_arc_general_matches_closed_form() {
        let arc = Curve::Arc(EllipticArc::new(
            Point2d::new(1.0, 1.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(0.0, 1.5),
            0.0,
            std::f64::consts::PI,
        ));
        let line = seg(-3.0, 1.5, 5.0, 2.0);
        let fast = get_all_intersections(&line, &arc);
        let general = get_all_intersections_with(&line, &arc, &IntersectOptions::general_only());
        assert_eq!(fast.len(), 2);
        assert_eq!(general.len(), fast.len());
        for (f, g) in fast.iter().zip(general.iter()) {
            assert!(f.point.distance_to(&g.point) < INTERSECTION_EPSILON);
        }
    }

    #[test]
    fn test_bezier_crosses_line_three_times() {
        let wave = Curve::Bezier(CubicBezier::new([
            Point2d::new(0.0, -1.0),
            Point2d::new(1.0, 3.0),
            Point2d::new(2.0, -3.0),
            Point2d::new(3.0, 1.0),
        ]));
        let axis = seg(-1.0, 0.0, 4.0, 0.0);
        let hits = get_all_intersections(&wave, &axis);
        assert_eq!(hits.len(), 3);
        for h in &hits {
            assert!(h.point.y.abs() < 1e-6);
            assert!(wave.value(h.par0).distance_to(&h.point) < INTERSECTION_EPSILON);
        }
    }

    #[test]
    fn test_composite_parameters_are_global() {
        let square = Curve::Composite(
            Composite::polyline(
                &[
                    Point2d::new(0.0, 0.0),
                    Point2d::new(2.0, 0.0),
                    Point2d::new(2.0, 2.0),
                    Point2d::new(0.0, 2.0),
                ],
                true,
            )
            .unwrap(),
        );
        let cut = seg(1.0, -1.0, 1.0, 3.0);
        let hits = get_all_intersections(&square, &cut);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].par0 - 0.5).abs() < 1e-9);
        assert!((hits[1].par0 - 2.5).abs() < 1e-9);
        for h in &hits {
            assert!(square.value(h.par0).distance_to(&h.point) < 1e-9);
        }
    }

    #[test]
    fn test_tangent_cones_separate_crossing_arcs() {
        let a = Curve::Arc(EllipticArc::circle(Point2d::ORIGIN, 1.0));
        let b = Curve::Arc(EllipticArc::circle(Point2d::new(1.0, 0.0), 1.0));
        // Short spans around the upper crossing at 60° and 120° on each circle.
        let ca = TangentCone::of(&a, 1.0, 1.1).unwrap();
        let cb = TangentCone::of(&b, 2.05, 2.15).unwrap();
        assert!(ca.disjoint(&cb));
        // A quarter turn is too wide to bound.
        assert!(TangentCone::of(&a, 0.0, std::f64::consts::FRAC_PI_2).is_none());
        // Opposite directions count as the same line direction.
        let line = Curve::line(Point2d::new(0.0, 0.0), Point2d::new(-1.0, 0.0));
        let top = TangentCone::of(&a, 1.5, 1.6).unwrap();
        assert!(!TangentCone::of(&line, 0.0, 1.0).unwrap().disjoint(&top));
    }

    #[test]
    fn test_converged_pair_keeps_splitting_for_second_crossing() {
        let r = 0.5;
        let a = Curve::Arc(EllipticArc::circle(Point2d::ORIGIN, r));
        let b = Curve::Arc(EllipticArc::circle(Point2d::new(1.977 * r, 0.0), r));
        let hits = get_all_intersections(&a, &b);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].point.y + hits[1].point.y).abs() < 1e-6);
    }

    #[test]
    fn test_identical_curves_yield_nothing() {
        let b = Curve::Bezier(CubicBezier::new([
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 2.0),
            Point2d::new(2.0, 2.0),
            Point2d::new(3.0, 0.0),
        ]));
        assert!(get_all_intersections(&b, &b.clone()).is_empty());
    }

    #[test]
    fn test_swapped_info() {
        let a = seg(0.0, 0.0, 2.0, 0.0);
        let b = seg(0.5, -1.0, 0.5, 1.0);
        let hit = intersect_one(&a, &b).unwrap();
        let sw = hit.swapped();
        assert_eq!(sw.par0, hit.par1);
        assert!(std::ptr::eq(sw.curve0, &b));
    }
}
