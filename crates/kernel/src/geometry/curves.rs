use std::cell::OnceCell;

use thiserror::Error;

use super::bezier::CubicBezier;
use super::composite::Composite;
use super::ellipse::EllipticArc;
use super::hierarchy::{self, HierarchyConfig, ParallelogramNode};
use super::point::Point2d;
use super::transform::{BoundingBox, Transform2d};
use super::vector::Vec2;
use crate::{DISTANCE_EPSILON, TOLERANCE};

/// Failures when assembling or loading curves.
#[derive(Debug, Error)]
pub enum CurveError {
    #[error("Composite curve needs at least one segment")]
    EmptyComposite,

    #[error("Gap of {gap} after composite segment {index}")]
    Discontinuous { index: usize, gap: f64 },

    #[error("Invalid curve data: {0}")]
    InvalidData(String),

    #[error("Curve JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Derived state owned by a curve. Cleared on every mutation.
#[derive(Debug, Clone, Default)]
pub(crate) struct CurveCache {
    pub(crate) bbox: OnceCell<BoundingBox>,
    pub(crate) tree: OnceCell<ParallelogramNode>,
}

impl CurveCache {
    pub(crate) fn clear(&mut self) {
        self.bbox = OnceCell::new();
        self.tree = OnceCell::new();
    }
}

/// The closed set of planar curves the layout kernel understands.
#[derive(Debug, Clone)]
pub enum Curve {
    LineSegment(LineSegment),
    Arc(EllipticArc),
    Bezier(CubicBezier),
    Composite(Composite),
}

/// A straight segment parameterized over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct LineSegment {
    start: Point2d,
    end: Point2d,
    cache: CurveCache,
}

impl LineSegment {
    pub fn new(start: Point2d, end: Point2d) -> Self {
        Self {
            start,
            end,
            cache: CurveCache::default(),
        }
    }

    pub fn start(&self) -> Point2d {
        self.start
    }

    pub fn end(&self) -> Point2d {
        self.end
    }

    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    pub fn value(&self, t: f64) -> Point2d {
        self.start.lerp(&self.end, t)
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Parameter of the point on the segment closest to `p`.
    pub fn closest_parameter(&self, p: &Point2d) -> f64 {
        let d = self.direction();
        let len_sq = d.length_squared();
        if len_sq < TOLERANCE * TOLERANCE {
            return 0.0;
        }
        ((*p - self.start).dot(&d) / len_sq).clamp(0.0, 1.0)
    }

    pub fn trim(&self, a: f64, b: f64) -> Option<LineSegment> {
        let (a, b) = ordered(a.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
        let (p, q) = (self.value(a), self.value(b));
        if p.distance_to(&q) < DISTANCE_EPSILON {
            return None;
        }
        Some(LineSegment::new(p, q))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        *self
            .cache
            .bbox
            .get_or_init(|| BoundingBox::from_points(&[self.start, self.end]))
    }

    pub fn reverse(&self) -> LineSegment {
        LineSegment::new(self.end, self.start)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.start = self.start + delta;
        self.end = self.end + delta;
        self.cache.clear();
    }

    pub fn transform(&self, t: &Transform2d) -> LineSegment {
        LineSegment::new(t.transform_point(&self.start), t.transform_point(&self.end))
    }
}

impl Curve {
    /// Convenience constructor for a straight segment.
    pub fn line(start: Point2d, end: Point2d) -> Self {
        Curve::LineSegment(LineSegment::new(start, end))
    }

    pub fn par_start(&self) -> f64 {
        match self {
            Curve::LineSegment(_) | Curve::Bezier(_) | Curve::Composite(_) => 0.0,
            Curve::Arc(a) => a.par_start(),
        }
    }

    pub fn par_end(&self) -> f64 {
        match self {
            Curve::LineSegment(_) | Curve::Bezier(_) => 1.0,
            Curve::Arc(a) => a.par_end(),
            Curve::Composite(c) => c.par_end(),
        }
    }

    pub fn start(&self) -> Point2d {
        self.value(self.par_start())
    }

    pub fn end(&self) -> Point2d {
        self.value(self.par_end())
    }

    /// Evaluate the curve at parameter `t`.
    pub fn value(&self, t: f64) -> Point2d {
        match self {
            Curve::LineSegment(l) => l.value(t),
            Curve::Arc(a) => a.value(t),
            Curve::Bezier(b) => b.value(t),
            Curve::Composite(c) => c.value(t),
        }
    }

    pub fn derivative(&self, t: f64) -> Vec2 {
        match self {
            Curve::LineSegment(l) => l.direction(),
            Curve::Arc(a) => a.derivative(t),
            Curve::Bezier(b) => b.derivative(t),
            Curve::Composite(c) => c.derivative(t),
        }
    }

    pub fn second_derivative(&self, t: f64) -> Vec2 {
        match self {
            Curve::LineSegment(_) => Vec2::ZERO,
            Curve::Arc(a) => a.second_derivative(t),
            Curve::Bezier(b) => b.second_derivative(t),
            Curve::Composite(c) => c.second_derivative(t),
        }
    }

    /// Sub-curve between parameters `a` and `b`, or `None` when the span collapses.
    pub fn trim(&self, a: f64, b: f64) -> Option<Curve> {
        match self {
            Curve::LineSegment(l) => l.trim(a, b).map(Curve::LineSegment),
            Curve::Arc(e) => e.trim(a, b).map(Curve::Arc),
            Curve::Bezier(z) => z.trim(a, b).map(Curve::Bezier),
            Curve::Composite(c) => c.trim(a, b),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Curve::LineSegment(l) => l.bounding_box(),
            Curve::Arc(a) => a.bounding_box(),
            Curve::Bezier(b) => b.bounding_box(),
            Curve::Composite(c) => c.bounding_box(),
        }
    }

    /// Parameter of the curve point closest to `p`.
    pub fn closest_parameter(&self, p: &Point2d) -> f64 {
        match self {
            Curve::LineSegment(l) => l.closest_parameter(p),
            Curve::Arc(a) => a.closest_parameter(p),
            Curve::Bezier(b) => b.closest_parameter(p),
            Curve::Composite(c) => c.closest_parameter(p),
        }
    }

    pub fn closest_point(&self, p: &Point2d) -> Point2d {
        self.value(self.closest_parameter(p))
    }

    pub fn length(&self) -> f64 {
        match self {
            Curve::LineSegment(l) => l.length(),
            Curve::Arc(a) => a.length(),
            Curve::Bezier(b) => b.length(),
            Curve::Composite(c) => c.length(),
        }
    }

    /// Arc length between two parameters.
    pub fn length_between(&self, t0: f64, t1: f64) -> f64 {
        let (t0, t1) = ordered(t0, t1);
        match self {
            Curve::LineSegment(l) => l.value(t0).distance_to(&l.value(t1)),
            Curve::Arc(a) => integrate_speed(|t| a.derivative(t), t0, t1),
            Curve::Bezier(b) => integrate_speed(|t| b.derivative(t), t0, t1),
            Curve::Composite(c) => c.length_between(t0, t1),
        }
    }

    pub fn reverse(&self) -> Curve {
        match self {
            Curve::LineSegment(l) => Curve::LineSegment(l.reverse()),
            Curve::Arc(a) => Curve::Arc(a.reverse()),
            Curve::Bezier(b) => Curve::Bezier(b.reverse()),
            Curve::Composite(c) => Curve::Composite(c.reverse()),
        }
    }

    /// Move the curve in place. Cached bounds are dropped.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Curve::LineSegment(l) => l.translate(delta),
            Curve::Arc(a) => a.translate(delta),
            Curve::Bezier(b) => b.translate(delta),
            Curve::Composite(c) => c.translate(delta),
        }
    }

    pub fn transform(&self, t: &Transform2d) -> Curve {
        match self {
            Curve::LineSegment(l) => Curve::LineSegment(l.transform(t)),
            Curve::Arc(a) => Curve::Arc(a.transform(t)),
            Curve::Bezier(b) => Curve::Bezier(b.transform(t)),
            Curve::Composite(c) => Curve::Composite(c.transform(t)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.start().close_to(&self.end())
    }

    /// Simple pieces of the curve: the children of a composite, the curve itself otherwise.
    pub fn pieces(&self) -> &[Curve] {
        match self {
            Curve::Composite(c) => c.segments(),
            _ => std::slice::from_ref(self),
        }
    }

    /// Map a local parameter on `pieces()[index]` to a parameter of this curve.
    pub fn global_parameter(&self, index: usize, local: f64) -> f64 {
        match self {
            Curve::Composite(c) => c.global_parameter(index, local),
            _ => local,
        }
    }

    /// Lazily built bounding-parallelogram hierarchy.
    pub fn parallelogram_tree(&self) -> &ParallelogramNode {
        let config = HierarchyConfig::default();
        match self {
            Curve::LineSegment(l) => l
                .cache
                .tree
                .get_or_init(|| hierarchy::build_tree(self, 0, &config)),
            Curve::Arc(a) => a
                .cache
                .tree
                .get_or_init(|| hierarchy::build_tree(self, 0, &config)),
            Curve::Bezier(b) => b
                .cache
                .tree
                .get_or_init(|| hierarchy::build_tree(self, 0, &config)),
            Curve::Composite(c) => c
                .cache
                .tree
                .get_or_init(|| hierarchy::build_composite_tree(c.segments(), &config)),
        }
    }

    /// Points whose convex hull contains the piece of the curve over `[low, high]`,
    /// or `None` when the span is too wide for a cheap hull.
    pub(crate) fn control_hull(&self, low: f64, high: f64) -> Option<Vec<Point2d>> {
        match self {
            Curve::LineSegment(l) => Some(vec![l.value(low), l.value(high)]),
            Curve::Arc(a) => a.control_hull(low, high),
            Curve::Bezier(b) => Some(b.sub_control_points(low, high).to_vec()),
            Curve::Composite(_) => None,
        }
    }

    /// True when both curves trace the same geometry with the same parameterization.
    pub fn same_geometry(&self, other: &Curve) -> bool {
        match (self, other) {
            (Curve::LineSegment(a), Curve::LineSegment(b)) => {
                a.start.close_to(&b.start) && a.end.close_to(&b.end)
            }
            (Curve::Arc(a), Curve::Arc(b)) => a.same_ellipse(b),
            (Curve::Bezier(a), Curve::Bezier(b)) => a
                .control_points()
                .iter()
                .zip(b.control_points().iter())
                .all(|(p, q)| p.close_to(q)),
            (Curve::Composite(a), Curve::Composite(b)) => {
                a.segments().len() == b.segments().len()
                    && a
                        .segments()
                        .iter()
                        .zip(b.segments().iter())
                        .all(|(x, y)| x.same_geometry(y))
            }
            _ => false,
        }
    }

    /// Classify the curve type for logging/debugging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Curve::LineSegment(_) => "LineSegment",
            Curve::Arc(_) => "Arc",
            Curve::Bezier(_) => "Bezier",
            Curve::Composite(_) => "Composite",
        }
    }
}

pub(crate) fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

const SIMPSON_INTERVALS: usize = 128;

/// Arc length over `[low, high]` by composite Simpson integration of the speed.
pub(crate) fn integrate_speed(d1: impl Fn(f64) -> Vec2, low: f64, high: f64) -> f64 {
    if high <= low {
        return 0.0;
    }
    let h = (high - low) / SIMPSON_INTERVALS as f64;
    let mut sum = d1(low).length() + d1(high).length();
    for i in 1..SIMPSON_INTERVALS {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * d1(low + h * i as f64).length();
    }
    sum * h / 3.0
}

/// Closest parameter on `[low, high]`: coarse sampling, then Newton steps on
/// `(value(t) - p) . value'(t) = 0` from every sampled local minimum.
pub(crate) fn closest_on_interval(
    value: impl Fn(f64) -> Point2d,
    d1: impl Fn(f64) -> Vec2,
    d2: impl Fn(f64) -> Vec2,
    p: &Point2d,
    low: f64,
    high: f64,
    samples: usize,
) -> f64 {
    if high <= low {
        return low;
    }
    let samples = samples.max(16);
    let params: Vec<f64> = (0..=samples)
        .map(|i| low + (high - low) * (i as f64 / samples as f64))
        .collect();
    let dists: Vec<f64> = params
        .iter()
        .map(|t| value(*t).distance_squared_to(p))
        .collect();

    let mut best = (dists[0], params[0]);
    for i in 0..params.len() {
        let left = if i == 0 { f64::INFINITY } else { dists[i - 1] };
        let right = dists.get(i + 1).copied().unwrap_or(f64::INFINITY);
        if dists[i] > left || dists[i] > right {
            continue;
        }
        let t = newton_closest(&value, &d1, &d2, p, params[i], low, high);
        let d = value(t).distance_squared_to(p).min(dists[i]);
        let t = if d < dists[i] { t } else { params[i] };
        if d < best.0 {
            best = (d, t);
        }
    }
    best.1
}

fn newton_closest(
    value: &impl Fn(f64) -> Point2d,
    d1: &impl Fn(f64) -> Vec2,
    d2: &impl Fn(f64) -> Vec2,
    p: &Point2d,
    start: f64,
    low: f64,
    high: f64,
) -> f64 {
    let mut t = start;
    for _ in 0..16 {
        let offset = value(t) - *p;
        let tangent = d1(t);
        let g = offset.dot(&tangent);
        let dg = tangent.dot(&tangent) + offset.dot(&d2(t));
        if dg.abs() < 1e-15 {
            break;
        }
        let next = (t - g / dg).clamp(low, high);
        let done = (next - t).abs() < 1e-12;
        t = next;
        if done {
            break;
        }
    }
    t
}
