use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::curves::{CurveCache, closest_on_interval, integrate_speed, ordered};
use super::point::Point2d;
use super::transform::{BoundingBox, Transform2d};
use super::vector::Vec2;
use crate::{DISTANCE_EPSILON, TOLERANCE};

/// Angular slack when mapping an angle back into the arc's parameter range.
const ANGLE_SLACK: f64 = 1e-9;

/// An elliptic arc `center + major * cos(t) + minor * sin(t)` for `t` in
/// `[par_start, par_end]`.
///
/// The axes need not be orthogonal or ordered by length; a circle is simply two
/// perpendicular axes of equal length.
#[derive(Debug, Clone)]
pub struct EllipticArc {
    center: Point2d,
    major_axis: Vec2,
    minor_axis: Vec2,
    par_start: f64,
    par_end: f64,
    pub(crate) cache: CurveCache,
}

impl EllipticArc {
    pub fn new(
        center: Point2d,
        major_axis: Vec2,
        minor_axis: Vec2,
        par_start: f64,
        par_end: f64,
    ) -> Self {
        let (par_start, par_end) = ordered(par_start, par_end);
        Self {
            center,
            major_axis,
            minor_axis,
            par_start,
            par_end,
            cache: CurveCache::default(),
        }
    }

    /// Full counterclockwise circle starting at angle zero.
    pub fn circle(center: Point2d, radius: f64) -> Self {
        Self::circular_arc(center, radius, 0.0, TAU)
    }

    /// Counterclockwise circular arc between two angles.
    pub fn circular_arc(center: Point2d, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self::new(
            center,
            Vec2::new(radius, 0.0),
            Vec2::new(0.0, radius),
            start_angle,
            end_angle,
        )
    }

    pub fn center(&self) -> Point2d {
        self.center
    }

    pub fn major_axis(&self) -> Vec2 {
        self.major_axis
    }

    pub fn minor_axis(&self) -> Vec2 {
        self.minor_axis
    }

    pub fn par_start(&self) -> f64 {
        self.par_start
    }

    pub fn par_end(&self) -> f64 {
        self.par_end
    }

    pub fn is_full(&self) -> bool {
        self.par_end - self.par_start >= TAU - TOLERANCE
    }

    pub fn value(&self, t: f64) -> Point2d {
        let (s, c) = t.sin_cos();
        self.center + self.major_axis * c + self.minor_axis * s
    }

    pub fn derivative(&self, t: f64) -> Vec2 {
        let (s, c) = t.sin_cos();
        self.minor_axis * c - self.major_axis * s
    }

    pub fn second_derivative(&self, t: f64) -> Vec2 {
        let (s, c) = t.sin_cos();
        -(self.major_axis * c + self.minor_axis * s)
    }

    pub fn length(&self) -> f64 {
        integrate_speed(|t| self.derivative(t), self.par_start, self.par_end)
    }

    pub fn closest_parameter(&self, p: &Point2d) -> f64 {
        let samples = ((self.par_end - self.par_start) / (PI / 32.0)).ceil() as usize;
        closest_on_interval(
            |t| self.value(t),
            |t| self.derivative(t),
            |t| self.second_derivative(t),
            p,
            self.par_start,
            self.par_end,
            samples,
        )
    }

    pub fn trim(&self, a: f64, b: f64) -> Option<EllipticArc> {
        let (a, b) = ordered(
            a.clamp(self.par_start, self.par_end),
            b.clamp(self.par_start, self.par_end),
        );
        if integrate_speed(|t| self.derivative(t), a, b) < DISTANCE_EPSILON {
            return None;
        }
        Some(EllipticArc::new(
            self.center,
            self.major_axis,
            self.minor_axis,
            a,
            b,
        ))
    }

    /// Exact box: endpoints plus every axis-extreme angle inside the range.
    pub fn bounding_box(&self) -> BoundingBox {
        *self.cache.bbox.get_or_init(|| {
            let mut points = vec![self.value(self.par_start), self.value(self.par_end)];
            let bases = [
                self.minor_axis.x.atan2(self.major_axis.x),
                self.minor_axis.y.atan2(self.major_axis.y),
            ];
            for base in bases {
                let first = ((self.par_start - base) / PI).ceil() as i64;
                let last = ((self.par_end - base) / PI).floor() as i64;
                for k in first..=last {
                    points.push(self.value(base + k as f64 * PI));
                }
            }
            BoundingBox::from_points(&points)
        })
    }

    /// Same ellipse traced the other way round.
    pub fn reverse(&self) -> EllipticArc {
        EllipticArc::new(
            self.center,
            self.major_axis,
            -self.minor_axis,
            -self.par_end,
            -self.par_start,
        )
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center = self.center + delta;
        self.cache.clear();
    }

    pub fn transform(&self, t: &Transform2d) -> EllipticArc {
        EllipticArc::new(
            t.transform_point(&self.center),
            t.transform_vector(&self.major_axis),
            t.transform_vector(&self.minor_axis),
            self.par_start,
            self.par_end,
        )
    }

    /// Triangle hull of the sub-arc: both ends plus the intersection of their tangents.
    /// Spans wider than a quarter turn have no cheap hull.
    pub(crate) fn control_hull(&self, low: f64, high: f64) -> Option<Vec<Point2d>> {
        let half = 0.5 * (high - low);
        if half > 0.5 * FRAC_PI_2 + TOLERANCE {
            return None;
        }
        let (start, end) = (self.value(low), self.value(high));
        if half < TOLERANCE {
            return Some(vec![start, end]);
        }
        let (s, c) = (low + half).sin_cos();
        let apex = self.center + (self.major_axis * c + self.minor_axis * s) / half.cos();
        Some(vec![start, apex, end])
    }

    /// Map an angle onto this arc's parameter range, if the angle lies on the arc.
    pub(crate) fn parameter_of_angle(&self, angle: f64) -> Option<f64> {
        let lifted = angle + TAU * ((self.par_start - ANGLE_SLACK - angle) / TAU).ceil();
        if lifted <= self.par_end + ANGLE_SLACK {
            Some(lifted.clamp(self.par_start, self.par_end))
        } else {
            None
        }
    }

    /// Entries `(xx, xy, yy)` of `A·Aᵀ` for the axis matrix `A = [major minor]`.
    /// Two ellipses with the same center trace the same point set exactly when these agree.
    fn shape(&self) -> [f64; 3] {
        let (a, b) = (self.major_axis, self.minor_axis);
        [
            a.x * a.x + b.x * b.x,
            a.x * a.y + b.x * b.y,
            a.y * a.y + b.y * b.y,
        ]
    }

    /// Both arcs lie on the same ellipse, regardless of how each is parameterized.
    pub fn same_ellipse_set(&self, other: &EllipticArc) -> bool {
        if !self.center.close_to(&other.center) {
            return false;
        }
        let (s0, s1) = (self.shape(), other.shape());
        let scale = 1.0 + s0[0].abs().max(s0[2].abs());
        s0.iter()
            .zip(s1.iter())
            .all(|(x, y)| (x - y).abs() <= DISTANCE_EPSILON * scale)
    }

    /// Both arcs trace the same points of the same ellipse.
    pub fn same_ellipse(&self, other: &EllipticArc) -> bool {
        if !self.same_ellipse_set(other) {
            return false;
        }
        if self.is_full() && other.is_full() {
            return true;
        }
        let mid = |e: &EllipticArc| e.value(0.5 * (e.par_start + e.par_end));
        let ends = |e: &EllipticArc| (e.value(e.par_start), e.value(e.par_end));
        let ((a0, a1), (b0, b1)) = (ends(self), ends(other));
        let same_ends = (a0.close_to(&b0) && a1.close_to(&b1)) || (a0.close_to(&b1) && a1.close_to(&b0));
        same_ends && mid(self).close_to(&mid(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_points() {
        let c = EllipticArc::circle(Point2d::new(1.0, 1.0), 2.0);
        assert!(c.value(0.0).distance_to(&Point2d::new(3.0, 1.0)) < 1e-12);
        assert!(c.value(FRAC_PI_2).distance_to(&Point2d::new(1.0, 3.0)) < 1e-12);
        assert!(c.is_full());
    }

    #[test]
    fn test_circle_length() {
        let c = EllipticArc::circle(Point2d::ORIGIN, 1.0);
        assert!((c.length() - TAU).abs() < 1e-9);
    }

    #[test]
    fn test_arc_bounding_box_uses_extremes() {
        let arc = EllipticArc::circular_arc(Point2d::ORIGIN, 1.0, -0.5, 0.5);
        let bb = arc.bounding_box();
        assert!((bb.max.x - 1.0).abs() < 1e-12);
        assert!((bb.min.x - 0.5f64.cos()).abs() < 1e-12);
        assert!((bb.max.y - 0.5f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_ellipse_bounding_box() {
        let e = EllipticArc::new(Point2d::ORIGIN, Vec2::new(3.0, 0.0), Vec2::new(0.0, 1.0), 0.0, TAU);
        let bb = e.bounding_box();
        assert!((bb.width() - 6.0).abs() < 1e-12);
        assert!((bb.height() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_reverse_traces_backwards() {
        let arc = EllipticArc::circular_arc(Point2d::ORIGIN, 1.0, 0.2, 1.4);
        let rev = arc.reverse();
        assert!(rev.value(rev.par_start()).distance_to(&arc.value(arc.par_end())) < 1e-12);
        assert!(rev.value(rev.par_end()).distance_to(&arc.value(arc.par_start())) < 1e-12);
        let t = 0.3;
        assert!(
            rev.value(rev.par_start() + t)
                .distance_to(&arc.value(arc.par_end() - t))
                < 1e-12
        );
    }

    #[test]
    fn test_closest_parameter_on_circle() {
        let c = EllipticArc::circle(Point2d::ORIGIN, 1.0);
        let t = c.closest_parameter(&Point2d::new(0.0, 5.0));
        assert!((t - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_control_hull_contains_arc() {
        let arc = EllipticArc::circular_arc(Point2d::ORIGIN, 1.0, 0.0, FRAC_PI_2);
        let hull = arc.control_hull(0.0, FRAC_PI_2).unwrap();
        assert_eq!(hull.len(), 3);
        assert!(hull[1].distance_to(&Point2d::new(1.0, 1.0)) < 1e-12);
        assert!(arc.control_hull(0.0, PI).is_none());
    }

    #[test]
    fn test_parameter_of_angle_wraps() {
        let arc = EllipticArc::circular_arc(Point2d::ORIGIN, 1.0, PI, 1.5 * PI);
        let t = arc.parameter_of_angle(-0.75 * PI).unwrap();
        assert!((t - 1.25 * PI).abs() < 1e-12);
        assert!(arc.parameter_of_angle(0.1).is_none());
    }

    #[test]
    fn test_rotated_circle_is_same_set() {
        let a = EllipticArc::circle(Point2d::ORIGIN, 2.0);
        let b = EllipticArc::new(
            Point2d::ORIGIN,
            Vec2::new(0.0, 2.0),
            Vec2::new(-2.0, 0.0),
            0.0,
            TAU,
        );
        assert!(a.same_ellipse_set(&b));
        assert!(a.same_ellipse(&b));
        let c = EllipticArc::circle(Point2d::ORIGIN, 2.5);
        assert!(!a.same_ellipse_set(&c));
    }
}
