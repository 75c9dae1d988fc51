use super::curves::{CurveCache, closest_on_interval, integrate_speed, ordered};
use super::point::Point2d;
use super::transform::{BoundingBox, Transform2d};
use super::vector::Vec2;
use crate::DISTANCE_EPSILON;

/// Cubic Bezier segment parameterized over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct CubicBezier {
    control_points: [Point2d; 4],
    pub(crate) cache: CurveCache,
}

impl CubicBezier {
    pub fn new(control_points: [Point2d; 4]) -> Self {
        Self {
            control_points,
            cache: CurveCache::default(),
        }
    }

    pub fn control_points(&self) -> &[Point2d; 4] {
        &self.control_points
    }

    pub fn value(&self, t: f64) -> Point2d {
        let [p0, p1, p2, p3] = self.control_points;
        let mt = 1.0 - t;
        let (b0, b1, b2, b3) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
        Point2d::new(
            b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
            b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
        )
    }

    pub fn derivative(&self, t: f64) -> Vec2 {
        let [d0, d1, d2] = self.hodograph();
        let mt = 1.0 - t;
        (d0 * (mt * mt) + d1 * (2.0 * mt * t) + d2 * (t * t)) * 3.0
    }

    pub fn second_derivative(&self, t: f64) -> Vec2 {
        let [d0, d1, d2] = self.hodograph();
        ((d1 - d0) * (1.0 - t) + (d2 - d1) * t) * 6.0
    }

    /// Control-point differences of the first derivative.
    fn hodograph(&self) -> [Vec2; 3] {
        let [p0, p1, p2, p3] = self.control_points;
        [p1 - p0, p2 - p1, p3 - p2]
    }

    /// De Casteljau subdivision at `t`.
    pub fn split(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let (left, right) = split_points(&self.control_points, t);
        (CubicBezier::new(left), CubicBezier::new(right))
    }

    /// Control points of the piece over `[low, high]`, reparameterized to `[0, 1]`.
    pub(crate) fn sub_control_points(&self, low: f64, high: f64) -> [Point2d; 4] {
        let (low, high) = ordered(low.clamp(0.0, 1.0), high.clamp(0.0, 1.0));
        if 1.0 - low < 1e-15 {
            return [self.control_points[3]; 4];
        }
        let (_, tail) = split_points(&self.control_points, low);
        let (head, _) = split_points(&tail, (high - low) / (1.0 - low));
        head
    }

    pub fn trim(&self, a: f64, b: f64) -> Option<CubicBezier> {
        let (a, b) = ordered(a.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
        if integrate_speed(|t| self.derivative(t), a, b) < DISTANCE_EPSILON {
            return None;
        }
        Some(CubicBezier::new(self.sub_control_points(a, b)))
    }

    pub fn length(&self) -> f64 {
        integrate_speed(|t| self.derivative(t), 0.0, 1.0)
    }

    pub fn closest_parameter(&self, p: &Point2d) -> f64 {
        closest_on_interval(
            |t| self.value(t),
            |t| self.derivative(t),
            |t| self.second_derivative(t),
            p,
            0.0,
            1.0,
            32,
        )
    }

    /// Exact box from the endpoints and the roots of each derivative component.
    pub fn bounding_box(&self) -> BoundingBox {
        *self.cache.bbox.get_or_init(|| {
            let [d0, d1, d2] = self.hodograph();
            let mut points = vec![self.control_points[0], self.control_points[3]];
            let axes = [
                (d0.x - 2.0 * d1.x + d2.x, 2.0 * (d1.x - d0.x), d0.x),
                (d0.y - 2.0 * d1.y + d2.y, 2.0 * (d1.y - d0.y), d0.y),
            ];
            for (a, b, c) in axes {
                for t in quadratic_roots(a, b, c) {
                    if t > 0.0 && t < 1.0 {
                        points.push(self.value(t));
                    }
                }
            }
            BoundingBox::from_points(&points)
        })
    }

    pub fn reverse(&self) -> CubicBezier {
        let [p0, p1, p2, p3] = self.control_points;
        CubicBezier::new([p3, p2, p1, p0])
    }

    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.control_points {
            *p = *p + delta;
        }
        self.cache.clear();
    }

    pub fn transform(&self, t: &Transform2d) -> CubicBezier {
        CubicBezier::new(self.control_points.map(|p| t.transform_point(&p)))
    }
}

fn split_points(points: &[Point2d; 4], t: f64) -> ([Point2d; 4], [Point2d; 4]) {
    let [p0, p1, p2, p3] = *points;
    let p01 = p0.lerp(&p1, t);
    let p12 = p1.lerp(&p2, t);
    let p23 = p2.lerp(&p3, t);
    let p012 = p01.lerp(&p12, t);
    let p123 = p12.lerp(&p23, t);
    let mid = p012.lerp(&p123, t);
    ([p0, p01, p012, mid], [mid, p123, p23, p3])
}

/// Real roots of `a t² + b t + c`, degrading to the linear case.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    vec![(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> CubicBezier {
        CubicBezier::new([
            Point2d::new(0.0, 0.0),
            Point2d::new(0.0, 1.0),
            Point2d::new(1.0, 1.0),
            Point2d::new(1.0, 0.0),
        ])
    }

    #[test]
    fn test_endpoints_interpolate() {
        let b = arch();
        assert!(b.value(0.0).distance_to(&Point2d::new(0.0, 0.0)) < 1e-12);
        assert!(b.value(1.0).distance_to(&Point2d::new(1.0, 0.0)) < 1e-12);
        assert!(b.value(0.5).distance_to(&Point2d::new(0.5, 0.75)) < 1e-12);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let b = arch();
        let h = 1e-6;
        let t = 0.3;
        let fd = (b.value(t + h) - b.value(t - h)) / (2.0 * h);
        let d = b.derivative(t);
        assert!((fd - d).length() < 1e-6);
        let fd2 = (b.derivative(t + h) - b.derivative(t - h)) / (2.0 * h);
        assert!((fd2 - b.second_derivative(t)).length() < 1e-5);
    }

    #[test]
    fn test_split_halves_agree() {
        let b = arch();
        let (l, r) = b.split(0.5);
        assert!(l.value(0.5).distance_to(&b.value(0.25)) < 1e-12);
        assert!(r.value(0.5).distance_to(&b.value(0.75)) < 1e-12);
    }

    #[test]
    fn test_trim_reparameterizes() {
        let b = arch();
        let t = b.trim(0.2, 0.6).unwrap();
        assert!(t.value(0.0).distance_to(&b.value(0.2)) < 1e-12);
        assert!(t.value(1.0).distance_to(&b.value(0.6)) < 1e-12);
        assert!(t.value(0.5).distance_to(&b.value(0.4)) < 1e-12);
        assert!(b.trim(0.5, 0.5).is_none());
    }

    #[test]
    fn test_bounding_box_is_tight() {
        let bb = arch().bounding_box();
        assert!((bb.max.y - 0.75).abs() < 1e-12);
        assert!(bb.min.y.abs() < 1e-12);
        assert!((bb.width() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_parameter_at_apex() {
        let t = arch().closest_parameter(&Point2d::new(0.5, 3.0));
        assert!((t - 0.5).abs() < 1e-9);
    }
}
