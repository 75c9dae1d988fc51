use super::point::Point2d;
use super::transform::BoundingBox;
use super::vector::Vec2;
use crate::DISTANCE_EPSILON;

/// Oriented parallelogram `corner + s·side_a + t·side_b` for `s, t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parallelogram {
    corner: Point2d,
    side_a: Vec2,
    side_b: Vec2,
}

impl Parallelogram {
    pub fn new(corner: Point2d, side_a: Vec2, side_b: Vec2) -> Self {
        Self {
            corner,
            side_a,
            side_b,
        }
    }

    /// Rectangle aligned with the chord `start → end` covering every point, padded by
    /// `DISTANCE_EPSILON` on all sides. A degenerate chord falls back to the x axis.
    pub fn around_chord(start: Point2d, end: Point2d, points: &[Point2d]) -> Self {
        let u = (end - start).normalized().unwrap_or(Vec2::X);
        let n = u.perp();
        let (mut lo_u, mut hi_u) = (0.0f64, 0.0f64);
        let (mut lo_n, mut hi_n) = (0.0f64, 0.0f64);
        for p in points.iter().chain([end].iter()) {
            let d = *p - start;
            let (su, sn) = (d.dot(&u), d.dot(&n));
            lo_u = lo_u.min(su);
            hi_u = hi_u.max(su);
            lo_n = lo_n.min(sn);
            hi_n = hi_n.max(sn);
        }
        lo_u -= DISTANCE_EPSILON;
        hi_u += DISTANCE_EPSILON;
        lo_n -= DISTANCE_EPSILON;
        hi_n += DISTANCE_EPSILON;
        Self {
            corner: start + u * lo_u + n * lo_n,
            side_a: u * (hi_u - lo_u),
            side_b: n * (hi_n - lo_n),
        }
    }

    pub fn from_box(bb: &BoundingBox) -> Self {
        Self {
            corner: bb.min,
            side_a: Vec2::new(bb.width(), 0.0),
            side_b: Vec2::new(0.0, bb.height()),
        }
    }

    pub fn vertices(&self) -> [Point2d; 4] {
        [
            self.corner,
            self.corner + self.side_a,
            self.corner + self.side_a + self.side_b,
            self.corner + self.side_b,
        ]
    }

    /// Width across the `side_b` direction.
    pub fn thickness(&self) -> f64 {
        let len = self.side_a.length();
        if len < 1e-15 {
            return self.side_b.length();
        }
        self.side_a.cross(&self.side_b).abs() / len
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices())
    }

    pub fn contains(&self, p: &Point2d) -> bool {
        let det = self.side_a.cross(&self.side_b);
        if det.abs() < 1e-300 {
            return false;
        }
        let d = *p - self.corner;
        let s = d.cross(&self.side_b) / det;
        let t = self.side_a.cross(&d) / det;
        (-1e-12..=1.0 + 1e-12).contains(&s) && (-1e-12..=1.0 + 1e-12).contains(&t)
    }

    /// Separating-axis overlap test. Touching counts as overlapping.
    pub fn intersects(&self, other: &Parallelogram) -> bool {
        let mine = self.vertices();
        let theirs = other.vertices();
        let axes = [
            self.side_a.perp(),
            self.side_b.perp(),
            other.side_a.perp(),
            other.side_b.perp(),
        ];
        for axis in axes {
            if axis.length_squared() < 1e-30 {
                continue;
            }
            let (lo0, hi0) = project(&mine, &axis);
            let (lo1, hi1) = project(&theirs, &axis);
            if hi0 < lo1 || hi1 < lo0 {
                return false;
            }
        }
        true
    }
}

fn project(points: &[Point2d; 4], axis: &Vec2) -> (f64, f64) {
    points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let s = p.to_vec2().dot(axis);
        (lo.min(s), hi.max(s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_around_chord_covers_points() {
        let pts = [
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 1.0),
            Point2d::new(2.0, 0.0),
        ];
        let p = Parallelogram::around_chord(pts[0], pts[2], &pts);
        for q in &pts {
            assert!(p.contains(q));
        }
        assert!((p.thickness() - (1.0 + 2.0 * DISTANCE_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_rotated_rectangles_separate_along_diagonal() {
        // Two thin diagonal strips whose axis-aligned boxes overlap but which do not touch.
        let a = Parallelogram::around_chord(
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 1.0),
            &[Point2d::new(0.0, 0.0)],
        );
        let b = Parallelogram::around_chord(
            Point2d::new(0.5, 0.0),
            Point2d::new(1.5, 1.0),
            &[Point2d::new(0.5, 0.0)],
        );
        assert!(a.bounding_box().intersects(&b.bounding_box()));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_crossing_strips_overlap() {
        let a = Parallelogram::around_chord(Point2d::new(0.0, 0.0), Point2d::new(1.0, 1.0), &[]);
        let b = Parallelogram::around_chord(Point2d::new(0.0, 1.0), Point2d::new(1.0, 0.0), &[]);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_from_box() {
        let bb = BoundingBox::new(Point2d::new(-1.0, -2.0), Point2d::new(3.0, 4.0));
        let p = Parallelogram::from_box(&bb);
        assert!(p.contains(&Point2d::new(0.0, 0.0)));
        assert!(!p.contains(&Point2d::new(5.0, 0.0)));
        assert_eq!(p.bounding_box(), bb);
    }
}
