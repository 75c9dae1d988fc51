use nalgebra::{Matrix3, Vector2};
use serde::{Deserialize, Serialize};

use super::point::Point2d;
use super::vector::Vec2;

/// A 2D affine transformation in homogeneous coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2d {
    pub m: Matrix3<f64>,
}

impl Transform2d {
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            m: Matrix3::new_translation(&Vector2::new(dx, dy)),
        }
    }

    pub fn from_translation_vec(v: Vec2) -> Self {
        Self::translation(v.x, v.y)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            m: Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy)),
        }
    }

    pub fn uniform_scaling(s: f64) -> Self {
        Self::scaling(s, s)
    }

    /// Counterclockwise rotation about the origin by `angle` radians.
    pub fn rotation(angle: f64) -> Self {
        Self {
            m: Matrix3::new_rotation(angle),
        }
    }

    /// Rotation about an arbitrary center.
    pub fn rotation_about(center: Point2d, angle: f64) -> Self {
        Self::translation(-center.x, -center.y)
            .then(&Self::rotation(angle))
            .then(&Self::translation(center.x, center.y))
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Self) -> Self {
        Self { m: next.m * self.m }
    }

    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|m| Self { m })
    }

    pub fn transform_point(&self, p: &Point2d) -> Point2d {
        let m = &self.m;
        Point2d::new(
            m[(0, 0)] * p.x + m[(0, 1)] * p.y + m[(0, 2)],
            m[(1, 0)] * p.x + m[(1, 1)] * p.y + m[(1, 2)],
        )
    }

    /// Apply only the linear part; translations do not move vectors.
    pub fn transform_vector(&self, v: &Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(
            m[(0, 0)] * v.x + m[(0, 1)] * v.y,
            m[(1, 0)] * v.x + m[(1, 1)] * v.y,
        )
    }
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2d,
    pub max: Point2d,
}

impl BoundingBox {
    pub fn new(min: Point2d, max: Point2d) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point2d::new(f64::INFINITY, f64::INFINITY),
            max: Point2d::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[Point2d]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point2d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point2d::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2d::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, p: &Point2d) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Point2d {
        self.min.midpoint(&self.max)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn diagonal(&self) -> f64 {
        self.min.distance_to(&self.max)
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn corners(&self) -> [Point2d; 4] {
        [
            self.min,
            Point2d::new(self.max.x, self.min.y),
            self.max,
            Point2d::new(self.min.x, self.max.y),
        ]
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point2d::new(self.min.x - margin, self.min.y - margin),
            max: Point2d::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_transform() {
        let p = Transform2d::identity().transform_point(&Point2d::new(1.0, 2.0));
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_translation_leaves_vectors_alone() {
        let t = Transform2d::translation(10.0, 20.0);
        let p = t.transform_point(&Point2d::new(1.0, 2.0));
        assert!((p.x - 11.0).abs() < 1e-12);
        assert!((p.y - 22.0).abs() < 1e-12);
        let v = t.transform_vector(&Vec2::new(1.0, 2.0));
        assert!((v.x - 1.0).abs() < 1e-12);
        assert!((v.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_90() {
        let p = Transform2d::rotation(FRAC_PI_2).transform_point(&Point2d::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_about_center() {
        let t = Transform2d::rotation_about(Point2d::new(1.0, 1.0), FRAC_PI_2);
        let p = t.transform_point(&Point2d::new(2.0, 1.0));
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_and_inverse() {
        let t = Transform2d::translation(5.0, -3.0).then(&Transform2d::scaling(2.0, 4.0));
        let p = Point2d::new(1.0, 2.0);
        let q = t.transform_point(&p);
        assert!((q.x - 12.0).abs() < 1e-12);
        assert!((q.y + 4.0).abs() < 1e-12);
        let back = t.inverse().unwrap().transform_point(&q);
        assert!(back.distance_to(&p) < 1e-12);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Transform2d::scaling(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_bounding_box() {
        let bb = BoundingBox::from_points(&[
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 2.0),
            Point2d::new(-1.0, 0.5),
        ]);
        assert!((bb.min.x + 1.0).abs() < 1e-12);
        assert!((bb.max.y - 2.0).abs() < 1e-12);
        assert!((bb.width() - 2.0).abs() < 1e-12);
        assert!(bb.contains_point(&Point2d::new(0.0, 1.0)));
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::new(Point2d::new(0.0, 0.0), Point2d::new(2.0, 2.0));
        let b = BoundingBox::new(Point2d::new(1.0, 1.0), Point2d::new(3.0, 3.0));
        let c = BoundingBox::new(Point2d::new(5.0, 5.0), Point2d::new(6.0, 6.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.union(&c).contains_point(&Point2d::new(4.0, 4.0)));
    }
}
