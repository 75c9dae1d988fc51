pub mod geometry;

// Re-export the types downstream layout code reaches for most often.
pub use geometry::bezier::CubicBezier;
pub use geometry::composite::Composite;
pub use geometry::curves::{Curve, CurveError, LineSegment};
pub use geometry::ellipse::EllipticArc;
pub use geometry::format::CurveRecord;
pub use geometry::hierarchy::HierarchyConfig;
pub use geometry::intersection::{
    IntersectOptions, IntersectionInfo, get_all_intersections, get_all_intersections_with,
    intersect_one,
};
pub use geometry::point::Point2d;
pub use geometry::region::{PointLocation, point_location};
pub use geometry::transform::{BoundingBox, Transform2d};
pub use geometry::vector::Vec2;

/// Two points closer than this are the same point.
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Intersection points are reported and snapped at this resolution.
pub const INTERSECTION_EPSILON: f64 = 1e-4;

/// Numeric noise floor for determinants, parameters and collinearity.
pub const TOLERANCE: f64 = 1e-8;

/// Kernel-wide tolerance record.
///
/// Downstream routers size their own thresholds off these exact magnitudes, so the
/// defaults mirror the crate constants and are not meant to be tuned per call.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub distance: f64,
    /// Resolution at which curve crossings are reported.
    pub intersection: f64,
    /// Floor for numeric noise.
    pub numeric: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            distance: DISTANCE_EPSILON,
            intersection: INTERSECTION_EPSILON,
            numeric: TOLERANCE,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point2d, b: &Point2d) -> bool {
        a.distance_to(b) < self.distance
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.distance
    }

    /// Crossings closer than this are reported once.
    pub fn merge_radius(&self) -> f64 {
        100.0 * self.intersection
    }

    pub fn same_intersection(&self, a: &Point2d, b: &Point2d) -> bool {
        a.distance_to(b) < self.merge_radius()
    }
}

pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
