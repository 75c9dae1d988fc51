use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::curves::Curve;
use super::intersection::get_all_intersections;
use super::point::Point2d;
use super::vector::Vec2;
use crate::{DISTANCE_EPSILON, INTERSECTION_EPSILON};

/// Where a point sits relative to a closed curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointLocation {
    Inside,
    Outside,
    Boundary,
}

const RAY_STEP_DEGREES: f64 = 13.0;

/// Sine of the smallest crossing angle at which a ray hit still counts as a crossing.
const TANGENT_SINE: f64 = 1e-3;

/// Classify `point` against the region bounded by the closed curve `boundary`.
///
/// Rays are cast at 13° steps. A ray whose hits include a tangential contact or a
/// segment joint is skipped. The first answer reached by two rays wins; if no answer
/// gets two votes the majority decides, with ties going to `Outside`.
#[instrument(skip(boundary), fields(kind = boundary.kind_name()))]
pub fn point_location(point: &Point2d, boundary: &Curve) -> PointLocation {
    if boundary.closest_point(point).distance_to(point) < DISTANCE_EPSILON {
        return PointLocation::Boundary;
    }
    let bb = boundary.bounding_box();
    if !bb.contains_point(point) {
        return PointLocation::Outside;
    }

    let reach = 2.0 * bb.diagonal() + 1.0;
    let (mut inside_votes, mut outside_votes) = (0usize, 0usize);
    let rays = (360.0 / RAY_STEP_DEGREES) as usize;
    for k in 0..rays {
        let dir = Vec2::from_angle((k as f64 * RAY_STEP_DEGREES).to_radians());
        let Some(inside) = ray_parity(point, dir * reach, boundary) else {
            continue;
        };
        if inside {
            inside_votes += 1;
        } else {
            outside_votes += 1;
        }
        if inside_votes == 2 {
            return PointLocation::Inside;
        }
        if outside_votes == 2 {
            return PointLocation::Outside;
        }
    }

    warn!(
        inside_votes,
        outside_votes, "no two rays agreed, falling back to majority"
    );
    if inside_votes > outside_votes {
        PointLocation::Inside
    } else {
        PointLocation::Outside
    }
}

/// Odd crossing count along the ray, or `None` when the ray is inconclusive.
fn ray_parity(origin: &Point2d, span: Vec2, boundary: &Curve) -> Option<bool> {
    let ray = Curve::line(*origin, *origin + span);
    let dir = span.normalized()?;
    let hits = get_all_intersections(&ray, boundary);
    let joint_radius = 100.0 * INTERSECTION_EPSILON;
    for hit in &hits {
        let on_joint = boundary.pieces().iter().any(|piece| {
            piece.start().distance_to(&hit.point) < joint_radius
                || piece.end().distance_to(&hit.point) < joint_radius
        });
        if on_joint {
            return None;
        }
        let tangent = boundary.derivative(hit.par1).normalized()?;
        if dir.cross(&tangent).abs() < TANGENT_SINE {
            return None;
        }
    }
    Some(hits.len() % 2 == 1)
}
