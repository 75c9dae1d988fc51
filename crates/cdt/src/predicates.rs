//! Orientation and in-circle tests on mesh sites.

use layout_kernel::{Point2d, TOLERANCE};

/// Relative noise floor of the in-circle determinant.
const IN_CIRCLE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Ccw,
    Cw,
    Collinear,
}

/// Turn direction of `a -> b -> c`.
///
/// Collinear when the cross product is within `TOLERANCE` relative to the two edge
/// lengths from `a`.
pub fn orientation(a: &Point2d, b: &Point2d, c: &Point2d) -> Orientation {
    let ab = *b - *a;
    let ac = *c - *a;
    let cross = ab.cross(&ac);
    if cross.abs() <= TOLERANCE * ab.length() * ac.length() {
        Orientation::Collinear
    } else if cross > 0.0 {
        Orientation::Ccw
    } else {
        Orientation::Cw
    }
}

/// True when `d` lies strictly inside the circumcircle of the counter-clockwise
/// triangle `(a, b, c)`.
pub fn in_circle(a: &Point2d, b: &Point2d, c: &Point2d, d: &Point2d) -> bool {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let bc = bdx * cdy - cdx * bdy;
    let ca = cdx * ady - adx * cdy;
    let ab = adx * bdy - bdx * ady;
    let det = alift * bc + blift * ca + clift * ab;

    let permanent = alift * ((bdx * cdy).abs() + (cdx * bdy).abs())
        + blift * ((cdx * ady).abs() + (adx * cdy).abs())
        + clift * ((adx * bdy).abs() + (bdx * ady).abs());
    det > IN_CIRCLE_EPSILON * permanent
}

/// True when `p` and `q` lie strictly on opposite sides of the line through `a` and `b`.
pub fn separated_by(a: &Point2d, b: &Point2d, p: &Point2d, q: &Point2d) -> bool {
    matches!(
        (orientation(a, b, p), orientation(a, b, q)),
        (Orientation::Ccw, Orientation::Cw) | (Orientation::Cw, Orientation::Ccw)
    )
}
