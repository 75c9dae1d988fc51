use layout_kernel::Point2d;
use thiserror::Error;

/// Structural failures of a triangulation build.
///
/// Each of these means a mesh invariant would be broken; the current operation stops
/// and the mesh should not be used further.
#[derive(Debug, Error)]
pub enum CdtError {
    #[error("Triangle ({a:?}, {b:?}, {c:?}) is not counter-clockwise")]
    TriangleOrientation { a: Point2d, b: Point2d, c: Point2d },

    #[error("Edge {upper:?} - {lower:?} already has a triangle on that side")]
    EdgeSlotOccupied { upper: Point2d, lower: Point2d },

    #[error("Edge {a:?} - {b:?} is missing from the mesh")]
    MissingEdge { a: Point2d, b: Point2d },

    #[error("Edge {a:?} - {b:?} has no triangle on the far side")]
    MissingTriangle { a: Point2d, b: Point2d },

    #[error("Constrained segment {a:?} - {b:?} crosses constrained edge {c:?} - {d:?}")]
    ConstraintsCross {
        a: Point2d,
        b: Point2d,
        c: Point2d,
        d: Point2d,
    },

    #[error("Constraint endpoint {0:?} is not a site of this triangulation")]
    UnknownSite(Point2d),

    #[error("Segment {from:?} - {to:?} leaves the triangulated region")]
    SegmentLeavesMesh { from: Point2d, to: Point2d },

    #[error("Front has no element covering x = {0}")]
    FrontLookup(f64),
}
