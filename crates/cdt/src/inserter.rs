//! Forcing a segment into the mesh as a chain of edges.
//!
//! The segment is walked from its first endpoint through the triangles it crosses. Those
//! triangles are removed, which leaves a channel bounded by a chain of vertices on each
//! side. Each side is re-triangulated against the new edge by repeatedly choosing the
//! chain vertex whose circle through the base edge holds no other chain vertex.

use tracing::{debug, instrument};

use layout_kernel::Point2d;

use crate::error::CdtError;
use crate::mesh::{EdgeId, MeshStore, SiteId, TriangleId};
use crate::predicates::{Orientation, in_circle, orientation};

/// How the segment leaves its current start vertex.
enum Exit {
    /// Along an existing edge to a vertex lying on the segment.
    Vertex(SiteId),
    /// Through the far side of `triangle`, between `right` and `left`.
    Crossing {
        triangle: TriangleId,
        right: SiteId,
        left: SiteId,
    },
}

/// Make `a - b` a union of mesh edges, marking them constrained when asked.
///
/// Vertices lying on the segment split it; each piece becomes its own edge.
#[instrument(skip(mesh))]
pub(crate) fn insert_segment(
    mesh: &mut MeshStore,
    a: SiteId,
    b: SiteId,
    constrained: bool,
) -> Result<(), CdtError> {
    let target = mesh.point(b);
    let mut from = a;
    while from != b {
        if let Some(e) = mesh.edge_between(from, b) {
            mark(mesh, e, constrained);
            break;
        }
        let next = match find_exit(mesh, from, b)? {
            Exit::Vertex(v) => {
                let e = mesh.edge_between(from, v).ok_or_else(|| CdtError::MissingEdge {
                    a: mesh.point(from),
                    b: mesh.point(v),
                })?;
                mark(mesh, e, constrained);
                v
            }
            Exit::Crossing {
                triangle,
                right,
                left,
            } => dig_channel(mesh, from, b, triangle, right, left, constrained)?,
        };
        // Every step must move strictly toward the target.
        if mesh.point(next).distance_squared_to(&target)
            >= mesh.point(from).distance_squared_to(&target)
        {
            return Err(CdtError::SegmentLeavesMesh {
                from: mesh.point(from),
                to: target,
            });
        }
        from = next;
    }
    Ok(())
}

fn mark(mesh: &mut MeshStore, edge: EdgeId, constrained: bool) {
    if constrained {
        mesh.edges[edge].constrained = true;
    }
}

fn find_exit(mesh: &MeshStore, from: SiteId, to: SiteId) -> Result<Exit, CdtError> {
    let (pf, pt) = (mesh.point(from), mesh.point(to));
    let ahead = |p: &Point2d| (*p - pf).dot(&(pt - pf)) > 0.0;

    for triangle in mesh.triangles_around(from) {
        let t = &mesh.triangles[triangle];
        let Some(i) = t.sites.iter().position(|&s| s == from) else {
            continue;
        };
        let (right, left) = (t.sites[(i + 1) % 3], t.sites[(i + 2) % 3]);
        let (pr, pl) = (mesh.point(right), mesh.point(left));
        let (or, ol) = (orientation(&pf, &pr, &pt), orientation(&pf, &pl, &pt));
        if or == Orientation::Collinear && ahead(&pr) {
            return Ok(Exit::Vertex(right));
        }
        if ol == Orientation::Collinear && ahead(&pl) {
            return Ok(Exit::Vertex(left));
        }
        if or == Orientation::Ccw && ol == Orientation::Cw {
            return Ok(Exit::Crossing {
                triangle,
                right,
                left,
            });
        }
    }
    Err(CdtError::SegmentLeavesMesh { from: pf, to: pt })
}

/// Remove the triangles crossed between `from` and the next vertex on the segment,
/// connect the two and re-triangulate both sides. Returns the vertex reached.
fn dig_channel(
    mesh: &mut MeshStore,
    from: SiteId,
    to: SiteId,
    first: TriangleId,
    right: SiteId,
    left: SiteId,
    constrained: bool,
) -> Result<SiteId, CdtError> {
    let (pf, pt) = (mesh.point(from), mesh.point(to));
    let mut left_chain = vec![left];
    let mut right_chain = vec![right];
    let mut crossed_triangles = vec![first];
    let mut crossed_edges: Vec<EdgeId> = Vec::new();

    let (mut r, mut l, mut current) = (right, left, first);
    let reached = loop {
        let edge = mesh.edge_between(r, l).ok_or_else(|| CdtError::MissingEdge {
            a: mesh.point(r),
            b: mesh.point(l),
        })?;
        let e = mesh.edges[edge];
        if e.constrained {
            return Err(CdtError::ConstraintsCross {
                a: pf,
                b: pt,
                c: mesh.point(r),
                d: mesh.point(l),
            });
        }
        crossed_edges.push(edge);
        let next = e
            .other_triangle(current)
            .ok_or(CdtError::SegmentLeavesMesh { from: pf, to: pt })?;
        let (_, _, w) = mesh
            .rotated_to_edge(next, edge)
            .ok_or(CdtError::MissingTriangle {
                a: mesh.point(r),
                b: mesh.point(l),
            })?;
        crossed_triangles.push(next);
        current = next;
        match orientation(&pf, &pt, &mesh.point(w)) {
            Orientation::Collinear => break w,
            Orientation::Ccw => {
                left_chain.push(w);
                l = w;
            }
            Orientation::Cw => {
                right_chain.push(w);
                r = w;
            }
        }
    };

    for &t in &crossed_triangles {
        mesh.remove_triangle(t);
    }
    for &e in &crossed_edges {
        mesh.delete_edge(e);
    }
    let edge = mesh.get_or_create_edge(from, reached);
    mark(mesh, edge, constrained);

    right_chain.reverse();
    fill_polygon(mesh, &left_chain, from, reached)?;
    fill_polygon(mesh, &right_chain, reached, from)?;
    debug!(
        crossed = crossed_edges.len(),
        left = left_chain.len(),
        right = right_chain.len(),
        "channel re-triangulated"
    );
    Ok(reached)
}

/// Triangulate the polygon `a, b, chain[last], ..., chain[0]` lying left of `a -> b`.
fn fill_polygon(
    mesh: &mut MeshStore,
    chain: &[SiteId],
    a: SiteId,
    b: SiteId,
) -> Result<(), CdtError> {
    if chain.is_empty() {
        return Ok(());
    }
    let (pa, pb) = (mesh.point(a), mesh.point(b));
    let mut best = 0;
    for i in 1..chain.len() {
        if in_circle(&pa, &pb, &mesh.point(chain[best]), &mesh.point(chain[i])) {
            best = i;
        }
    }
    let apex = chain[best];
    mesh.add_triangle(a, b, apex)?;
    fill_polygon(mesh, &chain[..best], a, apex)?;
    fill_polygon(mesh, &chain[best + 1..], apex, b)
}
