//! Delaunay legalization by edge flips.

use tracing::{debug, warn};

use crate::error::CdtError;
use crate::mesh::{EdgeId, MeshStore, SiteId};
use crate::predicates::{in_circle, separated_by};

/// Whether the interior edge fails the empty-circle test and can be flipped.
///
/// Edge `(u, v)` with triangles `(u, v, x)` and `(v, u, y)` is illegal when `y` lies
/// strictly inside the circumcircle of `(u, v, x)` and `u`, `v` lie on opposite sides of
/// the line `x - y`, so that the flip stays inside the convex quadrilateral.
/// Constrained and boundary edges are never illegal.
pub fn is_illegal(mesh: &MeshStore, edge: EdgeId) -> bool {
    let Some(e) = mesh.edges.get(edge) else {
        return false;
    };
    if e.constrained {
        return false;
    }
    let (Some(t1), Some(t2)) = (e.ccw_triangle, e.cw_triangle) else {
        return false;
    };
    let (Some((u, v, x)), Some((_, _, y))) =
        (mesh.rotated_to_edge(t1, edge), mesh.rotated_to_edge(t2, edge))
    else {
        return false;
    };
    let (pu, pv, px, py) = (mesh.point(u), mesh.point(v), mesh.point(x), mesh.point(y));
    in_circle(&pu, &pv, &px, &py) && separated_by(&px, &py, &pu, &pv)
}

/// Flip driver shared by the sweep, the hull pass and the final pass, so that all of
/// them draw on one flip budget.
#[derive(Debug)]
pub(crate) struct Legalizer {
    budget: usize,
    pub flips: usize,
    exhausted: bool,
}

impl Legalizer {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            flips: 0,
            exhausted: false,
        }
    }

    fn take_flip(&mut self) -> bool {
        if self.flips < self.budget {
            self.flips += 1;
            return true;
        }
        if !self.exhausted {
            warn!(budget = self.budget, "flip budget exhausted, mesh may not be Delaunay");
            self.exhausted = true;
        }
        false
    }

    /// Legalize `edge` against the vertex `apex` of one of its triangles.
    ///
    /// After a flip the new diagonal ends at `apex`, and the two edges of the far triangle
    /// that are now opposite `apex` are checked in turn.
    pub fn legalize(
        &mut self,
        mesh: &mut MeshStore,
        edge: EdgeId,
        apex: SiteId,
    ) -> Result<(), CdtError> {
        let mut stack = vec![edge];
        while let Some(edge) = stack.pop() {
            if !is_illegal(mesh, edge) {
                continue;
            }
            let Some(near) = mesh.triangle_with_apex(edge, apex) else {
                continue;
            };
            let Some((u, v, _)) = mesh.rotated_to_edge(near, edge) else {
                continue;
            };
            if !self.take_flip() {
                return Ok(());
            }
            let far = mesh.edges[edge].other_triangle(near);
            let Some((_, _, x)) = far.and_then(|t| mesh.rotated_to_edge(t, edge)) else {
                continue;
            };
            mesh.flip(edge)?;
            for (a, b) in [(u, x), (x, v)] {
                if let Some(e) = mesh.edge_between(a, b) {
                    stack.push(e);
                }
            }
        }
        Ok(())
    }

    /// Lawson pass over every interior edge until no illegal edge remains or the budget
    /// runs out. Returns the number of flips made by this pass.
    pub fn lawson_pass(&mut self, mesh: &mut MeshStore) -> Result<usize, CdtError> {
        let before = self.flips;
        let mut stack: Vec<EdgeId> = mesh.edges.keys().collect();
        while let Some(edge) = stack.pop() {
            if !is_illegal(mesh, edge) {
                continue;
            }
            if !self.take_flip() {
                break;
            }
            let e = mesh.edges[edge];
            let outer: Vec<(SiteId, SiteId)> = [e.ccw_triangle, e.cw_triangle]
                .into_iter()
                .flatten()
                .filter_map(|t| mesh.rotated_to_edge(t, edge))
                .flat_map(|(a, b, c)| [(b, c), (c, a)])
                .collect();
            mesh.flip(edge)?;
            stack.extend(outer.into_iter().filter_map(|(a, b)| mesh.edge_between(a, b)));
        }
        let flips = self.flips - before;
        debug!(flips, "lawson pass complete");
        Ok(flips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_kernel::Point2d;

    /// A thin quadrilateral triangulated along its long diagonal.
    fn kite() -> (MeshStore, [SiteId; 4]) {
        let mut m = MeshStore::new();
        let a = m.add_site(Point2d::new(0.0, 0.0), None);
        let b = m.add_site(Point2d::new(2.0, -0.3), None);
        let c = m.add_site(Point2d::new(4.0, 0.0), None);
        let d = m.add_site(Point2d::new(2.0, 0.3), None);
        m.add_triangle(a, b, c).unwrap();
        m.add_triangle(a, c, d).unwrap();
        (m, [a, b, c, d])
    }

    #[test]
    fn test_long_diagonal_is_illegal() {
        let (m, [a, b, c, _]) = kite();
        assert!(is_illegal(&m, m.edge_between(a, c).unwrap()));
        // Boundary edges have a single triangle.
        assert!(!is_illegal(&m, m.edge_between(a, b).unwrap()));
    }

    #[test]
    fn test_constrained_edge_is_never_illegal() {
        let (mut m, [a, _, c, _]) = kite();
        let e = m.edge_between(a, c).unwrap();
        m.edges[e].constrained = true;
        assert!(!is_illegal(&m, e));
    }

    #[test]
    fn test_legalize_flips_to_short_diagonal() {
        let (mut m, [a, b, c, d]) = kite();
        let e = m.edge_between(a, c).unwrap();
        let mut lz = Legalizer::new(100);
        lz.legalize(&mut m, e, d).unwrap();
        assert_eq!(lz.flips, 1);
        assert!(m.edge_between(a, c).is_none());
        assert!(m.edge_between(b, d).is_some());
    }

    #[test]
    fn test_lawson_pass_and_budget() {
        let (mut m, [_, b, _, d]) = kite();
        let mut starved = Legalizer::new(0);
        assert_eq!(starved.lawson_pass(&mut m).unwrap(), 0);
        assert!(m.edge_between(b, d).is_none());

        let mut lz = Legalizer::new(10);
        assert_eq!(lz.lawson_pass(&mut m).unwrap(), 1);
        assert!(m.edge_between(b, d).is_some());
        assert_eq!(lz.lawson_pass(&mut m).unwrap(), 0);
    }
}
