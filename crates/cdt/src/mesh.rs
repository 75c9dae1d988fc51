use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use layout_kernel::Point2d;

use crate::error::CdtError;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct SiteId;
    pub struct EdgeId;
    pub struct TriangleId;
}

// ─── Mesh Entities ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdtSite {
    pub point: Point2d,
    /// Every edge with this site as an endpoint.
    pub edges: Vec<EdgeId>,
    /// Index of the polyline this site came from, if any.
    pub owner: Option<usize>,
}

/// An undirected mesh edge.
///
/// `upper` is the endpoint later in sweep order (larger y, then larger x). Walking from
/// `upper` to `lower`, `ccw_triangle` lies on the left and `cw_triangle` on the right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CdtEdge {
    pub upper: SiteId,
    pub lower: SiteId,
    pub ccw_triangle: Option<TriangleId>,
    pub cw_triangle: Option<TriangleId>,
    pub constrained: bool,
}

impl CdtEdge {
    pub fn other_end(&self, site: SiteId) -> SiteId {
        if site == self.upper { self.lower } else { self.upper }
    }

    pub fn other_triangle(&self, triangle: TriangleId) -> Option<TriangleId> {
        if self.ccw_triangle == Some(triangle) {
            self.cw_triangle
        } else if self.cw_triangle == Some(triangle) {
            self.ccw_triangle
        } else {
            None
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.ccw_triangle.is_some() as usize + self.cw_triangle.is_some() as usize
    }
}

/// Sites in counter-clockwise order; `edges[i]` joins `sites[i]` and `sites[i + 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CdtTriangle {
    pub sites: [SiteId; 3],
    pub edges: [EdgeId; 3],
}

impl CdtTriangle {
    pub fn contains_site(&self, site: SiteId) -> bool {
        self.sites.contains(&site)
    }

    /// Index `i` such that `edges[i] == edge`.
    pub fn edge_index(&self, edge: EdgeId) -> Option<usize> {
        self.edges.iter().position(|&e| e == edge)
    }
}

// ─── Mesh Store ──────────────────────────────────────────────────────────────

/// Arena-based storage for sites, edges and triangles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshStore {
    pub sites: SlotMap<SiteId, CdtSite>,
    pub edges: SlotMap<EdgeId, CdtEdge>,
    pub triangles: SlotMap<TriangleId, CdtTriangle>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_site(&mut self, point: Point2d, owner: Option<usize>) -> SiteId {
        self.sites.insert(CdtSite {
            point,
            edges: Vec::new(),
            owner,
        })
    }

    pub fn point(&self, site: SiteId) -> Point2d {
        self.sites[site].point
    }

    /// Sweep order: larger y is later, ties broken by larger x.
    pub fn is_above(&self, a: SiteId, b: SiteId) -> bool {
        let (pa, pb) = (self.point(a), self.point(b));
        pa.y > pb.y || (pa.y == pb.y && pa.x > pb.x)
    }

    pub fn edge_between(&self, a: SiteId, b: SiteId) -> Option<EdgeId> {
        self.sites.get(a)?.edges.iter().copied().find(|&e| {
            let edge = &self.edges[e];
            edge.other_end(a) == b
        })
    }

    pub fn edge_points(&self, edge: EdgeId) -> (Point2d, Point2d) {
        let e = &self.edges[edge];
        (self.point(e.upper), self.point(e.lower))
    }

    pub fn get_or_create_edge(&mut self, a: SiteId, b: SiteId) -> EdgeId {
        if let Some(e) = self.edge_between(a, b) {
            return e;
        }
        let (upper, lower) = if self.is_above(a, b) { (a, b) } else { (b, a) };
        let id = self.edges.insert(CdtEdge {
            upper,
            lower,
            ccw_triangle: None,
            cw_triangle: None,
            constrained: false,
        });
        self.sites[a].edges.push(id);
        self.sites[b].edges.push(id);
        id
    }

    /// Detach an edge from its endpoints and drop it. Its triangles must already be gone.
    pub fn delete_edge(&mut self, edge: EdgeId) {
        if let Some(e) = self.edges.remove(edge) {
            for site in [e.upper, e.lower] {
                if let Some(s) = self.sites.get_mut(site) {
                    s.edges.retain(|&x| x != edge);
                }
            }
        }
    }

    /// Create the triangle `(a, b, c)`, creating missing edges and filling their slots.
    pub fn add_triangle(&mut self, a: SiteId, b: SiteId, c: SiteId) -> Result<TriangleId, CdtError> {
        let (pa, pb, pc) = (self.point(a), self.point(b), self.point(c));
        if (pb - pa).cross(&(pc - pa)) <= 0.0 {
            return Err(CdtError::TriangleOrientation { a: pa, b: pb, c: pc });
        }
        let sites = [a, b, c];
        let edges = [
            self.get_or_create_edge(a, b),
            self.get_or_create_edge(b, c),
            self.get_or_create_edge(c, a),
        ];

        // Check every slot before touching any of them.
        for i in 0..3 {
            let edge = &self.edges[edges[i]];
            let slot = if edge.upper == sites[i] {
                edge.ccw_triangle
            } else {
                edge.cw_triangle
            };
            if slot.is_some() {
                let (upper, lower) = self.edge_points(edges[i]);
                return Err(CdtError::EdgeSlotOccupied { upper, lower });
            }
        }

        let id = self.triangles.insert(CdtTriangle { sites, edges });
        for i in 0..3 {
            let edge = &mut self.edges[edges[i]];
            if edge.upper == sites[i] {
                edge.ccw_triangle = Some(id);
            } else {
                edge.cw_triangle = Some(id);
            }
        }
        Ok(id)
    }

    /// Drop a triangle and clear its edge slots. Edges are kept.
    pub fn remove_triangle(&mut self, triangle: TriangleId) {
        let Some(t) = self.triangles.remove(triangle) else {
            return;
        };
        for e in t.edges {
            if let Some(edge) = self.edges.get_mut(e) {
                if edge.ccw_triangle == Some(triangle) {
                    edge.ccw_triangle = None;
                }
                if edge.cw_triangle == Some(triangle) {
                    edge.cw_triangle = None;
                }
            }
        }
    }

    /// The sites of `triangle` rotated so the first two are the endpoints of `edge`.
    pub fn rotated_to_edge(
        &self,
        triangle: TriangleId,
        edge: EdgeId,
    ) -> Option<(SiteId, SiteId, SiteId)> {
        let t = self.triangles.get(triangle)?;
        let i = t.edge_index(edge)?;
        Some((t.sites[i], t.sites[(i + 1) % 3], t.sites[(i + 2) % 3]))
    }

    /// The triangle on `edge` containing `site` as its third vertex.
    pub fn triangle_with_apex(&self, edge: EdgeId, site: SiteId) -> Option<TriangleId> {
        let e = self.edges.get(edge)?;
        [e.ccw_triangle, e.cw_triangle]
            .into_iter()
            .flatten()
            .find(|&t| self.triangles[t].contains_site(site))
    }

    /// All triangles with `site` as a vertex, each listed once.
    pub fn triangles_around(&self, site: SiteId) -> Vec<TriangleId> {
        let mut out: Vec<TriangleId> = Vec::new();
        for &e in &self.sites[site].edges {
            let edge = &self.edges[e];
            for t in [edge.ccw_triangle, edge.cw_triangle].into_iter().flatten() {
                if !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        out
    }

    /// Replace the diagonal of the quadrilateral formed by the two triangles on `edge`.
    ///
    /// For triangles `(u, v, x)` and `(v, u, y)` the result is `(x, u, y)` and `(y, v, x)`.
    /// Returns the new diagonal `x - y`.
    pub fn flip(&mut self, edge: EdgeId) -> Result<EdgeId, CdtError> {
        let e = self.edges[edge];
        let (Some(t1), Some(t2)) = (e.ccw_triangle, e.cw_triangle) else {
            let (a, b) = self.edge_points(edge);
            return Err(CdtError::MissingTriangle { a, b });
        };
        let missing = || {
            let (a, b) = self.edge_points(edge);
            CdtError::MissingEdge { a, b }
        };
        let (u, v, x) = self.rotated_to_edge(t1, edge).ok_or_else(missing)?;
        let (_, _, y) = self.rotated_to_edge(t2, edge).ok_or_else(missing)?;

        self.remove_triangle(t1);
        self.remove_triangle(t2);
        self.delete_edge(edge);
        self.add_triangle(x, u, y)?;
        self.add_triangle(y, v, x)?;
        self.edge_between(x, y).ok_or_else(|| CdtError::MissingEdge {
            a: self.point(x),
            b: self.point(y),
        })
    }

    /// Delete every edge no triangle uses.
    pub fn prune_orphan_edges(&mut self) -> usize {
        let orphans: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, e)| e.triangle_count() == 0)
            .map(|(id, _)| id)
            .collect();
        for &e in &orphans {
            self.delete_edge(e);
        }
        orphans.len()
    }
}
