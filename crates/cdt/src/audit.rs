use tracing::{info, instrument};

use crate::legalize::is_illegal;
use crate::mesh::{EdgeId, MeshStore, SiteId, TriangleId};
use crate::triangulation::Cdt;

/// Result of checking a mesh against its structural invariants.
#[derive(Debug, Clone)]
pub struct MeshAudit {
    pub all_ccw: bool,
    pub adjacency_consistent: bool,
    pub no_dangling_edges: bool,
    /// Vertices minus edges plus triangles equals one, as for a triangulated disk.
    pub euler_valid: bool,
    pub locally_delaunay: bool,
    pub errors: Vec<MeshError>,
}

#[derive(Debug, Clone)]
pub enum MeshError {
    NotCounterClockwise {
        triangle: TriangleId,
    },
    /// A triangle lists an edge that does not join its corners or does not point back.
    TriangleEdgeMismatch {
        triangle: TriangleId,
        edge: EdgeId,
    },
    /// An edge slot names a triangle that does not list the edge.
    EdgeSlotMismatch {
        edge: EdgeId,
        triangle: TriangleId,
    },
    SiteEdgeMismatch {
        site: SiteId,
        edge: EdgeId,
    },
    DanglingEdge {
        edge: EdgeId,
    },
    EulerViolation {
        v: usize,
        e: usize,
        f: usize,
    },
    NonDelaunay {
        edge: EdgeId,
    },
}

impl MeshAudit {
    /// Structure is sound; the Delaunay flag is reported separately.
    pub fn structurally_valid(&self) -> bool {
        self.all_ccw && self.adjacency_consistent && self.no_dangling_edges && self.euler_valid
    }

    pub fn all_valid(&self) -> bool {
        self.structurally_valid() && self.locally_delaunay
    }
}

/// Audit a finished triangulation.
#[instrument(skip(cdt))]
pub fn audit(cdt: &Cdt) -> MeshAudit {
    let audit = audit_mesh(cdt.mesh());
    info!(
        all_ccw = audit.all_ccw,
        adjacency_consistent = audit.adjacency_consistent,
        no_dangling_edges = audit.no_dangling_edges,
        euler_valid = audit.euler_valid,
        locally_delaunay = audit.locally_delaunay,
        error_count = audit.errors.len(),
        "mesh audit complete"
    );
    audit
}

pub fn audit_mesh(mesh: &MeshStore) -> MeshAudit {
    let mut errors = Vec::new();
    let mut all_ccw = true;
    let mut adjacency_consistent = true;
    let mut no_dangling_edges = true;
    let mut locally_delaunay = true;

    for (tid, t) in &mesh.triangles {
        let [a, b, c] = t.sites.map(|s| mesh.point(s));
        if (b - a).cross(&(c - a)) <= 0.0 {
            all_ccw = false;
            errors.push(MeshError::NotCounterClockwise { triangle: tid });
        }
        for i in 0..3 {
            let eid = t.edges[i];
            let (s0, s1) = (t.sites[i], t.sites[(i + 1) % 3]);
            let consistent = mesh.edges.get(eid).is_some_and(|e| {
                let joins = (e.upper == s0 && e.lower == s1) || (e.upper == s1 && e.lower == s0);
                let slot = if e.upper == s0 {
                    e.ccw_triangle
                } else {
                    e.cw_triangle
                };
                joins && slot == Some(tid)
            });
            if !consistent {
                adjacency_consistent = false;
                errors.push(MeshError::TriangleEdgeMismatch {
                    triangle: tid,
                    edge: eid,
                });
            }
        }
    }

    for (eid, e) in &mesh.edges {
        if e.triangle_count() == 0 {
            no_dangling_edges = false;
            errors.push(MeshError::DanglingEdge { edge: eid });
        }
        for t in [e.ccw_triangle, e.cw_triangle].into_iter().flatten() {
            if !mesh.triangles.get(t).is_some_and(|tri| tri.edges.contains(&eid)) {
                adjacency_consistent = false;
                errors.push(MeshError::EdgeSlotMismatch {
                    edge: eid,
                    triangle: t,
                });
            }
        }
        for site in [e.upper, e.lower] {
            if !mesh.sites.get(site).is_some_and(|s| s.edges.contains(&eid)) {
                adjacency_consistent = false;
                errors.push(MeshError::SiteEdgeMismatch { site, edge: eid });
            }
        }
        if is_illegal(mesh, eid) {
            locally_delaunay = false;
            errors.push(MeshError::NonDelaunay { edge: eid });
        }
    }

    let (v, e, f) = (mesh.sites.len(), mesh.edges.len(), mesh.triangles.len());
    let euler_valid = f == 0 || v as i64 - e as i64 + f as i64 == 1;
    if !euler_valid {
        errors.push(MeshError::EulerViolation { v, e, f });
    }

    MeshAudit {
        all_ccw,
        adjacency_consistent,
        no_dangling_edges,
        euler_valid,
        locally_delaunay,
        errors,
    }
}
