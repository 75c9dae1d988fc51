//! Constrained Delaunay triangulation for layout meshes.
//!
//! Sites are swept bottom to top against an x-ordered front, forced segments are dug
//! into the finished sweep, and a final flip pass restores the empty-circle property
//! everywhere except across constrained edges.

pub mod audit;
pub mod config;
pub mod error;
pub mod legalize;
pub mod mesh;
pub mod predicates;
pub mod triangulation;

mod inserter;
mod sweep;

pub use audit::{MeshAudit, MeshError, audit, audit_mesh};
pub use config::CdtConfig;
pub use error::CdtError;
pub use mesh::{CdtEdge, CdtSite, CdtTriangle, EdgeId, MeshStore, SiteId, TriangleId};
pub use predicates::{Orientation, in_circle, orientation};
pub use triangulation::Cdt;
