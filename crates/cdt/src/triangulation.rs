use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use layout_kernel::{DISTANCE_EPSILON, Point2d};

use crate::config::CdtConfig;
use crate::error::CdtError;
use crate::inserter::insert_segment;
use crate::legalize::Legalizer;
use crate::mesh::{CdtEdge, CdtSite, CdtTriangle, EdgeId, MeshStore, SiteId, TriangleId};
use crate::sweep::{Sweep, add_sentinels, convex_hull, sweep_order};

/// Side of a grid cell in the site lookup; at least the coincidence distance so that
/// coincident points always fall in neighbouring cells.
const CELL_SIZE: f64 = 4.0 * DISTANCE_EPSILON;

/// Constrained Delaunay triangulation of a point set.
///
/// Collect sites and segments, then call [`Cdt::run`]. Segments added after the run are
/// inserted into the finished mesh directly and must join existing sites.
#[derive(Debug, Clone)]
pub struct Cdt {
    config: CdtConfig,
    mesh: MeshStore,
    segments: Vec<(SiteId, SiteId)>,
    grid: HashMap<(i64, i64), Vec<SiteId>>,
    polylines: usize,
    flips: usize,
    finished: bool,
}

impl Cdt {
    pub fn new(points: &[Point2d]) -> Self {
        Self::with_config(points, CdtConfig::default())
    }

    pub fn with_config(points: &[Point2d], config: CdtConfig) -> Self {
        let mut cdt = Self {
            config,
            mesh: MeshStore::new(),
            segments: Vec::new(),
            grid: HashMap::new(),
            polylines: 0,
            flips: 0,
            finished: false,
        };
        for p in points {
            cdt.site_for(*p, None);
        }
        cdt
    }

    // ─── Input ───────────────────────────────────────────────────────────

    fn cell(p: &Point2d) -> (i64, i64) {
        ((p.x / CELL_SIZE).floor() as i64, (p.y / CELL_SIZE).floor() as i64)
    }

    /// The site within `DISTANCE_EPSILON` of `point`, if any.
    pub fn site_at(&self, point: &Point2d) -> Option<SiteId> {
        let (cx, cy) = Self::cell(point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(ids) = self.grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                if let Some(&id) = ids
                    .iter()
                    .find(|&&id| self.mesh.sites.get(id).is_some_and(|s| s.point.close_to(point)))
                {
                    return Some(id);
                }
            }
        }
        None
    }

    fn site_for(&mut self, point: Point2d, owner: Option<usize>) -> Option<SiteId> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            warn!(?point, "ignoring non-finite site");
            return None;
        }
        if let Some(id) = self.site_at(&point) {
            let site = &mut self.mesh.sites[id];
            if site.owner.is_none() {
                site.owner = owner;
            }
            return Some(id);
        }
        let id = self.mesh.add_site(point, owner);
        self.grid.entry(Self::cell(&point)).or_default().push(id);
        Some(id)
    }

    fn resolve(&mut self, point: Point2d, owner: Option<usize>) -> Result<SiteId, CdtError> {
        let site = if self.finished {
            self.site_at(&point)
        } else {
            self.site_for(point, owner)
        };
        site.ok_or(CdtError::UnknownSite(point))
    }

    /// Require the segment `a - b` to appear as mesh edges.
    pub fn add_segment(&mut self, a: Point2d, b: Point2d) -> Result<(), CdtError> {
        let (sa, sb) = (self.resolve(a, None)?, self.resolve(b, None)?);
        self.push_segment(sa, sb)
    }

    /// Add a closed polyline whose sides become constrained segments. Returns the owner
    /// index stamped on its sites.
    pub fn add_polyline(&mut self, points: &[Point2d]) -> Result<usize, CdtError> {
        let owner = self.polylines;
        self.polylines += 1;
        let sites = points
            .iter()
            .map(|&p| self.resolve(p, Some(owner)))
            .collect::<Result<Vec<_>, _>>()?;
        for w in sites.windows(2) {
            self.push_segment(w[0], w[1])?;
        }
        if let (true, Some(&first), Some(&last)) = (sites.len() > 2, sites.first(), sites.last()) {
            self.push_segment(last, first)?;
        }
        Ok(owner)
    }

    fn push_segment(&mut self, a: SiteId, b: SiteId) -> Result<(), CdtError> {
        if a == b {
            return Ok(());
        }
        if self.finished {
            insert_segment(&mut self.mesh, a, b, true)?;
        }
        self.segments.push((a, b));
        Ok(())
    }

    // ─── Build ───────────────────────────────────────────────────────────

    /// Triangulate the sites, force the segments and legalize.
    ///
    /// Segments over collinear input fail with `SegmentLeavesMesh`, since no triangle
    /// can border them. On error the mesh is left part-way and should be discarded.
    /// Running twice is a no-op.
    #[instrument(skip(self), fields(sites = self.mesh.sites.len(), segments = self.segments.len()))]
    pub fn run(&mut self) -> Result<(), CdtError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let mut order: Vec<SiteId> = self.mesh.sites.keys().collect();
        let mesh = &self.mesh;
        order.sort_by(|&a, &b| sweep_order(&mesh.point(a), &mesh.point(b)));
        let Some(&first) = order.first() else {
            info!("no sites to triangulate");
            return Ok(());
        };

        let sentinels = add_sentinels(&mut self.mesh, &order, &self.config);
        let mut legalizer = Legalizer::new(self.config.flip_budget);
        {
            let mut sweep =
                Sweep::start(&mut self.mesh, &mut legalizer, &self.config, first, sentinels)?;
            for &site in &order[1..] {
                sweep.process(site)?;
            }
            sweep.convexify()?;
        }
        debug!(
            triangles = self.mesh.triangles.len(),
            flips = legalizer.flips,
            "sweep complete"
        );

        self.complete_hull(&order)?;
        for &(a, b) in &self.segments {
            insert_segment(&mut self.mesh, a, b, true)?;
        }
        self.remove_sentinels(sentinels);
        // Collinear input leaves no triangles for constrained edges to border.
        if self.mesh.triangles.is_empty() {
            if let Some(&(a, b)) = self.segments.first() {
                for &(s, t) in &self.segments {
                    warn!(
                        from = ?self.mesh.point(s),
                        to = ?self.mesh.point(t),
                        "constraint has no triangulated region"
                    );
                }
                return Err(CdtError::SegmentLeavesMesh {
                    from: self.mesh.point(a),
                    to: self.mesh.point(b),
                });
            }
        }
        if self.config.final_legalization {
            legalizer.lawson_pass(&mut self.mesh)?;
        }
        self.flips = legalizer.flips;

        info!(
            sites = self.mesh.sites.len(),
            triangles = self.mesh.triangles.len(),
            constraints = self.segments.len(),
            flips = self.flips,
            "triangulation complete"
        );
        Ok(())
    }

    /// Force every convex hull edge missing from the swept mesh.
    fn complete_hull(&mut self, sites: &[SiteId]) -> Result<usize, CdtError> {
        let hull = convex_hull(&self.mesh, sites);
        if hull.len() < 3 {
            return Ok(0);
        }
        let mut forced = 0;
        for i in 0..hull.len() {
            let (a, b) = (hull[i], hull[(i + 1) % hull.len()]);
            if self.mesh.edge_between(a, b).is_none() {
                insert_segment(&mut self.mesh, a, b, false)?;
                forced += 1;
            }
        }
        debug!(hull = hull.len(), forced, "hull edges forced");
        Ok(forced)
    }

    fn remove_sentinels(&mut self, (left, right): (SiteId, SiteId)) {
        let doomed: Vec<TriangleId> = self
            .mesh
            .triangles
            .iter()
            .filter(|(_, t)| t.contains_site(left) || t.contains_site(right))
            .map(|(id, _)| id)
            .collect();
        for &t in &doomed {
            self.mesh.remove_triangle(t);
        }
        let pruned = self.mesh.prune_orphan_edges();
        self.mesh.sites.remove(left);
        self.mesh.sites.remove(right);
        debug!(triangles = doomed.len(), edges = pruned, "sentinels removed");
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &CdtConfig {
        &self.config
    }

    pub fn mesh(&self) -> &MeshStore {
        &self.mesh
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Flips made by the last run.
    pub fn flips(&self) -> usize {
        self.flips
    }

    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &CdtTriangle)> {
        self.mesh.triangles.iter()
    }

    /// Triangle corners in counter-clockwise order.
    pub fn triangle_points(&self) -> Vec<[Point2d; 3]> {
        self.mesh
            .triangles
            .values()
            .map(|t| t.sites.map(|s| self.mesh.point(s)))
            .collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &CdtEdge)> {
        self.mesh.edges.iter()
    }

    pub fn sites(&self) -> impl Iterator<Item = (SiteId, &CdtSite)> {
        self.mesh.sites.iter()
    }

    pub fn edge_between(&self, a: SiteId, b: SiteId) -> Option<EdgeId> {
        self.mesh.edge_between(a, b)
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangles.len()
    }

    /// Whether a constrained edge joins the sites at `a` and `b`. A segment split at
    /// intermediate sites is reported per piece, not end to end.
    pub fn is_constrained(&self, a: &Point2d, b: &Point2d) -> bool {
        let (Some(sa), Some(sb)) = (self.site_at(a), self.site_at(b)) else {
            return false;
        };
        self.mesh
            .edge_between(sa, sb)
            .is_some_and(|e| self.mesh.edges[e].constrained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2d {
        Point2d::new(x, y)
    }

    #[test]
    fn test_duplicate_points_share_a_site() {
        let cdt = Cdt::new(&[p(0.0, 0.0), p(1e-8, -1e-8), p(1.0, 0.0)]);
        assert_eq!(cdt.sites().count(), 2);
        assert_eq!(cdt.site_at(&p(0.0, 0.0)), cdt.site_at(&p(2e-7, 0.0)));
        assert!(cdt.site_at(&p(0.5, 0.0)).is_none());
    }

    #[test]
    fn test_non_finite_points_are_skipped() {
        let cdt = Cdt::new(&[p(f64::NAN, 0.0), p(0.0, f64::INFINITY), p(1.0, 1.0)]);
        assert_eq!(cdt.sites().count(), 1);
    }

    #[test]
    fn test_polyline_tags_owner_and_closes() {
        let mut cdt = Cdt::new(&[]);
        let square = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert_eq!(cdt.add_polyline(&square).unwrap(), 0);
        assert_eq!(cdt.add_polyline(&[p(5.0, 5.0), p(6.0, 5.0)]).unwrap(), 1);
        assert_eq!(cdt.segments.len(), 5);
        let owner = cdt.mesh.sites[cdt.site_at(&p(1.0, 1.0)).unwrap()].owner;
        assert_eq!(owner, Some(0));
    }

    #[test]
    fn test_empty_and_tiny_inputs() {
        let mut empty = Cdt::new(&[]);
        empty.run().unwrap();
        assert_eq!(empty.triangle_count(), 0);

        let mut two = Cdt::new(&[p(0.0, 0.0), p(1.0, 1.0)]);
        two.run().unwrap();
        assert_eq!(two.triangle_count(), 0);
        assert_eq!(two.sites().count(), 2);
    }

    #[test]
    fn test_single_triangle() {
        let mut cdt = Cdt::new(&[p(0.0, 0.0), p(2.0, 0.0), p(1.0, 1.5)]);
        cdt.run().unwrap();
        assert_eq!(cdt.triangle_count(), 1);
        assert_eq!(cdt.edges().count(), 3);
        assert!(cdt.edges().all(|(_, e)| e.triangle_count() == 1));
    }

    #[test]
    fn test_collinear_sites_give_no_triangles() {
        let mut cdt = Cdt::new(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)]);
        cdt.run().unwrap();
        assert_eq!(cdt.triangle_count(), 0);
        assert_eq!(cdt.edges().count(), 0);
    }

    #[test]
    fn test_collinear_sites_reject_constraints() {
        let mut cdt = Cdt::new(&[p(2.0, 2.0), p(2.0, 1.0), p(2.0, 0.0)]);
        cdt.add_segment(p(2.0, 2.0), p(2.0, 0.0)).unwrap();
        assert!(matches!(
            cdt.run(),
            Err(CdtError::SegmentLeavesMesh { .. })
        ));
        assert_eq!(cdt.triangle_count(), 0);

        let mut late = Cdt::new(&[p(0.0, 0.0), p(1.0, 0.0), p(3.0, 0.0)]);
        late.run().unwrap();
        assert!(late.add_segment(p(0.0, 0.0), p(3.0, 0.0)).is_err());
    }

    #[test]
    fn test_segment_after_run_needs_known_sites() {
        let mut cdt = Cdt::new(&[p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]);
        cdt.run().unwrap();
        assert!(matches!(
            cdt.add_segment(p(0.0, 0.0), p(9.0, 9.0)),
            Err(CdtError::UnknownSite(_))
        ));
        cdt.add_segment(p(0.0, 0.0), p(2.0, 2.0)).unwrap();
        assert!(cdt.is_constrained(&p(2.0, 2.0), &p(0.0, 0.0)));
        assert_eq!(cdt.triangle_count(), 2);
    }
}
