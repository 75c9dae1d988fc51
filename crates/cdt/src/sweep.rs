//! Sweep-line construction of the unconstrained triangulation.
//!
//! Sites are visited in increasing y (ties by increasing x). The *front* is the x-ordered
//! chain of edges bounding the triangulated area from above. It starts as the top of a
//! seed triangle made of two sentinel sites below every input site and the first site.
//! Each new site is hung off the front element under it, then the front is smoothed by
//! closing sharp reflex corners and deep basins next to it.

use std::cmp::Ordering;

use tracing::{debug, trace};

use layout_kernel::{BoundingBox, DISTANCE_EPSILON, Point2d, TOLERANCE};

use crate::config::CdtConfig;
use crate::error::CdtError;
use crate::legalize::Legalizer;
use crate::mesh::{EdgeId, MeshStore, SiteId};
use crate::predicates::{Orientation, orientation};

/// A front edge, stored with its left endpoint.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrontElement {
    pub left_site: SiteId,
    pub edge: EdgeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Sweep order comparison: y first, then x.
pub(crate) fn sweep_order(a: &Point2d, b: &Point2d) -> Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

/// Place the two seed sentinels below and beside the bounding box of `sites`.
pub(crate) fn add_sentinels(
    mesh: &mut MeshStore,
    sites: &[SiteId],
    config: &CdtConfig,
) -> (SiteId, SiteId) {
    let points: Vec<Point2d> = sites.iter().map(|&s| mesh.point(s)).collect();
    let bb = BoundingBox::from_points(&points);
    let size = (bb.max.x - bb.min.x)
        .max(bb.max.y - bb.min.y)
        .max(1e3 * DISTANCE_EPSILON);
    let margin = config.sentinel_margin_ratio.max(0.01) * size;
    let left = mesh.add_site(Point2d::new(bb.min.x - margin, bb.min.y - margin), None);
    let right = mesh.add_site(Point2d::new(bb.max.x + margin, bb.min.y - margin), None);
    (left, right)
}

/// Strict convex hull in counter-clockwise order; collinear boundary sites are left out.
pub(crate) fn convex_hull(mesh: &MeshStore, sites: &[SiteId]) -> Vec<SiteId> {
    let mut sorted = sites.to_vec();
    sorted.sort_by(|&a, &b| {
        let (pa, pb) = (mesh.point(a), mesh.point(b));
        pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
    });
    if sorted.len() < 3 {
        return sorted;
    }

    let keeps_turning = |hull: &[SiteId], next: SiteId| {
        let n = hull.len();
        n < 2
            || orientation(
                &mesh.point(hull[n - 2]),
                &mesh.point(hull[n - 1]),
                &mesh.point(next),
            ) == Orientation::Ccw
    };

    let mut hull: Vec<SiteId> = Vec::with_capacity(sorted.len() + 1);
    for &s in &sorted {
        while !keeps_turning(&hull, s) {
            hull.pop();
        }
        hull.push(s);
    }
    let lower_len = hull.len() + 1;
    for &s in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && !keeps_turning(&hull, s) {
            hull.pop();
        }
        hull.push(s);
    }
    hull.pop();
    hull
}

pub(crate) struct Sweep<'a> {
    mesh: &'a mut MeshStore,
    legalizer: &'a mut Legalizer,
    config: &'a CdtConfig,
    front: Vec<FrontElement>,
    right_sentinel: SiteId,
}

impl<'a> Sweep<'a> {
    /// Seed the front with the triangle `(left, right, first)`.
    pub fn start(
        mesh: &'a mut MeshStore,
        legalizer: &'a mut Legalizer,
        config: &'a CdtConfig,
        first: SiteId,
        (left, right): (SiteId, SiteId),
    ) -> Result<Self, CdtError> {
        mesh.add_triangle(left, right, first)?;
        let mut sweep = Self {
            mesh,
            legalizer,
            config,
            front: Vec::new(),
            right_sentinel: right,
        };
        let (e_left, e_right) = (sweep.edge(left, first)?, sweep.edge(first, right)?);
        sweep.front = vec![
            FrontElement {
                left_site: left,
                edge: e_left,
            },
            FrontElement {
                left_site: first,
                edge: e_right,
            },
        ];
        Ok(sweep)
    }

    // ─── Front access ────────────────────────────────────────────────────

    /// Front vertex `j`; the right sentinel closes the chain at `j == front.len()`.
    fn vertex(&self, j: usize) -> SiteId {
        self.front
            .get(j)
            .map_or(self.right_sentinel, |element| element.left_site)
    }

    fn at(&self, j: usize) -> Point2d {
        self.mesh.point(self.vertex(j))
    }

    /// Index of the rightmost real vertex. Index 0 is the left sentinel.
    fn last_real(&self) -> usize {
        self.front.len() - 1
    }

    fn edge(&self, a: SiteId, b: SiteId) -> Result<EdgeId, CdtError> {
        self.mesh
            .edge_between(a, b)
            .ok_or_else(|| CdtError::MissingEdge {
                a: self.mesh.point(a),
                b: self.mesh.point(b),
            })
    }

    #[cfg(test)]
    fn front_sites(&self) -> Vec<SiteId> {
        (0..=self.front.len()).map(|j| self.vertex(j)).collect()
    }

    // ─── Point events ────────────────────────────────────────────────────

    pub fn process(&mut self, site: SiteId) -> Result<(), CdtError> {
        let p = self.mesh.point(site);
        let mesh = &*self.mesh;
        let mut i = self
            .front
            .partition_point(|element| mesh.point(element.left_site).x <= p.x)
            .checked_sub(1)
            .ok_or(CdtError::FrontLookup(p.x))?;
        if i < self.last_real() && (self.at(i + 1).x - p.x).abs() < TOLERANCE {
            i += 1;
        }

        let k = if i >= 1 && (self.at(i).x - p.x).abs() < TOLERANCE {
            self.left_case(i, site)?
        } else {
            self.middle_case(i, site)?
        };

        let k = self.fill(k, Side::Right)?;
        let k = self.fill(k, Side::Left)?;
        let k = self.fill_basin(k, Side::Right)?;
        self.fill_basin(k, Side::Left)?;
        Ok(())
    }

    /// The site is directly above front vertex `i`: cover that vertex with two triangles.
    fn left_case(&mut self, i: usize, p: SiteId) -> Result<usize, CdtError> {
        let (l, a, b) = (self.vertex(i - 1), self.vertex(i), self.vertex(i + 1));
        self.mesh.add_triangle(l, a, p)?;
        self.mesh.add_triangle(a, b, p)?;
        let (e_la, e_ab) = (self.front[i - 1].edge, self.front[i].edge);
        self.front[i - 1].edge = self.edge(l, p)?;
        self.front[i] = FrontElement {
            left_site: p,
            edge: self.edge(p, b)?,
        };
        trace!(index = i, "left case");
        self.legalizer.legalize(self.mesh, e_la, p)?;
        self.legalizer.legalize(self.mesh, e_ab, p)?;
        Ok(i)
    }

    /// The site is strictly inside the x-span of front element `i`.
    fn middle_case(&mut self, i: usize, p: SiteId) -> Result<usize, CdtError> {
        let (a, b) = (self.vertex(i), self.vertex(i + 1));
        self.mesh.add_triangle(a, b, p)?;
        let e_ab = self.front[i].edge;
        self.front[i].edge = self.edge(a, p)?;
        let right = FrontElement {
            left_site: p,
            edge: self.edge(p, b)?,
        };
        self.front.insert(i + 1, right);
        trace!(index = i, "middle case");
        self.legalizer.legalize(self.mesh, e_ab, p)?;
        Ok(i + 1)
    }

    // ─── Front smoothing ─────────────────────────────────────────────────

    /// Close front vertex `j` with the triangle over its two neighbours.
    fn shortcut(&mut self, j: usize) -> Result<(), CdtError> {
        let (u, v, w) = (self.vertex(j - 1), self.vertex(j), self.vertex(j + 1));
        self.mesh.add_triangle(u, v, w)?;
        let (e_uv, e_vw) = (self.front[j - 1].edge, self.front[j].edge);
        self.front[j - 1].edge = self.edge(u, w)?;
        self.front.remove(j);
        self.legalizer.legalize(self.mesh, e_uv, w)?;
        self.legalizer.legalize(self.mesh, e_vw, u)?;
        Ok(())
    }

    /// Walk away from front vertex `k`, closing reflex corners sharper than a right angle.
    /// Returns the new index of the vertex at `k`.
    fn fill(&mut self, mut k: usize, side: Side) -> Result<usize, CdtError> {
        loop {
            let (u, v, w, j) = match side {
                Side::Right if k + 2 <= self.last_real() => {
                    (self.at(k), self.at(k + 1), self.at(k + 2), k + 1)
                }
                Side::Left if k >= 3 => (self.at(k - 2), self.at(k - 1), self.at(k), k - 1),
                _ => break,
            };
            let reflex = orientation(&u, &v, &w) == Orientation::Ccw;
            if !reflex || (u - v).dot(&(w - v)) <= 0.0 {
                break;
            }
            self.shortcut(j)?;
            if side == Side::Left {
                k -= 1;
            }
        }
        Ok(k)
    }

    /// Fill the basin beside front vertex `k`, if it is deep enough.
    ///
    /// The basin runs downhill from `k` to its bottom and then uphill to its rim.
    fn fill_basin(&mut self, k: usize, side: Side) -> Result<usize, CdtError> {
        let last = self.last_real();
        let (bottom, rim) = match side {
            Side::Right => {
                if k + 2 > last {
                    return Ok(k);
                }
                let mut bottom = k + 1;
                while bottom < last && self.at(bottom + 1).y < self.at(bottom).y {
                    bottom += 1;
                }
                let mut rim = bottom;
                while rim < last && self.at(rim + 1).y >= self.at(rim).y {
                    rim += 1;
                }
                (bottom, rim)
            }
            Side::Left => {
                if k < 3 {
                    return Ok(k);
                }
                let mut bottom = k - 1;
                while bottom > 1 && self.at(bottom - 1).y < self.at(bottom).y {
                    bottom -= 1;
                }
                let mut rim = bottom;
                while rim > 1 && self.at(rim - 1).y >= self.at(rim).y {
                    rim -= 1;
                }
                (bottom, rim)
            }
        };
        if rim == bottom {
            return Ok(k);
        }

        let (pk, pb, pr) = (self.at(k), self.at(bottom), self.at(rim));
        let depth = pk.y.min(pr.y) - pb.y;
        let width = (pr.x - pk.x).abs();
        if depth <= self.config.basin_shallow_ratio * width {
            return Ok(k);
        }

        let removed = match side {
            Side::Right => self.fill_pocket(k, rim)?,
            Side::Left => self.fill_pocket(rim, k)?,
        };
        debug!(?side, removed, "basin filled");
        Ok(match side {
            Side::Right => k,
            Side::Left => k - removed,
        })
    }

    /// Close every reflex corner strictly between front vertices `lo` and `hi`.
    /// Returns how many front vertices were removed.
    fn fill_pocket(&mut self, lo: usize, hi: usize) -> Result<usize, CdtError> {
        let mut hi = hi;
        let mut removed = 0;
        let mut j = lo + 1;
        while j < hi {
            if orientation(&self.at(j - 1), &self.at(j), &self.at(j + 1)) == Orientation::Ccw {
                self.shortcut(j)?;
                hi -= 1;
                removed += 1;
                if j > lo + 1 {
                    j -= 1;
                }
            } else {
                j += 1;
            }
        }
        Ok(removed)
    }

    /// Make the chain of real front vertices convex from above.
    pub fn convexify(&mut self) -> Result<usize, CdtError> {
        let last = self.last_real();
        if last < 3 {
            return Ok(0);
        }
        let removed = self.fill_pocket(1, last)?;
        debug!(removed, "upper front convexified");
        Ok(removed)
    }
}
