//! Configuration for the triangulation builder.

/// Algorithm knobs for a triangulation run. Distances that decide coincidence and
/// collinearity are the kernel tolerances and are not configured here.
#[derive(Debug, Clone, Copy)]
pub struct CdtConfig {
    /// Distance of the two seed sentinels from the site bounding box, as a fraction of the
    /// larger box side.
    pub sentinel_margin_ratio: f64,
    /// Whether a Lawson flip pass runs over the finished mesh.
    pub final_legalization: bool,
    /// Maximum number of edge flips over a whole run.
    pub flip_budget: usize,
    /// A basin whose depth is below this fraction of its width is left to legalization
    /// instead of being filled.
    pub basin_shallow_ratio: f64,
}

impl Default for CdtConfig {
    fn default() -> Self {
        Self {
            sentinel_margin_ratio: 0.3,
            final_legalization: true,
            flip_budget: 1 << 22,
            basin_shallow_ratio: 0.1,
        }
    }
}

impl CdtConfig {
    /// Sweep-time legalization only. Faster, but edges forced along the hull or across
    /// collinear runs may be left non-Delaunay.
    pub fn sweep_only() -> Self {
        Self {
            final_legalization: false,
            ..Self::default()
        }
    }

    /// Fills every basin regardless of depth.
    pub fn eager_basins() -> Self {
        Self {
            basin_shallow_ratio: 0.0,
            ..Self::default()
        }
    }
}
