//! Bounding-parallelogram hierarchy over a curve's parameter domain.
//!
//! Every simple curve gets a binary tree whose leaves bound short, nearly straight
//! pieces. Leaves can be split further on demand when the intersection engine needs
//! a tighter bound than the prebuilt tree offers.

use super::curves::Curve;
use super::parallelogram::Parallelogram;
use super::point::Point2d;
use crate::{DISTANCE_EPSILON, TOLERANCE};

// ─── Configuration ─────────────────────────────────────────────────────────

/// Knobs for tree construction and on-demand refinement.
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    /// Prebuilt leaves are flat to this fraction of the curve's box diagonal.
    pub leaf_flatness_ratio: f64,
    /// Depth limit of the prebuilt tree.
    pub max_tree_depth: usize,
    /// How many times the intersection engine may split a leaf pair further.
    pub max_refine_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            leaf_flatness_ratio: 1.0 / 64.0,
            max_tree_depth: 16,
            max_refine_depth: 24,
        }
    }
}

// ─── Nodes ─────────────────────────────────────────────────────────────────

/// Straight stand-in for a leaf that is flat within `DISTANCE_EPSILON`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    pub start: Point2d,
    pub end: Point2d,
}

#[derive(Debug, Clone)]
pub struct ParallelogramLeaf {
    /// Index into `Curve::pieces()` of the owning curve.
    pub segment: usize,
    pub low: f64,
    pub high: f64,
    /// Half-thickness this leaf was sized against.
    pub offset: f64,
    pub chord: Option<Chord>,
    pub parallelogram: Parallelogram,
}

#[derive(Debug, Clone)]
pub struct ParallelogramInternal {
    pub parallelogram: Parallelogram,
    pub children: Vec<ParallelogramNode>,
}

#[derive(Debug, Clone)]
pub enum ParallelogramNode {
    Leaf(ParallelogramLeaf),
    Internal(ParallelogramInternal),
}

impl ParallelogramNode {
    pub fn parallelogram(&self) -> &Parallelogram {
        match self {
            ParallelogramNode::Leaf(l) => &l.parallelogram,
            ParallelogramNode::Internal(n) => &n.parallelogram,
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            ParallelogramNode::Leaf(_) => 1,
            ParallelogramNode::Internal(n) => n.children.iter().map(|c| c.leaf_count()).sum(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ParallelogramNode::Leaf(_) => 0,
            ParallelogramNode::Internal(n) => {
                1 + n.children.iter().map(|c| c.depth()).max().unwrap_or(0)
            }
        }
    }

    /// All leaves in parameter order.
    pub fn leaves(&self) -> Vec<&ParallelogramLeaf> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ParallelogramNode::Leaf(l) => out.push(l),
                ParallelogramNode::Internal(n) => stack.extend(n.children.iter().rev()),
            }
        }
        out
    }
}

impl ParallelogramLeaf {
    /// Split into two leaves with half the offset, or `None` when the leaf is already
    /// a chord or its span cannot shrink further.
    pub fn refine(&self, piece: &Curve) -> Option<[ParallelogramLeaf; 2]> {
        if self.chord.is_some() || self.high - self.low < TOLERANCE {
            return None;
        }
        let offset = (0.5 * self.offset).max(DISTANCE_EPSILON);
        let mid = 0.5 * (self.low + self.high);
        Some([
            make_leaf(piece, self.segment, self.low, mid, offset)?,
            make_leaf(piece, self.segment, mid, self.high, offset)?,
        ])
    }
}

// ─── Construction ──────────────────────────────────────────────────────────

/// Tree for a simple (non-composite) piece.
pub fn build_tree(piece: &Curve, segment: usize, config: &HierarchyConfig) -> ParallelogramNode {
    let offset = (piece.bounding_box().diagonal() * config.leaf_flatness_ratio).max(DISTANCE_EPSILON);
    build_node(
        piece,
        segment,
        piece.par_start(),
        piece.par_end(),
        offset,
        0,
        config,
    )
}

/// One subtree per segment under a root bounding all of them.
pub fn build_composite_tree(segments: &[Curve], config: &HierarchyConfig) -> ParallelogramNode {
    let children: Vec<ParallelogramNode> = segments
        .iter()
        .enumerate()
        .map(|(i, s)| build_tree(s, i, config))
        .collect();
    let (start, end) = match (segments.first(), segments.last()) {
        (Some(f), Some(l)) => (f.start(), l.end()),
        _ => (Point2d::ORIGIN, Point2d::ORIGIN),
    };
    let vertices: Vec<Point2d> = children
        .iter()
        .flat_map(|c| c.parallelogram().vertices())
        .collect();
    ParallelogramNode::Internal(ParallelogramInternal {
        parallelogram: Parallelogram::around_chord(start, end, &vertices),
        children,
    })
}

fn build_node(
    piece: &Curve,
    segment: usize,
    low: f64,
    high: f64,
    offset: f64,
    depth: usize,
    config: &HierarchyConfig,
) -> ParallelogramNode {
    if let Some(hull) = piece.control_hull(low, high) {
        let (start, end) = (piece.value(low), piece.value(high));
        let flat = hull_thickness(start, end, &hull) <= offset;
        if flat || depth >= config.max_tree_depth || high - low < TOLERANCE {
            if let Some(leaf) = leaf_from_hull(segment, low, high, offset, start, end, &hull) {
                return ParallelogramNode::Leaf(leaf);
            }
        }
    }

    let mid = 0.5 * (low + high);
    let children = vec![
        build_node(piece, segment, low, mid, offset, depth + 1, config),
        build_node(piece, segment, mid, high, offset, depth + 1, config),
    ];
    let vertices: Vec<Point2d> = children
        .iter()
        .flat_map(|c| c.parallelogram().vertices())
        .collect();
    ParallelogramNode::Internal(ParallelogramInternal {
        parallelogram: Parallelogram::around_chord(piece.value(low), piece.value(high), &vertices),
        children,
    })
}

fn make_leaf(
    piece: &Curve,
    segment: usize,
    low: f64,
    high: f64,
    offset: f64,
) -> Option<ParallelogramLeaf> {
    let hull = piece.control_hull(low, high)?;
    leaf_from_hull(
        segment,
        low,
        high,
        offset,
        piece.value(low),
        piece.value(high),
        &hull,
    )
}

fn leaf_from_hull(
    segment: usize,
    low: f64,
    high: f64,
    offset: f64,
    start: Point2d,
    end: Point2d,
    hull: &[Point2d],
) -> Option<ParallelogramLeaf> {
    if hull.is_empty() {
        return None;
    }
    let thickness = hull_thickness(start, end, hull);
    let chord = (thickness <= DISTANCE_EPSILON).then_some(Chord { start, end });
    Some(ParallelogramLeaf {
        segment,
        low,
        high,
        offset,
        chord,
        parallelogram: Parallelogram::around_chord(start, end, hull),
    })
}

/// Largest distance of a hull point from the chord line (or from `start` for a
/// degenerate chord).
fn hull_thickness(start: Point2d, end: Point2d, hull: &[Point2d]) -> f64 {
    let chord = end - start;
    match chord.normalized() {
        Some(u) => hull
            .iter()
            .map(|p| (*p - start).cross(&u).abs())
            .fold(0.0, f64::max),
        None => hull
            .iter()
            .map(|p| p.distance_to(&start))
            .fold(0.0, f64::max),
    }
}
