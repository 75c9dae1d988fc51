use super::curves::{Curve, CurveCache, CurveError, ordered};
use super::point::Point2d;
use super::transform::{BoundingBox, Transform2d};
use super::vector::Vec2;
use crate::DISTANCE_EPSILON;

/// A contiguous chain of simple curves.
///
/// The global parameter runs from zero and each segment occupies a span equal to
/// its own parameter span, in order. Nested composites are flattened on insertion.
#[derive(Debug, Clone)]
pub struct Composite {
    segments: Vec<Curve>,
    /// Global parameter at which each segment starts.
    starts: Vec<f64>,
    par_end: f64,
    pub(crate) cache: CurveCache,
}

impl Composite {
    pub fn new(segments: Vec<Curve>) -> Result<Self, CurveError> {
        let mut composite = Self {
            segments: Vec::new(),
            starts: Vec::new(),
            par_end: 0.0,
            cache: CurveCache::default(),
        };
        for segment in segments {
            composite.push(segment)?;
        }
        if composite.segments.is_empty() {
            return Err(CurveError::EmptyComposite);
        }
        Ok(composite)
    }

    /// Chain of line segments through `points`, closed back to the first point if asked.
    pub fn polyline(points: &[Point2d], closed: bool) -> Result<Self, CurveError> {
        let mut segments = Vec::new();
        for pair in points.windows(2) {
            if !pair[0].close_to(&pair[1]) {
                segments.push(Curve::line(pair[0], pair[1]));
            }
        }
        if closed {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if !first.close_to(last) {
                    segments.push(Curve::line(*last, *first));
                }
            }
        }
        Self::new(segments)
    }

    /// Append a segment to the end of the chain.
    pub fn push(&mut self, segment: Curve) -> Result<(), CurveError> {
        if let Curve::Composite(inner) = segment {
            for child in inner.segments {
                self.push(child)?;
            }
            return Ok(());
        }
        if let Some(last) = self.segments.last() {
            let gap = last.end().distance_to(&segment.start());
            if gap > DISTANCE_EPSILON {
                return Err(CurveError::Discontinuous {
                    index: self.segments.len() - 1,
                    gap,
                });
            }
        }
        self.starts.push(self.par_end);
        self.par_end += segment.par_end() - segment.par_start();
        self.segments.push(segment);
        self.cache.clear();
        Ok(())
    }

    /// Build from pieces already known to be contiguous.
    fn from_contiguous(segments: Vec<Curve>) -> Self {
        let mut starts = Vec::with_capacity(segments.len());
        let mut par_end = 0.0;
        for s in &segments {
            starts.push(par_end);
            par_end += s.par_end() - s.par_start();
        }
        Self {
            segments,
            starts,
            par_end,
            cache: CurveCache::default(),
        }
    }

    pub fn segments(&self) -> &[Curve] {
        &self.segments
    }

    pub fn par_end(&self) -> f64 {
        self.par_end
    }

    fn segment_index(&self, t: f64) -> usize {
        self.starts
            .partition_point(|s| *s <= t)
            .saturating_sub(1)
            .min(self.segments.len() - 1)
    }

    /// Segment covering the global parameter `t`, with the matching local parameter.
    pub fn segment_at(&self, t: f64) -> (usize, &Curve, f64) {
        let i = self.segment_index(t);
        let seg = &self.segments[i];
        let local = (seg.par_start() + (t - self.starts[i])).clamp(seg.par_start(), seg.par_end());
        (i, seg, local)
    }

    pub fn global_parameter(&self, index: usize, local: f64) -> f64 {
        let seg = &self.segments[index];
        self.starts[index] + (local - seg.par_start())
    }

    pub fn value(&self, t: f64) -> Point2d {
        let (_, seg, local) = self.segment_at(t);
        seg.value(local)
    }

    pub fn derivative(&self, t: f64) -> Vec2 {
        let (_, seg, local) = self.segment_at(t);
        seg.derivative(local)
    }

    pub fn second_derivative(&self, t: f64) -> Vec2 {
        let (_, seg, local) = self.segment_at(t);
        seg.second_derivative(local)
    }

    pub fn trim(&self, a: f64, b: f64) -> Option<Curve> {
        let (a, b) = ordered(a.clamp(0.0, self.par_end), b.clamp(0.0, self.par_end));
        let (i0, first, l0) = self.segment_at(a);
        let (i1, last, l1) = self.segment_at(b);
        if i0 == i1 {
            return first.trim(l0, l1);
        }
        let mut pieces = Vec::new();
        pieces.extend(first.trim(l0, first.par_end()));
        pieces.extend(self.segments[i0 + 1..i1].iter().cloned());
        pieces.extend(last.trim(last.par_start(), l1));
        match pieces.len() {
            0 => None,
            1 => pieces.pop(),
            _ => Some(Curve::Composite(Self::from_contiguous(pieces))),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        *self.cache.bbox.get_or_init(|| {
            self.segments
                .iter()
                .fold(BoundingBox::empty(), |bb, s| bb.union(&s.bounding_box()))
        })
    }

    /// Global minimum over all segments; the first segment wins ties.
    pub fn closest_parameter(&self, p: &Point2d) -> f64 {
        let mut best = (f64::INFINITY, 0.0);
        for (i, seg) in self.segments.iter().enumerate() {
            let local = seg.closest_parameter(p);
            let d = seg.value(local).distance_squared_to(p);
            if d < best.0 {
                best = (d, self.global_parameter(i, local));
            }
        }
        best.1
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(Curve::length).sum()
    }

    pub fn length_between(&self, t0: f64, t1: f64) -> f64 {
        let mut total = 0.0;
        for (i, seg) in self.segments.iter().enumerate() {
            let lo = t0.max(self.starts[i]);
            let hi = t1.min(self.starts[i] + seg.par_end() - seg.par_start());
            if hi > lo {
                let offset = seg.par_start() - self.starts[i];
                total += seg.length_between(lo + offset, hi + offset);
            }
        }
        total
    }

    pub fn reverse(&self) -> Composite {
        Self::from_contiguous(self.segments.iter().rev().map(Curve::reverse).collect())
    }

    pub fn translate(&mut self, delta: Vec2) {
        for s in &mut self.segments {
            s.translate(delta);
        }
        self.cache.clear();
    }

    pub fn transform(&self, t: &Transform2d) -> Composite {
        Self::from_contiguous(self.segments.iter().map(|s| s.transform(t)).collect())
    }
}
