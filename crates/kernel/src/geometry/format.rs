//! JSON form of curves.
//!
//! Curves serialize as a tagged union on `"kind"`; a composite carries its segments
//! as a nested array. Cached bounds are never written and are rebuilt on demand.

use serde::{Deserialize, Serialize};

use super::bezier::CubicBezier;
use super::composite::Composite;
use super::curves::{Curve, CurveError, LineSegment};
use super::ellipse::EllipticArc;
use super::point::Point2d;
use super::vector::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CurveRecord {
    LineSegment {
        start: Point2d,
        end: Point2d,
    },
    #[serde(rename_all = "camelCase")]
    Arc {
        center: Point2d,
        major_axis: Vec2,
        minor_axis: Vec2,
        par_start: f64,
        par_end: f64,
    },
    #[serde(rename_all = "camelCase")]
    Bezier {
        control_points: [Point2d; 4],
    },
    Composite {
        segments: Vec<CurveRecord>,
    },
}

impl From<&Curve> for CurveRecord {
    fn from(curve: &Curve) -> Self {
        match curve {
            Curve::LineSegment(l) => CurveRecord::LineSegment {
                start: l.start(),
                end: l.end(),
            },
            Curve::Arc(a) => CurveRecord::Arc {
                center: a.center(),
                major_axis: a.major_axis(),
                minor_axis: a.minor_axis(),
                par_start: a.par_start(),
                par_end: a.par_end(),
            },
            Curve::Bezier(b) => CurveRecord::Bezier {
                control_points: *b.control_points(),
            },
            Curve::Composite(c) => CurveRecord::Composite {
                segments: c.segments().iter().map(CurveRecord::from).collect(),
            },
        }
    }
}

impl TryFrom<CurveRecord> for Curve {
    type Error = CurveError;

    fn try_from(record: CurveRecord) -> Result<Self, Self::Error> {
        match record {
            CurveRecord::LineSegment { start, end } => {
                check_points(&[start, end])?;
                Ok(Curve::LineSegment(LineSegment::new(start, end)))
            }
            CurveRecord::Arc {
                center,
                major_axis,
                minor_axis,
                par_start,
                par_end,
            } => {
                check_points(&[center])?;
                let finite = [major_axis.x, major_axis.y, minor_axis.x, minor_axis.y, par_start, par_end]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite {
                    return Err(CurveError::InvalidData("arc with non-finite data".into()));
                }
                if par_end < par_start {
                    return Err(CurveError::InvalidData(format!(
                        "arc parameter range [{par_start}, {par_end}] is reversed"
                    )));
                }
                Ok(Curve::Arc(EllipticArc::new(
                    center, major_axis, minor_axis, par_start, par_end,
                )))
            }
            CurveRecord::Bezier { control_points } => {
                check_points(&control_points)?;
                Ok(Curve::Bezier(CubicBezier::new(control_points)))
            }
            CurveRecord::Composite { segments } => {
                let segments = segments
                    .into_iter()
                    .map(Curve::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Curve::Composite(Composite::new(segments)?))
            }
        }
    }
}

fn check_points(points: &[Point2d]) -> Result<(), CurveError> {
    if points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        Ok(())
    } else {
        Err(CurveError::InvalidData("non-finite coordinate".into()))
    }
}

impl Curve {
    pub fn to_json(&self) -> Result<String, CurveError> {
        Ok(serde_json::to_string(&CurveRecord::from(self))?)
    }

    pub fn from_json(json: &str) -> Result<Curve, CurveError> {
        let record: CurveRecord = serde_json::from_str(json)?;
        Curve::try_from(record)
    }
}
