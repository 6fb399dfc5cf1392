//! Plan-view geometry of a road's reference line.

use crate::math::{heading_vector, Point2d};
use serde::{Deserialize, Serialize};

/// Curvatures below this magnitude are sampled as straight lines.
const MIN_CURVATURE: f64 = 1e-12;

/// Maximum integration step when sampling a spiral, in m.
const SPIRAL_STEP: f64 = 0.25;

/// One record of a road's plan view, valid over `[s, s + length]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// The arc-length at which this record starts.
    pub s: f64,
    /// The x-coordinate of the start point.
    pub x: f64,
    /// The y-coordinate of the start point.
    pub y: f64,
    /// The heading at the start point, in radians counter-clockwise from the x-axis.
    pub hdg: f64,
    /// The length of the record in m.
    pub length: f64,
    /// The shape of the record.
    pub kind: GeometryKind,
}

/// The shape of a [Geometry] record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GeometryKind {
    /// A straight line.
    Line,
    /// An arc of constant curvature (positive turns left).
    Arc { curvature: f64 },
    /// A clothoid whose curvature changes linearly along its length.
    #[serde(rename_all = "camelCase")]
    Spiral { curv_start: f64, curv_end: f64 },
}

/// The result of sampling a [Geometry] record.
#[derive(Clone, Copy, Debug)]
pub struct GeometrySample {
    /// The position on the reference line.
    pub pos: Point2d,
    /// The heading of the reference line, in radians.
    pub hdg: f64,
    /// The curvature of the reference line.
    pub curvature: f64,
}

impl Geometry {
    /// Creates a straight line record.
    pub fn line(s: f64, start: Point2d, hdg: f64, length: f64) -> Self {
        Self::new(s, start, hdg, length, GeometryKind::Line)
    }

    /// Creates an arc record.
    pub fn arc(s: f64, start: Point2d, hdg: f64, length: f64, curvature: f64) -> Self {
        Self::new(s, start, hdg, length, GeometryKind::Arc { curvature })
    }

    fn new(s: f64, start: Point2d, hdg: f64, length: f64, kind: GeometryKind) -> Self {
        Self {
            s,
            x: start.x,
            y: start.y,
            hdg,
            length,
            kind,
        }
    }

    /// The arc-length at which this record ends.
    pub fn end_s(&self) -> f64 {
        self.s + self.length
    }

    /// Samples the record at the road arc-length `s`, which is clamped to the record.
    pub fn sample(&self, s: f64) -> GeometrySample {
        let ds = (s - self.s).clamp(0.0, self.length);
        let start = Point2d::new(self.x, self.y);
        match self.kind {
            GeometryKind::Line => GeometrySample {
                pos: start + ds * heading_vector(self.hdg),
                hdg: self.hdg,
                curvature: 0.0,
            },
            GeometryKind::Arc { curvature } => sample_arc(start, self.hdg, curvature, ds),
            GeometryKind::Spiral {
                curv_start,
                curv_end,
            } => {
                let rate = if self.length > 0.0 {
                    (curv_end - curv_start) / self.length
                } else {
                    0.0
                };
                sample_spiral(start, self.hdg, curv_start, rate, ds)
            }
        }
    }
}

fn sample_arc(start: Point2d, hdg: f64, curvature: f64, ds: f64) -> GeometrySample {
    if curvature.abs() < MIN_CURVATURE {
        return GeometrySample {
            pos: start + ds * heading_vector(hdg),
            hdg,
            curvature,
        };
    }
    let end_hdg = hdg + curvature * ds;
    let dx = (end_hdg.sin() - hdg.sin()) / curvature;
    let dy = (hdg.cos() - end_hdg.cos()) / curvature;
    GeometrySample {
        pos: Point2d::new(start.x + dx, start.y + dy),
        hdg: end_hdg,
        curvature,
    }
}

fn sample_spiral(start: Point2d, hdg: f64, k0: f64, rate: f64, ds: f64) -> GeometrySample {
    let heading_at = |u: f64| hdg + k0 * u + 0.5 * rate * u * u;

    // Integrate the unit tangent with Simpson's rule
    let mut n = usize::max(2, (ds / SPIRAL_STEP).ceil() as usize);
    if n % 2 == 1 {
        n += 1;
    }
    let h = ds / n as f64;
    let mut sum = heading_vector(heading_at(0.0)) + heading_vector(heading_at(ds));
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * heading_vector(heading_at(i as f64 * h));
    }

    GeometrySample {
        pos: start + sum * (h / 3.0),
        hdg: heading_at(ds),
        curvature: k0 + rate * ds,
    }
}
