use crate::math::{project_point_onto_curve, ParametricCurve2d, Point2d, Point3d};
use crate::network::RoadNetwork;
use crate::projection::{LaneBorders, ProjectionCache};
use crate::road::Road;
use crate::util::Interval;
use crate::LaneId;
use cgmath::prelude::*;
use std::cmp::Ordering;

/// A lane a vehicle was found on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneMatch {
    pub lane: LaneId,
    /// The arc-length of the vehicle along the lane's road.
    pub s: f64,
    /// The signed angle from the lane's direction of travel to the vehicle's heading.
    pub heading_diff: f64,
}

/// Finds the lane a vehicle is driving on.
pub trait LaneLocator {
    /// Locates a vehicle, preferring the `expected` lanes when several match.
    ///
    /// The border points computed along the way may be stored in `cache`.
    fn locate(
        &self,
        position: Point3d,
        heading: f64,
        expected: &[LaneId],
        cache: &mut ProjectionCache,
        net: &RoadNetwork,
    ) -> Option<LaneMatch>;
}

impl<F> LaneLocator for F
where
    F: Fn(Point3d, f64, &[LaneId]) -> Option<LaneMatch>,
{
    fn locate(
        &self,
        position: Point3d,
        heading: f64,
        expected: &[LaneId],
        _cache: &mut ProjectionCache,
        _net: &RoadNetwork,
    ) -> Option<LaneMatch> {
        self(position, heading, expected)
    }
}

/// Locates vehicles by projecting them onto the reference line of every road.
#[derive(Clone, Copy, Debug)]
pub struct NearestLaneLocator {
    /// The tolerance of the projection, in m.
    pub max_error: f64,
}

impl Default for NearestLaneLocator {
    fn default() -> Self {
        Self { max_error: 0.01 }
    }
}

/// The reference line of a road as a parametric curve over `s`.
struct ReferenceLine<'a>(&'a Road);

impl ParametricCurve2d for ReferenceLine<'_> {
    fn sample(&self, t: f64) -> Point2d {
        self.0
            .point_on_reference_line(t)
            .map_or_else(Point2d::origin, |point| point.ground())
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, self.0.length())
    }
}

impl LaneLocator for NearestLaneLocator {
    fn locate(
        &self,
        position: Point3d,
        heading: f64,
        expected: &[LaneId],
        cache: &mut ProjectionCache,
        net: &RoadNetwork,
    ) -> Option<LaneMatch> {
        let point = Point2d::new(position.x, position.y);
        cache.clear();

        let mut best: Option<(bool, LaneMatch)> = None;
        for road in net.roads().filter(|road| road.length() > 0.0) {
            let line = ReferenceLine(road);
            let Some(s) = project_point_onto_curve(&line, point, self.max_error, None) else {
                continue;
            };
            let Some(section) = net.section_at(road.id(), s) else {
                continue;
            };
            let Some(reference) = road.point_on_reference_line(s) else {
                continue;
            };
            let section = net.section(section);
            section.project_borders(&reference, cache, net);

            for id in section.lanes() {
                if !net.lane(id).is_driving() {
                    continue;
                }
                let Some(borders) = cache.get(id) else {
                    continue;
                };
                if !contains(borders, point) {
                    continue;
                }
                let candidate = (
                    expected.contains(&id),
                    LaneMatch {
                        lane: id,
                        s,
                        heading_diff: borders.heading_diff(heading),
                    },
                );
                if best.map_or(true, |best| rank(&candidate, &best) == Ordering::Less) {
                    best = Some(candidate);
                }
            }
        }
        best.map(|(_, found)| found)
    }
}

/// Whether a point lies between the borders of a lane.
fn contains(borders: &LaneBorders, point: Point2d) -> bool {
    if borders.width() <= 0.0 {
        return false;
    }
    let normal = borders.inner.normal();
    let inner = (point - borders.inner.ground()).dot(normal);
    let outer = (point - borders.outer.ground()).dot(normal);
    inner * outer <= 0.0
}

/// Orders candidate lanes: expected lanes first, then by alignment with
/// the vehicle's heading.
fn rank(a: &(bool, LaneMatch), b: &(bool, LaneMatch)) -> Ordering {
    b.0.cmp(&a.0)
        .then(a.1.heading_diff.abs().total_cmp(&b.1.heading_diff.abs()))
}
