//! Value types produced by lane graph queries.

use crate::math::{Point2d, Point3d, Vector2d, Vector3d};
use crate::LaneId;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

/// A point along a road or lane, parameterised by arc-length.
///
/// Points are synthesized on demand and are not retained by the lane graph.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcPoint {
    /// An identifier describing where the point was sampled.
    pub id: String,
    /// The arc-length along the owning road.
    pub s: f64,
    /// The position in world space.
    pub position: Point3d,
    /// The direction of the left-hand normal of the road, in radians.
    pub ortho: f64,
    /// The curvature of the reference line at this point, if known.
    pub curvature: Option<f64>,
    /// The index of the plan-view geometry record the point was sampled from.
    pub geometry: Option<usize>,
    /// The lane this point lies on, or `None` for reference line points.
    pub lane: Option<LaneId>,
}

/// A position in the road network: a road, a lane number and an arc-length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadPosition {
    pub road: String,
    pub lane: i32,
    pub s: f64,
}

/// A speed limit found ahead of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedLimit {
    /// The distance from the query origin in m.
    pub distance: f64,
    /// The speed limit in km/h, or `None` if unlimited.
    pub speed: Option<f64>,
}

/// A junction found ahead of a vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    /// The distance from the query origin in m.
    pub distance: f64,
    /// The ID of the junction.
    pub junction: String,
}

impl ArcPoint {
    /// The heading of the road at this point, in radians.
    pub fn heading(&self) -> f64 {
        self.ortho - FRAC_PI_2
    }

    /// The position projected onto the ground plane.
    pub fn ground(&self) -> Point2d {
        Point2d::new(self.position.x, self.position.y)
    }

    /// The unit normal pointing to the left of the road.
    pub fn normal(&self) -> Vector2d {
        Vector2d::new(self.ortho.cos(), self.ortho.sin())
    }

    /// Returns a copy of this point moved laterally by `offset` m
    /// (positive to the left of the road).
    pub fn offset(&self, id: String, offset: f64, lane: Option<LaneId>) -> ArcPoint {
        let normal = self.normal();
        ArcPoint {
            id,
            position: self.position + offset * Vector3d::new(normal.x, normal.y, 0.0),
            lane,
            ..self.clone()
        }
    }
}

impl RoadPosition {
    pub fn new(road: impl Into<String>, lane: i32, s: f64) -> Self {
        Self {
            road: road.into(),
            lane,
            s,
        }
    }
}

impl fmt::Display for RoadPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{:.2}", self.road, self.lane, self.s)
    }
}
