//! Per-vehicle scratch state for projecting positions onto lane borders.

use crate::lane::LaneSide;
use crate::math::wrap_angle;
use crate::point::ArcPoint;
use crate::LaneId;
use cgmath::MetricSpace;
use std::collections::HashMap;
use std::f64::consts::PI;

/// The inner and outer border points of every lane near a vehicle, for the
/// current tick.
///
/// Each vehicle owns its own cache; it is never stored on the lane graph.
#[derive(Clone, Debug, Default)]
pub struct ProjectionCache {
    borders: HashMap<LaneId, LaneBorders>,
}

/// The border points of one lane at a common arc-length.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneBorders {
    /// The point on the border closer to the reference line.
    pub inner: ArcPoint,
    /// The point on the border farther away from the reference line.
    pub outer: ArcPoint,
    side: LaneSide,
}

impl LaneBorders {
    pub(crate) fn new(inner: ArcPoint, outer: ArcPoint, side: LaneSide) -> Self {
        Self { inner, outer, side }
    }

    /// The arc-length the borders were sampled at.
    pub fn s(&self) -> f64 {
        self.inner.s
    }

    /// The width of the lane in m.
    pub fn width(&self) -> f64 {
        self.inner.position.distance(self.outer.position)
    }

    /// The direction of travel on the lane, in radians.
    pub fn lane_heading(&self) -> f64 {
        match self.side {
            LaneSide::Left => wrap_angle(self.inner.heading()),
            LaneSide::Right => wrap_angle(self.inner.heading() + PI),
        }
    }

    /// The signed angle from the lane's direction of travel to `heading`, in
    /// radians within `(-PI, PI]`.
    pub fn heading_diff(&self, heading: f64) -> f64 {
        wrap_angle(heading - self.lane_heading())
    }
}

impl ProjectionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Default::default()
    }

    /// Clears the cache at the start of a tick.
    pub fn clear(&mut self) {
        self.borders.clear();
    }

    pub(crate) fn insert(&mut self, lane: LaneId, borders: LaneBorders) {
        self.borders.insert(lane, borders);
    }

    pub fn len(&self) -> usize {
        self.borders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }

    /// Gets the border points of a lane.
    pub fn get(&self, lane: LaneId) -> Option<&LaneBorders> {
        self.borders.get(&lane)
    }

    /// Gets the angle from a lane's direction of travel to `heading`.
    pub fn heading_diff(&self, lane: LaneId, heading: f64) -> Option<f64> {
        self.get(lane).map(|b| b.heading_diff(heading))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point3d;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    fn borders(side: LaneSide) -> LaneBorders {
        // Reference line heading along +y
        let inner = ArcPoint {
            id: "p".into(),
            s: 5.0,
            position: Point3d::new(0.0, 0.0, 0.0),
            ortho: PI,
            curvature: Some(0.01),
            geometry: Some(0),
            lane: None,
        };
        let outer = inner.offset("q".into(), 3.0, None);
        LaneBorders::new(inner, outer, side)
    }

    #[test]
    fn right_lanes_travel_against_the_reference_line() {
        let left = borders(LaneSide::Left);
        let right = borders(LaneSide::Right);
        assert_approx_eq!(left.width(), 3.0);
        assert_approx_eq!(left.lane_heading(), FRAC_PI_2);
        assert_approx_eq!(right.lane_heading(), -FRAC_PI_2);
        assert_approx_eq!(left.heading_diff(FRAC_PI_2 + 0.1), 0.1);
        assert_approx_eq!(right.heading_diff(FRAC_PI_2).abs(), PI);
    }
}
