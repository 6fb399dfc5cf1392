//! Road networks shared by the integration tests.

#![allow(dead_code)]

use lane_pilot::math::{CubicRecord, Point2d};
use lane_pilot::{
    ContactPoint, Geometry, Interval, LaneAttributes, LaneId, LaneType, LaneWidth, Link, RoadAttributes,
    RoadNetwork, SpeedRecord,
};

pub const LANE_WIDTH: f64 = 3.5;

/// Adds a straight road with one lane section holding `lanes` of equal width.
pub fn add_straight_road(
    net: &mut RoadNetwork,
    name: &str,
    start: Point2d,
    hdg: f64,
    length: f64,
    lanes: &[i32],
) -> Vec<LaneId> {
    add_road_with_limits(net, name, start, hdg, length, lanes, &[])
}

/// Like [add_straight_road], with speed signs on every lane.
pub fn add_road_with_limits(
    net: &mut RoadNetwork,
    name: &str,
    start: Point2d,
    hdg: f64,
    length: f64,
    lanes: &[i32],
    speed_limits: &[SpeedRecord],
) -> Vec<LaneId> {
    build_road(net, name, start, hdg, length, lanes, &[], speed_limits)
}

/// Like [add_straight_road], with speed signs on the road but none on its lanes.
pub fn add_road_with_road_limits(
    net: &mut RoadNetwork,
    name: &str,
    length: f64,
    lanes: &[i32],
    speed_limits: &[SpeedRecord],
) -> Vec<LaneId> {
    build_road(net, name, Point2d::new(0.0, 0.0), 0.0, length, lanes, speed_limits, &[])
}

#[allow(clippy::too_many_arguments)]
fn build_road(
    net: &mut RoadNetwork,
    name: &str,
    start: Point2d,
    hdg: f64,
    length: f64,
    lanes: &[i32],
    road_limits: &[SpeedRecord],
    lane_limits: &[SpeedRecord],
) -> Vec<LaneId> {
    let geometry = [Geometry::line(0.0, start, hdg, length)];
    let road = net
        .add_road(&RoadAttributes {
            name,
            geometry: &geometry,
            speed_limits: road_limits,
            ..Default::default()
        })
        .unwrap();
    let section = net
        .add_lane_section(road, Interval::new(0.0, length), &[])
        .unwrap();
    let widths = [LaneWidth::Width(CubicRecord::constant(0.0, LANE_WIDTH))];
    lanes
        .iter()
        .map(|number| {
            net.add_lane(
                section,
                &LaneAttributes {
                    number: *number,
                    kind: LaneType::Driving,
                    widths: &widths,
                    road_marks: &[],
                    speed_limits: lane_limits,
                },
            )
            .unwrap()
        })
        .collect()
}

/// Links the end of lane `from` to the start of lane `to`, in both directions.
pub fn chain(net: &mut RoadNetwork, from: LaneId, to: LaneId) {
    net.set_successor(from, Link::to_lane(to, ContactPoint::Start));
    net.set_predecessor(to, Link::to_lane(from, ContactPoint::End));
}

/// A 100 m road "A" along the x-axis whose lane 1 ends in junction "J",
/// which branches straight on into road "B" (connection "0") or left into
/// road "C" (connection "1"). Both are 50 m long.
///
/// Returns the network and lane 1 of roads A, B and C.
pub fn junction_network() -> (RoadNetwork, [LaneId; 3]) {
    let mut net = RoadNetwork::new();
    let a = add_straight_road(&mut net, "A", Point2d::new(0.0, 0.0), 0.0, 100.0, &[1])[0];
    let b = add_straight_road(&mut net, "B", Point2d::new(100.0, 0.0), 0.0, 50.0, &[1])[0];
    let c = add_straight_road(
        &mut net,
        "C",
        Point2d::new(100.0, 0.0),
        std::f64::consts::FRAC_PI_2,
        50.0,
        &[1],
    )[0];
    let link = Link::junction("J")
        .with_connection(b, ContactPoint::Start, "0")
        .with_connection(c, ContactPoint::Start, "1");
    net.set_successor(a, link);
    net.set_predecessor(b, Link::to_lane(a, ContactPoint::End));
    net.set_predecessor(c, Link::to_lane(a, ContactPoint::End));
    (net, [a, b, c])
}
