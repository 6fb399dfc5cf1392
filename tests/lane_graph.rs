//! Tests that walk the lane graph across lane boundaries.

mod common;

use assert_approx_eq::assert_approx_eq;
use common::{
    add_road_with_limits, add_road_with_road_limits, add_straight_road, chain, junction_network,
    LANE_WIDTH,
};
use lane_pilot::math::{Point2d, Point3d};
use lane_pilot::{
    AdasLaneInformation, AdasLaneType, Intersection, Position, PreferredConnections, RoadNetwork, RoadPosition,
    SpeedLimit, SpeedRecord, SpeedUnit, TrafficObject, TraversalError, MAX_HOPS,
};
use rand::prelude::*;

fn kmh(s_offset: f64, max: f64) -> SpeedRecord {
    SpeedRecord {
        s_offset,
        max: Some(max),
        unit: SpeedUnit::Kmh,
    }
}

/// Test that "ahead" follows each lane's direction of travel.
#[test]
fn points_ahead_follow_travel_direction() {
    let mut net = RoadNetwork::new();
    let lanes = add_straight_road(&mut net, "R", Point2d::new(0.0, 0.0), 0.0, 100.0, &[1, -1]);
    let (forward, backward) = (net.lane(lanes[0]), net.lane(lanes[1]));
    let pc = PreferredConnections::new();

    let mut rng = StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
    for _ in 0..100 {
        let s = rng.gen_range(0.0..100.0);
        let range = rng.gen_range(0.0..50.0);

        let ahead = forward.point_ahead(false, s, range, &pc, &net);
        match s + range <= 100.0 {
            true => assert_approx_eq!(ahead.unwrap().s, s + range),
            false => assert!(ahead.is_none()),
        }
        let ahead = backward.point_ahead(false, s, range, &pc, &net);
        match s - range >= 0.0 {
            true => assert_approx_eq!(ahead.unwrap().s, s - range),
            false => assert!(ahead.is_none()),
        }
        // Driving the wrong way turns "ahead" around
        let ahead = forward.point_ahead(true, s, range, &pc, &net);
        match s - range >= 0.0 {
            true => assert_approx_eq!(ahead.unwrap().s, s - range),
            false => assert!(ahead.is_none()),
        }
        let behind = forward.point_behind(false, s, range, &pc, &net);
        match s - range >= 0.0 {
            true => assert_approx_eq!(behind.unwrap().s, s - range),
            false => assert!(behind.is_none()),
        }
    }
}

/// Test that points ahead continue smoothly into the next road, in both directions.
#[test]
fn boundary_crossing_is_continuous() {
    let mut net = RoadNetwork::new();
    let a = add_straight_road(&mut net, "A", Point2d::new(0.0, 0.0), 0.0, 100.0, &[1, -1]);
    let b = add_straight_road(&mut net, "B", Point2d::new(100.0, 0.0), 0.0, 100.0, &[1, -1]);
    chain(&mut net, a[0], b[0]);
    chain(&mut net, a[1], b[1]);
    let pc = PreferredConnections::new();

    let lane = net.lane(a[0]);
    let at_end = lane.point_ahead(false, 90.0, 10.0, &pc, &net).unwrap();
    let beyond = lane.point_ahead(false, 90.0, 10.5, &pc, &net).unwrap();
    assert_eq!(at_end.lane, Some(a[0]));
    assert_eq!(beyond.lane, Some(b[0]));
    assert_approx_eq!(at_end.position.x, 100.0);
    assert_approx_eq!(beyond.position.x, 100.5);
    assert_approx_eq!(beyond.position.y, LANE_WIDTH / 2.0);

    // Lane -1 travels towards decreasing s, so it leaves B at its start
    let lane = net.lane(b[1]);
    let point = lane.point_ahead(false, 5.0, 10.0, &pc, &net).unwrap();
    assert_eq!(point.lane, Some(a[1]));
    assert_approx_eq!(point.s, 95.0);
    assert_approx_eq!(point.position.y, -LANE_WIDTH / 2.0);

    let (_, traversed) = net
        .lane(a[0])
        .point_ahead_traversed(false, 50.0, 100.0, &pc, &net)
        .unwrap();
    assert_eq!(traversed, vec![a[0], b[0]]);
    assert_eq!(net.lane(a[0]).lane_ahead(false, &pc, &net), Some(b[0]));
    assert_eq!(net.lane(b[0]).lane_ahead(true, &pc, &net), Some(a[0]));
}

/// Test that walks around a loop of lanes always terminate.
#[test]
fn cyclic_graphs_terminate() {
    let mut net = RoadNetwork::new();
    let lanes: Vec<_> = (0..3)
        .map(|i| {
            let name = format!("L{}", i);
            let start = Point2d::new(10.0 * i as f64, 0.0);
            add_straight_road(&mut net, &name, start, 0.0, 10.0, &[1])[0]
        })
        .collect();
    for i in 0..3 {
        chain(&mut net, lanes[i], lanes[(i + 1) % 3]);
    }
    let _elsewhere = add_straight_road(&mut net, "X", Point2d::new(0.0, 50.0), 0.0, 10.0, &[1]);
    let pc = PreferredConnections::new();
    let lane = net.lane(lanes[0]);

    assert!(lane.point_ahead(false, 0.0, 1000.0, &pc, &net).is_none());
    assert_eq!(lane.speed_limits_ahead(false, 0.0, 1000.0, &pc, &net).len(), 1);
    assert!(lane.intersections_ahead(false, 0.0, 1000.0, &pc, &net).is_empty());

    let on_loop = RoadPosition::new("L2", 1, 5.0);
    assert_approx_eq!(lane.distance_to_target(false, 2.0, &pc, &on_loop, &net).unwrap(), 23.0);
    let off_loop = RoadPosition::new("X", 1, 5.0);
    assert_eq!(
        lane.distance_to_target(false, 2.0, &pc, &off_loop, &net),
        Err(TraversalError::CycleDetected)
    );
    // A target behind the start is reached by coming round the loop
    let behind = RoadPosition::new("L0", 1, 1.0);
    assert_approx_eq!(lane.distance_to_target(false, 2.0, &pc, &behind, &net).unwrap(), 29.0);
    let missing = RoadPosition::new("Y", 1, 5.0);
    assert!(matches!(
        lane.distance_to_target(false, 2.0, &pc, &missing, &net),
        Err(TraversalError::UnknownTarget(_))
    ));
}

/// Test that repeated speed signs collapse into one change.
#[test]
fn speed_limits_collapse_repeats() {
    let mut net = RoadNetwork::new();
    let limits = [kmh(0.0, 50.0), kmh(20.0, 50.0), kmh(40.0, 30.0)];
    let lane = add_road_with_limits(
        &mut net,
        "R",
        Point2d::new(0.0, 0.0),
        0.0,
        100.0,
        &[1],
        &limits,
    )[0];
    let lane = net.lane(lane);
    let pc = PreferredConnections::new();
    let limit = |distance, speed| SpeedLimit {
        distance,
        speed: Some(speed),
    };

    let ahead = lane.speed_limits_ahead(false, 0.0, 100.0, &pc, &net);
    assert_eq!(ahead, vec![limit(0.0, 50.0), limit(40.0, 30.0)]);
    let ahead = lane.speed_limits_ahead(false, 30.0, 100.0, &pc, &net);
    assert_eq!(ahead, vec![limit(0.0, 50.0), limit(10.0, 30.0)]);
    let ahead = lane.speed_limits_ahead(false, 30.0, 5.0, &pc, &net);
    assert_eq!(ahead, vec![limit(0.0, 50.0)]);

    // Driving the wrong way, each sign is reached at its end
    let ahead = lane.speed_limits_ahead(true, 60.0, 100.0, &pc, &net);
    assert_eq!(ahead, vec![limit(0.0, 30.0), limit(20.0, 50.0)]);

    // The same query gives the same answer
    assert_eq!(
        lane.speed_limits_ahead(false, 10.0, 100.0, &pc, &net),
        lane.speed_limits_ahead(false, 10.0, 100.0, &pc, &net)
    );
}

/// Test that a lane without signs reports the speed limit of its road.
#[test]
fn speed_limits_fall_back_to_the_road() {
    let mut net = RoadNetwork::new();
    let a = add_straight_road(&mut net, "A", Point2d::new(0.0, 0.0), 0.0, 100.0, &[1])[0];
    let limits = [kmh(0.0, 80.0)];
    let b = add_road_with_limits(
        &mut net,
        "B",
        Point2d::new(100.0, 0.0),
        0.0,
        100.0,
        &[1],
        &limits,
    )[0];
    chain(&mut net, a, b);
    let pc = PreferredConnections::new();

    let ahead = net.lane(a).speed_limits_ahead(false, 50.0, 100.0, &pc, &net);
    assert_eq!(
        ahead,
        vec![
            SpeedLimit {
                distance: 0.0,
                speed: None
            },
            SpeedLimit {
                distance: 50.0,
                speed: Some(80.0)
            },
        ]
    );
}

/// Test that branching junctions are reported ahead.
#[test]
fn intersections_ahead_of_a_junction() {
    let (net, [a, b, _]) = junction_network();
    let pc = PreferredConnections::new();

    let ahead = net.lane(a).intersections_ahead(false, 20.0, 200.0, &pc, &net);
    assert_eq!(
        ahead,
        vec![Intersection {
            distance: 80.0,
            junction: "J".into()
        }]
    );
    assert!(net
        .lane(a)
        .intersections_ahead(false, 20.0, 50.0, &pc, &net)
        .is_empty());
    assert!(net
        .lane(b)
        .intersections_ahead(false, 0.0, 200.0, &pc, &net)
        .is_empty());
}

/// Test that preferred connections pick the branch, and that the fallback is counted.
#[test]
fn junction_branches_follow_the_route() {
    let (net, [a, b, c]) = junction_network();
    let lane = net.lane(a);

    let no_preference = PreferredConnections::new();
    let point = lane.point_ahead(false, 90.0, 20.0, &no_preference, &net).unwrap();
    assert_eq!(point.lane, Some(b));
    assert_eq!(net.ambiguous_resolutions(), 1);

    let mut pc = PreferredConnections::new();
    pc.add_connection("J", "1");
    let point = lane.point_ahead(false, 90.0, 20.0, &pc, &net).unwrap();
    assert_eq!(point.lane, Some(c));
    assert_approx_eq!(point.position.x, 100.0 - LANE_WIDTH / 2.0);
    assert_approx_eq!(point.position.y, 10.0);
    assert_eq!(net.ambiguous_resolutions(), 1);
}

/// Test that route planning finds the connections towards a target.
#[test]
fn shortest_route_picks_connections() {
    let (net, [a, _, c]) = junction_network();
    let start = RoadPosition::new("A", 1, 10.0);

    let pc = net.shortest_route(&start, &RoadPosition::new("C", 1, 20.0), false).unwrap();
    assert!(pc.contains("J", "1"));
    assert!(!pc.contains("J", "0"));
    let target = net.lane(a).point_ahead(false, 10.0, 110.0, &pc, &net).unwrap();
    assert_eq!(target.lane, Some(c));

    let pc = net.shortest_route(&start, &RoadPosition::new("B", 1, 20.0), false).unwrap();
    assert!(pc.contains("J", "0"));
    assert!(net.shortest_route(&start, &RoadPosition::new("Q", 1, 0.0), false).is_none());
    // Lane 1 of C only leads back to A when driven the wrong way
    let back = RoadPosition::new("C", 1, 10.0);
    assert!(net.shortest_route(&back, &start, false).is_none());
    let pc = net.shortest_route(&back, &start, true).unwrap();
    assert!(!pc.contains("J", "0") && !pc.contains("J", "1"));
}

/// Test lane neighbours and their classification on a three lane road.
#[test]
fn neighbours_and_lane_types() {
    let mut net = RoadNetwork::new();
    let lanes = add_straight_road(&mut net, "R", Point2d::new(0.0, 0.0), 0.0, 100.0, &[2, 1, -1]);
    let [outer, inner, opposite] = [lanes[0], lanes[1], lanes[2]];
    let lane = net.lane(inner);

    assert_eq!(lane.neighbor(Position::Left, 50.0, false, &net), Some(outer));
    assert_eq!(lane.neighbor(Position::Right, 50.0, false, &net), Some(opposite));
    assert_eq!(lane.neighbor(Position::Left, 50.0, true, &net), Some(opposite));
    assert_eq!(net.lane(outer).neighbor(Position::Left, 50.0, false, &net), None);

    assert_eq!(lane.adas_lane_type(50.0, false, &net), AdasLaneType::MiddleLane);
    assert_eq!(
        net.lane(outer).adas_lane_type(50.0, false, &net),
        AdasLaneType::LeftMostLane
    );
    assert_eq!(
        net.lane(outer).adas_lane_type(50.0, true, &net),
        AdasLaneType::RightMostLane
    );
}

#[test]
fn neighbouring_lane_occupancy() {
    let mut net = RoadNetwork::new();
    let lanes = add_straight_road(&mut net, "R", Point2d::new(0.0, 0.0), 0.0, 100.0, &[2, 1, -1]);
    let [outer, inner] = [lanes[0], lanes[1]];
    let at = |lane, s: f64| TrafficObject {
        name: "other".into(),
        lane: Some(lane),
        s,
        position: Point3d::new(s, 0.0, 0.0),
        speed_kmh: 0.0,
    };
    let info = |position, traffic: &[TrafficObject]| {
        net.lane(inner)
            .lane_information(position, 50.0, false, 20.0, 20.0, traffic, &net)
    };

    assert_eq!(info(Position::Left, &[]), AdasLaneInformation::Free);
    assert_eq!(info(Position::Left, &[at(outer, 60.0)]), AdasLaneInformation::Occupied);
    assert_eq!(info(Position::Left, &[at(outer, 35.0)]), AdasLaneInformation::Occupied);
    assert_eq!(info(Position::Left, &[at(outer, 90.0)]), AdasLaneInformation::Free);
    assert_eq!(info(Position::Right, &[at(outer, 60.0)]), AdasLaneInformation::Free);
    assert_eq!(
        net.lane(outer)
            .lane_information(Position::Left, 50.0, false, 20.0, 20.0, &[], &net),
        AdasLaneInformation::NotAvailable
    );
}

/// Test that changes of the road's speed limit apply to lanes without signs.
#[test]
fn road_speed_changes_are_listed() {
    let mut net = RoadNetwork::new();
    let limits = [kmh(0.0, 50.0), kmh(50.0, 80.0)];
    let lanes = add_road_with_road_limits(&mut net, "R", 100.0, &[1, -1], &limits);
    let (lane, opposite) = (net.lane(lanes[0]), net.lane(lanes[1]));
    let pc = PreferredConnections::new();
    let limit = |distance, speed| SpeedLimit {
        distance,
        speed: Some(speed),
    };

    assert_eq!(lane.speed_limit_kmh(60.0, &net), Some(80.0));
    assert_eq!(
        lane.speed_limits_ahead(false, 60.0, 30.0, &pc, &net),
        vec![limit(0.0, 80.0)]
    );
    assert_eq!(
        lane.speed_limits_ahead(false, 10.0, 80.0, &pc, &net),
        vec![limit(0.0, 50.0), limit(40.0, 80.0)]
    );
    assert_eq!(
        opposite.speed_limits_ahead(false, 90.0, 80.0, &pc, &net),
        vec![limit(0.0, 80.0), limit(40.0, 50.0)]
    );
}

/// Test each way a search for a target can fail.
#[test]
fn distance_to_target_failures() {
    let mut net = RoadNetwork::new();
    let lanes: Vec<_> = (0..120)
        .map(|i| {
            let name = format!("L{}", i);
            let start = Point2d::new(10.0 * i as f64, 0.0);
            add_straight_road(&mut net, &name, start, 0.0, 10.0, &[1])[0]
        })
        .collect();
    for pair in lanes.windows(2) {
        chain(&mut net, pair[0], pair[1]);
    }
    let pc = PreferredConnections::new();
    let lane = net.lane(lanes[0]);

    let near = RoadPosition::new("L50", 1, 5.0);
    assert_approx_eq!(lane.distance_to_target(false, 2.0, &pc, &near, &net).unwrap(), 503.0);
    let far = RoadPosition::new("L115", 1, 5.0);
    assert_eq!(
        lane.distance_to_target(false, 2.0, &pc, &far, &net),
        Err(TraversalError::HopLimit(MAX_HOPS))
    );
    let behind = RoadPosition::new("L119", 1, 1.0);
    assert_eq!(
        net.lane(lanes[119]).distance_to_target(false, 5.0, &pc, &behind, &net),
        Err(TraversalError::DeadEnd)
    );
    assert_eq!(
        lane.distance_to_target(false, 12.0, &pc, &near, &net),
        Err(TraversalError::OutOfLane {
            s: 12.0,
            start: 0.0,
            end: 10.0
        })
    );
}

/// Test that reference points are found past a lane boundary.
#[test]
fn reference_points_cross_boundaries() {
    let mut net = RoadNetwork::new();
    let a = add_straight_road(&mut net, "A", Point2d::new(0.0, 0.0), 0.0, 100.0, &[1])[0];
    let b = add_straight_road(&mut net, "B", Point2d::new(100.0, 0.0), 0.0, 100.0, &[1])[0];
    chain(&mut net, a, b);
    let pc = PreferredConnections::new();

    let point = net.lane(a).reference_point_ahead(false, 90.0, 20.0, &pc, &net).unwrap();
    assert_approx_eq!(point.s, 10.0);
    assert_approx_eq!(point.position.x, 110.0);
    assert_approx_eq!(point.position.y, 0.0);
    assert!(net.lane(b).reference_point_ahead(false, 90.0, 20.0, &pc, &net).is_none());
}

/// Test that traffic is found on the lanes entered after a boundary.
#[test]
fn traffic_ahead_on_linked_lanes() {
    let (net, [a, b, c]) = junction_network();
    let lane = net.lane(a);
    let empty = PreferredConnections::new();
    let left: PreferredConnections = [("J", "1")].into_iter().collect();

    assert!(lane.is_traffic_ahead(90.0, 20.0, true, &empty, b, 5.0, &net));
    assert!(!lane.is_traffic_ahead(90.0, 20.0, true, &empty, b, 15.0, &net));
    assert!(!lane.is_traffic_ahead(90.0, 20.0, true, &empty, c, 5.0, &net));
    assert!(lane.is_traffic_ahead(90.0, 20.0, true, &left, c, 5.0, &net));
    // Looking behind never leaves the lane
    assert!(!lane.is_traffic_ahead(90.0, 20.0, false, &left, c, 5.0, &net));
}
