//! Lane following, lane changes and speed control for a single vehicle.

use self::lane_change::interpolate;
use self::speed::{below_safety_distance, pedal_intensities, road_dependent_max_speed};
use self::steering::{angle_to, steering_intensity};
use crate::lane::{Lane, Position};
use crate::link::PreferredConnections;
use crate::math::{Point2d, Point3d};
use crate::network::RoadNetwork;
use crate::point::{ArcPoint, RoadPosition};
use crate::projection::ProjectionCache;
use crate::traffic::TrafficSnapshot;
use crate::util::Interval;
use crate::vehicle::VehicleActuator;
use crate::LaneId;
use cgmath::MetricSpace;
pub use command::{AutopilotCommand, CommandFactory, CommandRegistry, PositionTrigger};
pub use lane_change::LaneChangeState;
pub use locator::{LaneLocator, LaneMatch, NearestLaneLocator};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

mod command;
mod lane_change;
mod locator;
mod speed;
mod steering;

/// The speeds between which the lookahead distance grows, in km/h.
const LOOKAHEAD_SPEEDS: Interval<f64> = Interval::new(20.0, 100.0);

/// The multiples of the distance from path looked ahead at those speeds.
const LOOKAHEAD_FACTORS: Interval<f64> = Interval::new(1.0, 5.0);

/// The parameters of an autopilot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutopilotAttributes {
    /// The distance to the follow point at low speed, in m.
    pub distance_from_path: f64,
    /// The maximum speed in km/h.
    pub max_speed: f64,
    /// The forward distance within which obstacles stop the vehicle, in m.
    pub min_forward_safety_distance: f64,
    /// The lateral distance within which obstacles stop the vehicle, in m.
    pub min_lateral_safety_distance: f64,
    /// Whether the forward safety distance grows with speed.
    pub speed_dependent_forward_safety_distance: bool,
    /// Obstacles closer than this force a full brake, in m.
    pub emergency_brake_distance: f64,
    /// The lateral speed of a lane change, in m/s.
    pub lateral_speed: f64,
    /// Whether a lane change may start while another is in progress.
    pub allow_overlapping_lane_changes: bool,
    /// The name of a tracked object, such as a human-driven car, whose
    /// speed the vehicle never exceeds.
    pub speed_leader: Option<String>,
}

impl Default for AutopilotAttributes {
    fn default() -> Self {
        Self {
            distance_from_path: 5.0,
            max_speed: 50.0,
            min_forward_safety_distance: 8.0,
            min_lateral_safety_distance: 2.0,
            speed_dependent_forward_safety_distance: true,
            emergency_brake_distance: 5.0,
            lateral_speed: 1.5,
            allow_overlapping_lane_changes: false,
            speed_leader: None,
        }
    }
}

/// The controls an autopilot applied in one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Commands {
    /// From -1 (full left) to 1 (full right).
    pub steering: f64,
    pub accelerator: f64,
    pub brake: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Obstacle {
    Clear,
    Stop,
    Emergency,
}

/// Drives a vehicle along the lane graph.
#[derive(Clone, Debug)]
pub struct Autopilot {
    /// The name of the vehicle, which excludes it from its own traffic checks.
    name: String,
    attributes: AutopilotAttributes,
    /// The junction connections to take.
    pc: PreferredConnections,
    /// The lane the vehicle was located on in the current tick.
    lane: Option<LaneId>,
    /// The arc-length of the vehicle along its lane.
    s: f64,
    is_wrong_way: bool,
    /// The lanes the vehicle is expected to drive on next.
    expected_lanes: Vec<LaneId>,
    lane_change: LaneChangeState,
    /// The last steering intensity, held while no follow point exists.
    steering: f64,
    follow_point: Option<ArcPoint>,
    triggers: Vec<PositionTrigger>,
    projection: ProjectionCache,
}

impl Autopilot {
    /// Creates an autopilot for the vehicle named `name`.
    pub fn new(name: impl Into<String>, attributes: AutopilotAttributes) -> Self {
        Self {
            name: name.into(),
            attributes,
            pc: PreferredConnections::new(),
            lane: None,
            s: 0.0,
            is_wrong_way: false,
            expected_lanes: Vec::new(),
            lane_change: LaneChangeState::Idle,
            steering: 0.0,
            follow_point: None,
            triggers: Vec::new(),
            projection: ProjectionCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &AutopilotAttributes {
        &self.attributes
    }

    /// Sets the maximum speed in km/h.
    pub fn set_max_speed(&mut self, max_speed: f64) {
        self.attributes.max_speed = max_speed;
    }

    pub fn preferred_connections(&self) -> &PreferredConnections {
        &self.pc
    }

    pub fn set_preferred_connections(&mut self, pc: PreferredConnections) {
        self.pc = pc;
    }

    /// The lane the vehicle is on, if it could be located.
    pub fn current_lane(&self) -> Option<LaneId> {
        self.lane
    }

    /// The arc-length of the vehicle along its lane.
    pub fn current_s(&self) -> f64 {
        self.s
    }

    /// Whether the vehicle drives against the direction of its lane.
    pub fn is_wrong_way(&self) -> bool {
        self.is_wrong_way
    }

    pub fn lane_change(&self) -> &LaneChangeState {
        &self.lane_change
    }

    /// The point the vehicle steered towards in the last tick.
    pub fn follow_point(&self) -> Option<&ArcPoint> {
        self.follow_point.as_ref()
    }

    /// The lane borders computed while locating the vehicle.
    pub fn projection(&self) -> &ProjectionCache {
        &self.projection
    }

    pub fn add_trigger(&mut self, trigger: PositionTrigger) {
        self.triggers.push(trigger);
    }

    /// The distance to the follow point at the given speed in km/h.
    pub fn lookahead_distance(&self, speed_kmh: f64) -> f64 {
        let factor = LOOKAHEAD_SPEEDS.map_onto(speed_kmh, &LOOKAHEAD_FACTORS);
        self.attributes.distance_from_path * factor
    }

    /// Changes to the lane numbered `number` in the current lane section.
    pub fn set_target_lane(&mut self, number: i32, net: &RoadNetwork) -> bool {
        let Some(current) = self.lane else {
            return false;
        };
        let Some(target) = net.section(net.lane(current).section()).lane(number) else {
            debug!("{}: no lane {} to change to", self.name, number);
            return false;
        };
        self.request_lane_change(current, target, net)
    }

    /// Changes to the neighbouring lane on the driver's left or right.
    pub fn change_lane(&mut self, position: Position, net: &RoadNetwork) -> bool {
        let Some(current) = self.lane else {
            return false;
        };
        let neighbor = net
            .lane(current)
            .neighbor(position, self.s, self.is_wrong_way, net);
        let Some(target) = neighbor else {
            debug!("{}: no lane to the {:?}", self.name, position);
            return false;
        };
        self.request_lane_change(current, target, net)
    }

    fn request_lane_change(&mut self, current: LaneId, target: LaneId, net: &RoadNetwork) -> bool {
        let allow_overlapping = self.attributes.allow_overlapping_lane_changes;
        let accepted = self.lane_change.request(current, target, allow_overlapping);
        if accepted {
            info!(
                "{}: changing from lane {} to lane {}",
                self.name,
                net.lane(current).number(),
                net.lane(target).number()
            );
        }
        accepted
    }

    /// Plans a route from the current position to `target` and follows it.
    pub fn navigate_to(&mut self, target: &RoadPosition, net: &RoadNetwork) -> bool {
        let Some(current) = self.lane else {
            return false;
        };
        let lane = net.lane(current);
        let start = RoadPosition::new(net.road(lane.road()).name(), lane.number(), self.s);
        match net.shortest_route(&start, target, self.is_wrong_way) {
            Some(pc) => {
                info!("{}: navigating to {} via [{}]", self.name, target, pc);
                self.pc = pc;
                true
            }
            None => false,
        }
    }

    /// Carries out a command, returning whether it was accepted.
    pub fn apply(&mut self, command: &AutopilotCommand, net: &RoadNetwork) -> bool {
        match command {
            AutopilotCommand::SetTargetLane(number) => self.set_target_lane(*number, net),
            AutopilotCommand::ChangeLane(position) => self.change_lane(*position, net),
            AutopilotCommand::SetRoute(pc) => {
                self.pc = pc.clone();
                true
            }
            AutopilotCommand::NavigateTo(target) => self.navigate_to(target, net),
            AutopilotCommand::SetMaxSpeed(speed) => {
                self.set_max_speed(*speed);
                true
            }
        }
    }

    /// Runs one tick of `tpf` seconds, driving `vehicle`.
    pub fn update<V, L>(
        &mut self,
        tpf: f64,
        vehicle: &mut V,
        traffic: &TrafficSnapshot,
        locator: &L,
        net: &RoadNetwork,
    ) -> Commands
    where
        V: VehicleActuator + ?Sized,
        L: LaneLocator + ?Sized,
    {
        let position = vehicle.position();
        let heading = vehicle.heading();
        let speed = vehicle.current_speed_kmh();
        self.locate(position, heading, locator, net);

        let ground = Point2d::new(position.x, position.y);
        self.follow_point = self.next_follow_point(tpf, speed, net);
        let commands = match &self.follow_point {
            Some(point) => {
                self.steering = steering_intensity(ground, heading, point.ground());
                let (accelerator, brake) = self.pedals(position, heading, speed, traffic, net);
                Commands {
                    steering: self.steering,
                    accelerator,
                    brake,
                }
            }
            None => Commands {
                steering: self.steering,
                accelerator: 0.0,
                brake: 1.0,
            },
        };
        vehicle.steer(commands.steering);
        vehicle.set_accelerator_pedal_intensity(commands.accelerator);
        vehicle.set_brake_pedal_intensity(commands.brake);

        self.fire_triggers(net);
        commands
    }

    fn locate<L: LaneLocator + ?Sized>(
        &mut self,
        position: Point3d,
        heading: f64,
        locator: &L,
        net: &RoadNetwork,
    ) {
        let found = locator.locate(
            position,
            heading,
            &self.expected_lanes,
            &mut self.projection,
            net,
        );
        match found {
            Some(found) => {
                self.lane = Some(found.lane);
                self.s = found.s;
                self.is_wrong_way = found.heading_diff.abs() > FRAC_PI_2;
            }
            None => {
                if self.lane.is_some() {
                    debug!("{}: left the lane graph", self.name);
                }
                self.lane = None;
                self.expected_lanes.clear();
            }
        }
    }

    /// Finds the point to steer towards, advancing any lane change.
    fn next_follow_point(&mut self, tpf: f64, speed: f64, net: &RoadNetwork) -> Option<ArcPoint> {
        let current = self.lane?;
        let lane = net.lane(current);
        let distance = self.lookahead_distance(speed);

        if !self.lane_change.is_idle()
            && self.lane_change.extend(lane, self.is_wrong_way, &self.pc, net)
        {
            if let LaneChangeState::InProgress { start, target, .. } = self.lane_change {
                let start_point = self.point_on(start, lane, distance, net);
                let target_point = self.point_on(target, lane, distance, net);
                if let Some((a, b)) = start_point.zip(target_point) {
                    let travel = self.lane_change.advance(
                        tpf,
                        self.attributes.lateral_speed,
                        a.position.distance(b.position),
                    );
                    if self.lane_change.finish(current) {
                        info!("{}: lane change complete", self.name);
                    }
                    self.expected_lanes = vec![current, start, target];
                    return Some(interpolate(&a, &b, travel, current));
                }
                debug!("{}: no follow point for lane change", self.name);
            }
        }

        let (point, traversed) =
            lane.point_ahead_traversed(self.is_wrong_way, self.s, distance, &self.pc, net)?;
        self.expected_lanes = traversed;
        Some(point)
    }

    /// The point `distance` m ahead on `id`, a lane in the same section as `current`.
    fn point_on(
        &self,
        id: LaneId,
        current: &Lane,
        distance: f64,
        net: &RoadNetwork,
    ) -> Option<ArcPoint> {
        let lane = net.lane(id);
        let is_wrong_way = self.is_wrong_way != lane.is_opposite_to(current);
        lane.point_ahead(is_wrong_way, self.s, distance, &self.pc, net)
    }

    /// The pedal intensities (accelerator, brake) for this tick.
    fn pedals(
        &self,
        position: Point3d,
        heading: f64,
        speed: f64,
        traffic: &TrafficSnapshot,
        net: &RoadNetwork,
    ) -> (f64, f64) {
        let obstacle = self.obstacle_in_the_way(position, heading, speed, traffic, net);
        if obstacle == Obstacle::Emergency {
            return (0.0, 1.0);
        }
        let mut target = self.attributes.max_speed;
        if obstacle == Obstacle::Stop {
            target = 0.0;
        }
        if let Some(leader) = &self.attributes.speed_leader {
            if let Some(leader) = traffic.objects.iter().find(|obj| obj.name == *leader) {
                target = target.min(leader.speed_kmh);
            }
        }
        if let Some(lane) = self.lane {
            let road_max =
                road_dependent_max_speed(net.lane(lane), self.is_wrong_way, self.s, &self.pc, net);
            target = target.min(road_max);
        }
        pedal_intensities(speed, target)
    }

    fn obstacle_in_the_way(
        &self,
        position: Point3d,
        heading: f64,
        speed: f64,
        traffic: &TrafficSnapshot,
        net: &RoadNetwork,
    ) -> Obstacle {
        let ground = Point2d::new(position.x, position.y);
        let mut obstacle = Obstacle::Clear;
        for other in traffic.others(&self.name) {
            let distance = position.distance(other.position);
            let angle = angle_to(ground, heading, Point2d::new(other.position.x, other.position.y));
            if below_safety_distance(angle, distance, speed, &self.attributes) {
                if distance < self.attributes.emergency_brake_distance {
                    return Obstacle::Emergency;
                }
                obstacle = Obstacle::Stop;
            }
        }
        if obstacle != Obstacle::Clear {
            return obstacle;
        }

        let Some(lane) = self.lane else {
            return obstacle;
        };
        let lane = net.lane(lane);
        for light in &traffic.red_lights {
            let distance = lane.distance_to_target(self.is_wrong_way, self.s, &self.pc, light, net);
            if let Ok(distance) = distance {
                if below_safety_distance(0.0, distance, speed, &self.attributes) {
                    return Obstacle::Stop;
                }
            }
        }
        obstacle
    }

    fn fire_triggers(&mut self, net: &RoadNetwork) {
        let Some(lane) = self.lane else {
            return;
        };
        let lane = net.lane(lane);
        let road = net.road(lane.road()).name();
        let s = self.s;
        let fired: Vec<_> = self
            .triggers
            .iter_mut()
            .filter_map(|trigger| trigger.update(road, lane.number(), s).cloned())
            .collect();
        for command in fired {
            let accepted = self.apply(&command, net);
            info!(
                "{}: trigger issued {:?} (accepted: {})",
                self.name, command, accepted
            );
        }
    }
}
