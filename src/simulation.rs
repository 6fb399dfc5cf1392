use crate::autopilot::{Autopilot, AutopilotAttributes, AutopilotCommand, Commands, NearestLaneLocator};
use crate::error::TraversalError;
use crate::network::RoadNetwork;
use crate::point::RoadPosition;
use crate::traffic::{TrafficObject, TrafficSnapshot};
use crate::vehicle::{KinematicVehicle, VehicleActuator, VehicleAttributes};
use crate::VehicleId;
use slotmap::SlotMap;
use std::f64::consts::PI;

/// A vehicle driven by an autopilot.
#[derive(Clone, Debug)]
struct SimVehicle {
    autopilot: Autopilot,
    body: KinematicVehicle,
    /// The controls applied in the last frame.
    commands: Commands,
}

/// Drives autopilot vehicles through a road network.
#[derive(Default)]
pub struct Simulation {
    /// The road network.
    network: RoadNetwork,
    /// Locates vehicles on the lane graph.
    locator: NearestLaneLocator,
    /// The vehicles being simulated.
    vehicles: SlotMap<VehicleId, SimVehicle>,
    /// The set of "frozen" vehicles, which will brake fully.
    frozen_vehs: Vec<VehicleId>,
    /// Road users which are not simulated, such as human-driven vehicles.
    external: Vec<TrafficObject>,
    /// The stop positions of traffic lights currently showing red.
    red_lights: Vec<RoadPosition>,
    /// The current frame of simulation.
    frame: usize,
}

impl Simulation {
    /// Creates a new simulation of the given road network.
    pub fn new(network: RoadNetwork) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    /// Gets a reference to the road network.
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Adds a stationary vehicle at `start`, facing the direction of travel of its lane.
    pub fn add_vehicle(
        &mut self,
        name: &str,
        attributes: &VehicleAttributes,
        autopilot: AutopilotAttributes,
        start: &RoadPosition,
    ) -> Result<VehicleId, TraversalError> {
        let unknown = || TraversalError::UnknownTarget(start.to_string());
        let net = &self.network;
        let lane = net
            .lane_at(&start.road, start.lane, start.s)
            .map(|id| net.lane(id))
            .ok_or_else(unknown)?;
        let point = lane.center_point(start.s, net).ok_or_else(unknown)?;
        let heading = match lane.increasing_s(false) {
            true => point.heading(),
            false => point.heading() + PI,
        };

        let vehicle = SimVehicle {
            autopilot: Autopilot::new(name, autopilot),
            body: KinematicVehicle::new(*attributes, point.position, heading),
            commands: Commands::default(),
        };
        Ok(self.vehicles.insert(vehicle))
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) {
        self.vehicles.remove(id);
        self.frozen_vehs.retain(|veh| *veh != id);
    }

    /// Sets the `frozen` attribute of a vehicle. When a vehicle is frozen,
    /// it will brake fully until it is no longer frozen.
    pub fn set_vehicle_frozen(&mut self, vehicle_id: VehicleId, frozen: bool) {
        let idx = self.frozen_vehs.iter().position(|id| *id == vehicle_id);
        match (frozen, idx) {
            (true, None) => {
                self.frozen_vehs.push(vehicle_id);
            }
            (false, Some(idx)) => {
                self.frozen_vehs.remove(idx);
            }
            _ => {}
        }
    }

    /// Gets the `frozen` attribute of a vehicle. [Read more](Self::set_vehicle_frozen).
    pub fn get_vehicle_frozen(&self, vehicle_id: VehicleId) -> bool {
        self.frozen_vehs.iter().any(|id| *id == vehicle_id)
    }

    /// Sets the traffic lights currently showing red.
    pub fn set_red_lights(&mut self, lights: Vec<RoadPosition>) {
        self.red_lights = lights;
    }

    /// Sets the road users which are not driven by the simulation.
    pub fn set_external_traffic(&mut self, traffic: Vec<TrafficObject>) {
        self.external = traffic;
    }

    /// Sends a command to the autopilot of a vehicle.
    pub fn apply_command(&mut self, vehicle_id: VehicleId, command: &AutopilotCommand) -> bool {
        self.vehicles[vehicle_id]
            .autopilot
            .apply(command, &self.network)
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Every vehicle observes the traffic as it was at the start of the frame.
    pub fn step(&mut self, dt: f64) {
        let snapshot = self.snapshot();
        for (id, vehicle) in &mut self.vehicles {
            let mut commands = vehicle.autopilot.update(
                dt,
                &mut vehicle.body,
                &snapshot,
                &self.locator,
                &self.network,
            );
            if self.frozen_vehs.contains(&id) {
                commands.accelerator = 0.0;
                commands.brake = 1.0;
                vehicle.body.set_accelerator_pedal_intensity(0.0);
                vehicle.body.set_brake_pedal_intensity(1.0);
            }
            vehicle.commands = commands;
            vehicle.body.integrate(dt);
        }
        self.frame += 1;
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Takes a snapshot of every road user.
    pub fn snapshot(&self) -> TrafficSnapshot {
        let simulated = self.vehicles.values().map(|vehicle| TrafficObject {
            name: vehicle.autopilot.name().to_owned(),
            lane: vehicle.autopilot.current_lane(),
            s: vehicle.autopilot.current_s(),
            position: vehicle.body.position(),
            speed_kmh: vehicle.body.current_speed_kmh(),
        });
        TrafficSnapshot {
            objects: simulated.chain(self.external.iter().cloned()).collect(),
            red_lights: self.red_lights.clone(),
        }
    }

    /// Returns an iterator over the IDs of all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.vehicles.keys()
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> &KinematicVehicle {
        &self.vehicles[vehicle_id].body
    }

    /// Gets a mutable reference to the vehicle with the given ID.
    pub fn get_vehicle_mut(&mut self, vehicle_id: VehicleId) -> &mut KinematicVehicle {
        &mut self.vehicles[vehicle_id].body
    }

    /// Gets a reference to the autopilot of the vehicle with the given ID.
    pub fn get_autopilot(&self, vehicle_id: VehicleId) -> &Autopilot {
        &self.vehicles[vehicle_id].autopilot
    }

    /// Gets a mutable reference to the autopilot of the vehicle with the given ID.
    pub fn get_autopilot_mut(&mut self, vehicle_id: VehicleId) -> &mut Autopilot {
        &mut self.vehicles[vehicle_id].autopilot
    }

    /// Gets the controls applied to the vehicle in the last frame.
    pub fn get_commands(&self, vehicle_id: VehicleId) -> Commands {
        self.vehicles[vehicle_id].commands
    }
}
