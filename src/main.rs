use std::error::Error;
use std::time::Instant;

use lane_pilot::description::NetworkDescription;
use lane_pilot::{
    AutopilotAttributes, AutopilotCommand, Position, RoadNetwork, RoadPosition, Simulation,
    VehicleActuator, VehicleAttributes,
};

/// The network simulated when no description file is given.
const DEMO_NETWORK: &str = include_str!("../demos/highway.json");

fn main() -> Result<(), Box<dyn Error>> {
    let content = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEMO_NETWORK.to_owned(),
    };
    let desc: NetworkDescription = serde_json::from_str(&content)?;
    let net = RoadNetwork::from_description(&desc)?;
    let start = net
        .roads()
        .next()
        .map(|road| RoadPosition::new(road.name(), 1, 5.0))
        .ok_or("the network has no roads")?;

    let mut sim = Simulation::new(net);
    let autopilot = AutopilotAttributes {
        max_speed: 80.0,
        ..Default::default()
    };
    let veh = sim.add_vehicle("ego", &VehicleAttributes::default(), autopilot, &start)?;

    println!("Simulating...");
    const NUM_FRAMES: u32 = 600;
    let timer = Instant::now();
    for frame in 0..NUM_FRAMES {
        if frame == 100 {
            sim.apply_command(veh, &AutopilotCommand::ChangeLane(Position::Left));
        }
        sim.step(0.05);
        if frame % 50 == 0 {
            let vehicle = sim.get_vehicle(veh);
            let autopilot = sim.get_autopilot(veh);
            let lane = autopilot.current_lane().map(|id| sim.network().lane(id));
            let pos = vehicle.position();
            println!(
                "{:>4}: ({:7.2}, {:7.2}) {:5.1} km/h, lane {:?} at s={:.1}",
                frame,
                pos.x,
                pos.y,
                vehicle.current_speed_kmh(),
                lane.map(|lane| lane.number()),
                autopilot.current_s(),
            );
        }
    }
    println!("Avg. frame: {:?}", timer.elapsed() / NUM_FRAMES);
    Ok(())
}
