pub use autopilot::{
    Autopilot, AutopilotAttributes, AutopilotCommand, CommandFactory, CommandRegistry, Commands,
    LaneChangeState, LaneLocator, LaneMatch, NearestLaneLocator, PositionTrigger,
};
pub use cgmath;
pub use error::{BuildError, CommandError, TraversalError};
pub use geometry::{Geometry, GeometryKind};
pub use lane::{
    AdasLaneInformation, AdasLaneType, AdasLineType, Lane, LaneAttributes, LaneChangeRule,
    LaneSide, LaneType, LaneWidth, Position, RoadMark, RoadMarkType, MAX_HOPS,
};
pub use link::{ContactPoint, Link, LinkData, PreferredConnections};
pub use network::{description, RoadNetwork};
pub use point::{ArcPoint, Intersection, RoadPosition, SpeedLimit};
pub use projection::{LaneBorders, ProjectionCache};
pub use road::{Road, RoadAttributes, SpeedRecord, SpeedUnit};
pub use section::LaneSection;
pub use simulation::Simulation;
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use traffic::{TrafficObject, TrafficSnapshot};
pub use util::Interval;
pub use vehicle::{KinematicVehicle, VehicleActuator, VehicleAttributes};

mod autopilot;
mod error;
mod geometry;
mod lane;
mod link;
pub mod math;
mod network;
mod point;
mod projection;
mod road;
mod section;
mod simulation;
mod traffic;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Road].
    pub struct RoadId;
    /// Unique ID of a [LaneSection].
    pub struct SectionId;
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a vehicle in a [Simulation].
    pub struct VehicleId;
}
