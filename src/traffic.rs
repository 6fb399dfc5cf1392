use crate::math::Point3d;
use crate::point::RoadPosition;
use crate::LaneId;

/// A tracked road user as seen by other vehicles.
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficObject {
    /// The object's name, unique within a simulation.
    pub name: String,
    /// The lane the object is on, if it has been located.
    pub lane: Option<LaneId>,
    /// The arc-length along `lane`.
    pub s: f64,
    /// The object's position in world space.
    pub position: Point3d,
    /// The object's speed in km/h.
    pub speed_kmh: f64,
}

/// The state of all traffic at the start of a tick.
///
/// Vehicles are updated against a snapshot so that they may move
/// without affecting what the remaining vehicles observe in the same tick.
#[derive(Clone, Debug, Default)]
pub struct TrafficSnapshot {
    /// Every tracked road user, including human-driven vehicles.
    pub objects: Vec<TrafficObject>,
    /// The stop positions of traffic lights currently showing red.
    pub red_lights: Vec<RoadPosition>,
}

impl TrafficSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Default::default()
    }

    /// Iterates over every object except the one named `name`.
    pub fn others<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TrafficObject> + 'a {
        self.objects.iter().filter(move |obj| obj.name != name)
    }
}
