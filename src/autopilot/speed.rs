use super::AutopilotAttributes;
use crate::lane::Lane;
use crate::link::PreferredConnections;
use crate::network::RoadNetwork;

/// The speed considered unconstrained by the road, in km/h.
pub const UNLIMITED_SPEED: f64 = 200.0;

/// The distance ahead scanned for curves and speed signs, in m.
const SCAN_DISTANCE: u32 = 200;

/// The speed a vehicle may gain per metre while approaching a slower point,
/// in km/h.
const APPROACH_GAIN: f64 = 0.8;

/// Curvatures above this value are treated as this value, in 1/m.
const MAX_CURVATURE: f64 = 0.2;

/// Scales the square root in the curve speed formula.
const CURVE_SPEED_FACTOR: f64 = 100.0;

/// Subtracted from the curve speed, in km/h.
const CURVE_SPEED_MARGIN: f64 = 10.0;

/// The fraction of the speed in km/h used as forward safety distance, in m.
const SPEED_SAFETY_FACTOR: f64 = 0.5;

/// The maximum speed through a curve of the given curvature, in km/h.
pub fn curve_speed_limit(curvature: f64) -> f64 {
    let curvature = f64::min(curvature.abs(), MAX_CURVATURE);
    f64::min(
        UNLIMITED_SPEED,
        (CURVE_SPEED_FACTOR / curvature).sqrt() - CURVE_SPEED_MARGIN,
    )
}

/// The highest speed which lets the vehicle slow down in time for every
/// curve and speed sign ahead, in km/h.
///
/// Points are scanned from the far end towards the vehicle. Every metre
/// closer to the vehicle raises the allowed speed by a fixed amount.
pub fn road_dependent_max_speed(
    lane: &Lane,
    is_wrong_way: bool,
    s: f64,
    pc: &PreferredConnections,
    net: &RoadNetwork,
) -> f64 {
    let mut max_speed = UNLIMITED_SPEED;
    for distance in (1..=SCAN_DISTANCE).rev() {
        let Some(point) = lane.point_ahead(is_wrong_way, s, distance as f64, pc, net) else {
            continue;
        };
        max_speed += APPROACH_GAIN;
        let curve_limit = point.curvature.map_or(UNLIMITED_SPEED, curve_speed_limit);
        let sign_limit = point
            .lane
            .and_then(|id| net.lane(id).speed_limit_kmh(point.s, net))
            .unwrap_or(UNLIMITED_SPEED);
        max_speed = max_speed.min(curve_limit).min(sign_limit);
    }
    max_speed
}

/// The pedal intensities (accelerator, brake) which move the current speed
/// towards the target speed, both in km/h.
pub fn pedal_intensities(current: f64, target: f64) -> (f64, f64) {
    if current < target {
        (1.0, 0.0)
    } else if current > target + 1.0 {
        (0.0, ((current - target - 1.0) / 2.0).clamp(0.0, 1.0))
    } else {
        (0.0, 0.0)
    }
}

/// Whether an obstacle `distance` m away at `angle` radians from the
/// vehicle's heading lies within the safety envelope.
pub fn below_safety_distance(
    angle: f64,
    distance: f64,
    speed_kmh: f64,
    attribs: &AutopilotAttributes,
) -> bool {
    let lateral = distance * angle.sin();
    let forward = distance * angle.cos();
    let mut forward_limit = attribs.min_forward_safety_distance;
    if attribs.speed_dependent_forward_safety_distance {
        forward_limit = forward_limit.max(SPEED_SAFETY_FACTOR * speed_kmh);
    }
    lateral.abs() < attribs.min_lateral_safety_distance && 0.0 < forward && forward < forward_limit
}
