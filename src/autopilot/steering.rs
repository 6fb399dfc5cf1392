use crate::math::{heading_vector, Point2d};
use cgmath::prelude::*;
use std::f64::consts::FRAC_PI_8;

/// The angle to the follow point which results in full steering lock.
pub const FULL_LOCK_ANGLE: f64 = FRAC_PI_8;

/// The unsigned angle between the vehicle's heading and the direction
/// towards `target`, in radians.
pub fn angle_to(position: Point2d, heading: f64, target: Point2d) -> f64 {
    let to_target = target - position;
    if to_target.magnitude2() == 0.0 {
        return 0.0;
    }
    heading_vector(heading).angle(to_target).0.abs()
}

/// Calculates the steering intensity which turns the vehicle towards `target`,
/// from -1 (full left) to 1 (full right).
pub fn steering_intensity(position: Point2d, heading: f64, target: Point2d) -> f64 {
    let intensity = (angle_to(position, heading, target) / FULL_LOCK_ANGLE).clamp(0.0, 1.0);
    let side = heading_vector(heading).perp_dot(target - position);
    if side > 0.0 {
        -intensity
    } else if side < 0.0 {
        intensity
    } else {
        0.0
    }
}
