use crate::math::{Point2d, Vector2d};
use cgmath::InnerSpace;

/// Calculates the new heading of a vehicle whose front axle moved from `pos` to `new_pos`.
///
/// The rear axle trails `radius` m behind the front axle and is dragged along
/// the line towards the new front axle position.
pub fn calc_direction(pos: Point2d, dir: Vector2d, new_pos: Point2d, radius: f64) -> Vector2d {
    let b = pos - radius * dir;
    let v = pos - b;
    let h = (v.magnitude2() - radius.powi(2)) / (2.0 * (radius + v.dot(dir)));
    let bp = b + h * dir;
    (new_pos - bp).normalize()
}

/// Rotates a unit vector clockwise by `angle` radians.
pub fn rotate_cw(dir: Vector2d, angle: f64) -> Vector2d {
    let (sin, cos) = angle.sin_cos();
    Vector2d::new(dir.x * cos + dir.y * sin, dir.y * cos - dir.x * sin)
}

/// Calculates the longitudinal acceleration produced by the pedals, in m/s^2.
pub fn pedal_acceleration(
    vel: f64,
    accelerator: f64,
    brake: f64,
    max_acc: f64,
    max_dec: f64,
    rolling_dec: f64,
) -> f64 {
    let resistance = if vel > 0.0 { rolling_dec } else { 0.0 };
    accelerator * max_acc - brake * max_dec - resistance
}
