use super::Vector2d;
use std::f64::consts::PI;

/// The unit vector pointing along the given heading, in radians
/// counter-clockwise from the positive x-axis.
pub fn heading_vector(hdg: f64) -> Vector2d {
    Vector2d::new(hdg.cos(), hdg.sin())
}

/// Wraps an angle in radians into the range `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let mut angle = angle % (2.0 * PI);
    if angle > PI {
        angle -= 2.0 * PI;
    } else if angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}
