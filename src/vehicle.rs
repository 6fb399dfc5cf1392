use self::dynamics::{calc_direction, pedal_acceleration, rotate_cw};
use crate::math::{Point2d, Point3d, Vector2d};
use serde::{Deserialize, Serialize};

mod dynamics;

/// Converts a speed in m/s to km/h.
const MS_TO_KMH: f64 = 3.6;

/// The controls of a vehicle which an autopilot drives.
pub trait VehicleActuator {
    /// Sets the steering, from -1 (full left) to 1 (full right).
    fn steer(&mut self, intensity: f64);

    /// Sets the accelerator pedal, from 0 (released) to 1 (fully pressed).
    fn set_accelerator_pedal_intensity(&mut self, intensity: f64);

    /// Sets the brake pedal, from 0 (released) to 1 (fully pressed).
    fn set_brake_pedal_intensity(&mut self, intensity: f64);

    /// The current speed in km/h.
    fn current_speed_kmh(&self) -> f64;

    /// The position of the vehicle in world space.
    fn position(&self) -> Point3d;

    /// The heading of the vehicle, in radians counter-clockwise from the x-axis.
    fn heading(&self) -> f64;
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleAttributes {
    /// The vehicle width in m.
    pub width: f64,
    /// The vehicle length in m.
    pub length: f64,
    /// Distance from the front axle to the rear axle, in m.
    pub wheel_base: f64,
    /// The acceleration at full throttle, in m/s^2.
    pub max_acc: f64,
    /// The deceleration at full brake, a positive number in m/s^2.
    pub max_dec: f64,
    /// The deceleration while coasting, in m/s^2.
    pub rolling_dec: f64,
    /// The wheel angle at full steering lock, in radians.
    pub max_steer_angle: f64,
}

impl Default for VehicleAttributes {
    fn default() -> Self {
        Self {
            width: 1.8,
            length: 4.5,
            wheel_base: 2.7,
            max_acc: 3.0,
            max_dec: 8.0,
            rolling_dec: 0.2,
            max_steer_angle: 0.6,
        }
    }
}

/// A vehicle with simple bicycle kinematics.
///
/// The front axle moves along the steered wheel direction and the rear axle
/// is dragged behind it, so the vehicle turns without slipping.
#[derive(Clone, Debug)]
pub struct KinematicVehicle {
    attributes: VehicleAttributes,
    /// The world space coordinates of the front axle.
    pos: Point2d,
    /// The elevation of the vehicle.
    z: f64,
    /// A world space vector tangent to the vehicle's heading.
    dir: Vector2d,
    /// The velocity in m/s.
    vel: f64,
    steering: f64,
    accelerator: f64,
    brake: f64,
}

impl KinematicVehicle {
    /// Creates a stationary vehicle.
    pub fn new(attributes: VehicleAttributes, position: Point3d, heading: f64) -> Self {
        Self {
            attributes,
            pos: Point2d::new(position.x, position.y),
            z: position.z,
            dir: Vector2d::new(heading.cos(), heading.sin()),
            vel: 0.0,
            steering: 0.0,
            accelerator: 0.0,
            brake: 0.0,
        }
    }

    /// The vehicle's attributes.
    pub fn attributes(&self) -> &VehicleAttributes {
        &self.attributes
    }

    /// The velocity in m/s.
    pub fn velocity(&self) -> f64 {
        self.vel
    }

    /// Sets the velocity, in m/s.
    pub fn set_velocity(&mut self, vel: f64) {
        self.vel = vel.max(0.0);
    }

    /// Sets the elevation of the vehicle.
    pub fn set_elevation(&mut self, z: f64) {
        self.z = z;
    }

    /// The current steering, from -1 to 1.
    pub fn steering(&self) -> f64 {
        self.steering
    }

    /// The current accelerator pedal intensity.
    pub fn accelerator(&self) -> f64 {
        self.accelerator
    }

    /// The current brake pedal intensity.
    pub fn brake(&self) -> f64 {
        self.brake
    }

    /// Advances the vehicle by `dt` seconds using the current controls.
    pub fn integrate(&mut self, dt: f64) {
        let attr = &self.attributes;
        let acc = pedal_acceleration(
            self.vel,
            self.accelerator,
            self.brake,
            attr.max_acc,
            attr.max_dec,
            attr.rolling_dec,
        );
        let vel = f64::max(self.vel + dt * acc, 0.0);
        let dist = 0.5 * (self.vel + vel) * dt;
        self.vel = vel;
        if dist <= 0.0 {
            return;
        }

        let wheel_dir = rotate_cw(self.dir, self.steering * attr.max_steer_angle);
        let new_pos = self.pos + dist * wheel_dir;
        self.dir = calc_direction(self.pos, self.dir, new_pos, attr.wheel_base);
        self.pos = new_pos;
    }
}

impl VehicleActuator for KinematicVehicle {
    fn steer(&mut self, intensity: f64) {
        self.steering = intensity.clamp(-1.0, 1.0);
    }

    fn set_accelerator_pedal_intensity(&mut self, intensity: f64) {
        self.accelerator = intensity.clamp(0.0, 1.0);
    }

    fn set_brake_pedal_intensity(&mut self, intensity: f64) {
        self.brake = intensity.clamp(0.0, 1.0);
    }

    fn current_speed_kmh(&self) -> f64 {
        self.vel * MS_TO_KMH
    }

    fn position(&self) -> Point3d {
        Point3d::new(self.pos.x, self.pos.y, self.z)
    }

    fn heading(&self) -> f64 {
        self.dir.y.atan2(self.dir.x)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn vehicle() -> KinematicVehicle {
        KinematicVehicle::new(VehicleAttributes::default(), Point3d::new(0.0, 0.0, 0.0), 0.0)
    }

    #[test]
    fn accelerates_in_a_straight_line() {
        let mut veh = vehicle();
        veh.set_accelerator_pedal_intensity(1.0);
        for _ in 0..10 {
            veh.integrate(0.1);
        }
        let pos = veh.position();
        assert!(pos.x > 0.0);
        assert_approx_eq!(pos.y, 0.0);
        assert_approx_eq!(veh.heading(), 0.0);
        // 0.3 m/s in the first tick, then 0.28 m/s per tick with rolling resistance
        assert_approx_eq!(veh.velocity(), 2.82, 1e-9);
    }

    #[test]
    fn braking_never_reverses() {
        let mut veh = vehicle();
        veh.set_velocity(1.0);
        veh.set_brake_pedal_intensity(1.0);
        for _ in 0..20 {
            veh.integrate(0.1);
        }
        assert_approx_eq!(veh.velocity(), 0.0);
        assert!(veh.position().x >= 0.0);
    }

    #[test]
    fn steering_right_turns_clockwise() {
        let mut veh = vehicle();
        veh.set_velocity(5.0);
        veh.steer(1.0);
        for _ in 0..10 {
            veh.integrate(0.1);
        }
        assert!(veh.heading() < 0.0);
        assert!(veh.position().y < 0.0);
    }

    #[test]
    fn pedal_inputs_are_clamped() {
        let mut veh = vehicle();
        veh.steer(-3.0);
        veh.set_accelerator_pedal_intensity(2.0);
        veh.set_brake_pedal_intensity(-1.0);
        assert_eq!(veh.steering(), -1.0);
        assert_eq!(veh.accelerator(), 1.0);
        assert_eq!(veh.brake(), 0.0);
    }
}
