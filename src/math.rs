//! Mathematical structs and functions.

use cgmath::{Point2, Point3, Vector2, Vector3};
pub use cubic::{CubicFn, CubicRecord, PiecewiseCubic};
pub use curve::{project_point_onto_curve, ParametricCurve2d};
pub use util::*;

mod cubic;
mod curve;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// A 3D point. The ground plane is x/y, and z is the elevation.
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;
