use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;

/// Spacing of the coarse samples used to seed a projection, in curve units.
const SEED_SPACING: f64 = 4.0;

/// A parametric curve in 2D space.
pub trait ParametricCurve2d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point2d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt(&self, t: f64) -> Vector2d {
        let bounds = self.bounds();
        let delta = f64::max(bounds.length() * 0.0001, 1e-6);
        let t = f64::min(t, bounds.max - delta);
        let p1 = self.sample(t);
        let p2 = self.sample(t + delta);
        (p2 - p1) / delta
    }
}

impl<T: ParametricCurve2d + ?Sized> ParametricCurve2d for &T {
    fn sample(&self, t: f64) -> Point2d {
        (**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        (**self).sample_dt(t)
    }
}

/// Projects a point onto a parametric curve.
///
/// Returns `None` if Newton's method does not converge, or if the
/// closest point lies beyond either end of the curve.
pub fn project_point_onto_curve(
    curve: &impl ParametricCurve2d,
    point: Point2d,
    max_error: f64,
    t0: Option<f64>,
) -> Option<f64> {
    let bounds = curve.bounds();

    // Get initial guess for `t`
    let mut t = t0.unwrap_or_else(|| {
        let n = usize::max(8, (bounds.length() / SEED_SPACING).ceil() as usize);
        (0..=n)
            .map(|i| bounds.min + bounds.length() * i as f64 / n as f64)
            .map(|t| (t, (point - curve.sample(t)).magnitude2()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(t, _)| t)
            .unwrap_or(bounds.min)
    });
    let (mut p, mut p_dt) = (curve.sample(t), curve.sample_dt(t));

    // Refine `t` with Newton's method
    for _ in 0..64 {
        let mag = p_dt.magnitude();
        if mag < 1e-12 {
            return None;
        }
        let error = p_dt.dot(point - p) / mag;
        t += error;
        if !bounds.contains(t) {
            return None;
        }
        if error.abs() < max_error {
            return Some(t);
        }
        (p, p_dt) = (curve.sample(t), curve.sample_dt(t));
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    struct Circle;

    impl ParametricCurve2d for Circle {
        fn sample(&self, t: f64) -> Point2d {
            Point2d::new(10.0 * (t / 10.0).cos(), 10.0 * (t / 10.0).sin())
        }

        fn bounds(&self) -> Interval<f64> {
            Interval::new(0.0, 20.0)
        }
    }

    #[test]
    fn projects_onto_arc() {
        let t = project_point_onto_curve(&Circle, Point2d::new(0.0, 12.0), 0.001, None);
        assert_approx_eq!(t.unwrap(), 10.0 * std::f64::consts::FRAC_PI_2, 0.01);
    }

    #[test]
    fn rejects_points_beyond_the_end() {
        let t = project_point_onto_curve(&Circle, Point2d::new(-10.0, -1.0), 0.001, None);
        assert_eq!(t, None);
    }
}
