//! Parametric curve contract and implementations.

mod axis;
mod spline;

use curvefit_core::Result;
use curvefit_math::Point3;

pub use axis::Axis;
pub use spline::ParametricSpline;

/// A curve in 3D space driven by a single parameter `u`.
///
/// Evaluation takes `&mut self` because implementors may rebuild cached
/// state lazily on first use after a change.
pub trait ParametricFunction {
    /// Evaluate the curve at parameter `u`.
    fn evaluate(&mut self, u: f64) -> Result<Point3>;

    /// Scalar attached to the point at `u`.
    fn evaluate_scalar(&mut self, u: f64) -> Result<f64>;

    /// Number of independent parameters.
    fn dimension(&self) -> usize {
        1
    }

    /// Return the parameter domain `(u_min, u_max)`.
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    /// Whether both ends of the domain map to the same point.
    fn joins_ends(&self) -> bool {
        false
    }
}
